use std::fs;
use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use crate::{ErrorKind, ShelfError, ShelfResult};

use super::FilePath;
use super::http::{
    HttpMethod, HttpRequest, HttpResponse, HttpServerConfig, HttpServerHandle, HttpService,
    HttpStatusCode, INTERNAL_ERROR_BODY,
};
use super::traits::{Pal, ReadSeek};

/// How long a worker blocks on the listener before re-checking the shutdown flag.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/* 📖 # Why tiny_http with a handful of worker threads?

Every handler is a short synchronous call into the store, so a blocking server with a
small fixed pool of threads sharing one listener is all the concurrency the service
needs. No async runtime, no per-request thread spawning.
*/

/// Concrete PAL implementation using the real filesystem and tiny_http.
///
/// All file paths are resolved relative to a configured base directory.
#[derive(Debug)]
pub struct RealPal {
    base_dir: PathBuf,
}

impl RealPal {
    /// Create a new RealPal with the given base directory.
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Resolve a FilePath to an absolute filesystem path.
    fn resolve_path(&self, path: &FilePath) -> PathBuf {
        self.base_dir.join(path.as_path())
    }

    fn file_error(path: PathBuf, source: std::io::Error) -> Box<ShelfError> {
        Box::new(ShelfError::new(ErrorKind::FileError { path, source }))
    }
}

impl Pal for RealPal {
    #[instrument(skip(self), fields(path = %path))]
    fn file_exists(&self, path: &FilePath) -> ShelfResult<bool> {
        let resolved = self.resolve_path(path);
        let exists = resolved.is_file();
        debug!(exists, resolved = %resolved.display(), "checked file existence");
        Ok(exists)
    }

    #[instrument(skip(self), fields(path = %path))]
    fn read_file(&self, path: &FilePath) -> ShelfResult<Box<dyn ReadSeek + 'static>> {
        let resolved = self.resolve_path(path);
        debug!(resolved = %resolved.display(), "opening file for reading");
        let file = fs::File::open(&resolved).map_err(|e| {
            debug!(error = %e, "failed to open file");
            Self::file_error(resolved, e)
        })?;
        Ok(Box::new(file))
    }

    #[instrument(skip(self), fields(path = %path))]
    fn create_file(&self, path: &FilePath) -> ShelfResult<Box<dyn Write>> {
        let resolved = self.resolve_path(path);
        debug!(resolved = %resolved.display(), "creating file");
        let file = fs::File::create(&resolved).map_err(|e| {
            debug!(error = %e, "failed to create file");
            Self::file_error(resolved, e)
        })?;
        Ok(Box::new(file))
    }

    #[instrument(skip(self), fields(from = %from, to = %to))]
    fn rename_file(&self, from: &FilePath, to: &FilePath) -> ShelfResult<()> {
        let source = self.resolve_path(from);
        let target = self.resolve_path(to);
        fs::rename(&source, &target).map_err(|e| {
            debug!(error = %e, "failed to rename file");
            Self::file_error(target, e)
        })?;
        debug!("file renamed");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path))]
    fn create_directory_all(&self, path: &FilePath) -> ShelfResult<()> {
        let resolved = self.resolve_path(path);
        debug!(resolved = %resolved.display(), "creating directory and parents");
        fs::create_dir_all(&resolved).map_err(|e| {
            debug!(error = %e, "failed to create directory");
            Self::file_error(resolved, e)
        })
    }

    #[instrument(skip(self, service), fields(address = %config.address()))]
    fn start_http_server(
        &self,
        service: Box<dyn HttpService>,
        config: HttpServerConfig,
    ) -> ShelfResult<HttpServerHandle> {
        let address = config.address();
        let server = tiny_http::Server::http(address.as_str())
            .map_err(|e| crate::err!("Failed to bind HTTP server to {}: {}", address, e))?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| crate::err!("HTTP server on {} is not bound to an IP address", address))?;

        let server = Arc::new(server);
        let service: Arc<dyn HttpService> = Arc::from(service);
        let shutdown = Arc::new(AtomicBool::new(false));
        let worker_count = config.workers.max(1);

        let mut workers = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let server = Arc::clone(&server);
            let service = Arc::clone(&service);
            let shutdown_flag = Arc::clone(&shutdown);
            let server_name = config.server_name.clone();
            let worker = std::thread::Builder::new()
                .name(format!("http-worker-{}", worker_id))
                .spawn(move || serve_requests(&server, &*service, &shutdown_flag, &server_name))
                .map_err(|e| {
                    shutdown.store(true, Ordering::SeqCst);
                    crate::err!("Failed to spawn HTTP worker {}: {}", worker_id, e)
                })?;
            workers.push(worker);
        }

        info!(port, workers = worker_count, "HTTP server listening");
        Ok(HttpServerHandle::with_workers(port, shutdown, workers))
    }
}

fn serve_requests(
    server: &tiny_http::Server,
    service: &dyn HttpService,
    shutdown: &AtomicBool,
    server_name: &str,
) {
    while !shutdown.load(Ordering::SeqCst) {
        match server.recv_timeout(POLL_INTERVAL) {
            Ok(Some(request)) => dispatch(service, request, server_name),
            Ok(None) => {}
            Err(e) => {
                error!(error = %e, "failed to receive HTTP request, stopping worker");
                break;
            }
        }
    }
    debug!("HTTP worker stopped");
}

fn dispatch(service: &dyn HttpService, mut request: tiny_http::Request, server_name: &str) {
    let method_name = request.method().to_string();
    let url = request.url().to_string();

    let response = match HttpMethod::parse(&method_name) {
        None => HttpResponse::json(
            HttpStatusCode::MethodNotAllowed,
            r#"{"message":"Method not allowed"}"#,
        ),
        Some(method) => {
            let mut body = Vec::new();
            match request.as_reader().read_to_end(&mut body) {
                Err(e) => {
                    warn!(method = %method, url = %url, error = %e, "failed to read request body");
                    HttpResponse::json(
                        HttpStatusCode::BadRequest,
                        r#"{"message":"Unreadable request body"}"#,
                    )
                }
                Ok(_) => {
                    let mut converted = HttpRequest::new(method, url.clone()).with_body(body);
                    for header in request.headers() {
                        converted =
                            converted.with_header(header.field.to_string(), header.value.to_string());
                    }
                    match service.handle_request(converted) {
                        Ok(response) => response,
                        Err(e) => {
                            error!(method = %method, url = %url, error = ?e, "request handler failed");
                            HttpResponse::json(
                                HttpStatusCode::InternalServerError,
                                INTERNAL_ERROR_BODY,
                            )
                        }
                    }
                }
            }
        }
    };

    debug!(method = %method_name, url = %url, status = response.status().as_u16(), "responding");
    if let Err(e) = request.respond(to_tiny_response(response, server_name)) {
        warn!(url = %url, error = %e, "failed to write HTTP response");
    }
}

fn to_tiny_response(
    response: HttpResponse,
    server_name: &str,
) -> tiny_http::Response<Cursor<Vec<u8>>> {
    let status = response.status().as_u16();
    let mut headers = Vec::new();
    for (name, value) in response.headers().iter() {
        match tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(header) => headers.push(header),
            Err(()) => warn!(header = name, "dropping invalid response header"),
        }
    }
    if let Ok(header) = tiny_http::Header::from_bytes(&b"Server"[..], server_name.as_bytes()) {
        headers.push(header);
    }

    let body = response.into_body().into_bytes();
    let length = body.len();
    tiny_http::Response::new(
        tiny_http::StatusCode(status),
        headers,
        Cursor::new(body),
        Some(length),
        None,
    )
}
