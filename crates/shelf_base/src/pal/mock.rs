use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use parking_lot::Mutex;

use crate::ShelfError;
use crate::ShelfResult;
use crate::error::ErrorKind;

use super::FilePath;
use super::http::{HttpRequest, HttpResponse, HttpServerConfig, HttpServerHandle, HttpService};
use super::traits::{Pal, ReadSeek};

/* 📖 # Why use HashMap for MockPal storage?

MockPal keeps files in memory behind Arc<Mutex<..>>:
1. **Speed**: No filesystem I/O, deterministic and fast for unit tests
2. **Isolation**: No side effects on the real filesystem
3. **Control**: Write failures can be switched on to exercise the 500 path of the API

Clones share the same storage, so a test can hand one clone to a store and inspect
the collection file through another.
*/

/// In-memory PAL implementation for testing.
///
/// # Examples
///
/// ```
/// use shelf_base::{pal::MockPal, Pal, FilePath};
///
/// let mock = MockPal::new();
/// mock.add_file(FilePath::from("public/index.html"), b"<h1>Items</h1>".to_vec());
/// let content = mock.read_file_to_string(&FilePath::from("public/index.html")).unwrap();
/// assert_eq!(content, "<h1>Items</h1>");
/// ```
#[derive(Debug, Clone)]
pub struct MockPal {
    files: Arc<Mutex<HashMap<FilePath, Vec<u8>>>>,
    directories: Arc<Mutex<HashSet<FilePath>>>,
    http_servers: Arc<Mutex<HashMap<u16, HttpServerInfo>>>,
    next_port: Arc<AtomicU16>,
    fail_writes: Arc<AtomicBool>,
}

/// Information about a registered HTTP server.
#[derive(Debug)]
struct HttpServerInfo {
    service: Box<dyn HttpService>,
    _config: HttpServerConfig,
}

impl MockPal {
    /// Create a new empty MockPal.
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            directories: Arc::new(Mutex::new(HashSet::new())),
            http_servers: Arc::new(Mutex::new(HashMap::new())),
            next_port: Arc::new(AtomicU16::new(10000)),
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Add a file to the mock storage.
    pub fn add_file(&self, path: FilePath, content: Vec<u8>) {
        self.files.lock().insert(path, content);
    }

    /// Current content of a file, if present.
    pub fn file_content(&self, path: &FilePath) -> Option<Vec<u8>> {
        self.files.lock().get(path).cloned()
    }

    /// Whether a directory has been created.
    pub fn has_directory(&self, path: &FilePath) -> bool {
        self.directories.lock().contains(path)
    }

    /// Make every subsequent create_file and rename_file call fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self, path: &FilePath) -> ShelfResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Box::new(ShelfError::new(ErrorKind::FileError {
                path: path.as_path().to_path_buf(),
                source: std::io::Error::other("simulated write failure"),
            })));
        }
        Ok(())
    }

    /// Simulate an HTTP request to a running server.
    ///
    /// Looks up the service registered for the given port and invokes it directly.
    pub fn simulate_request(&self, port: u16, request: HttpRequest) -> ShelfResult<HttpResponse> {
        let servers = self.http_servers.lock();
        let server_info = servers
            .get(&port)
            .ok_or_else(|| crate::err!("No HTTP server registered on port {}", port))?;

        server_info.service.handle_request(request)
    }

    /// Get the number of registered HTTP servers.
    pub fn http_server_count(&self) -> usize {
        self.http_servers.lock().len()
    }
}

impl Default for MockPal {
    fn default() -> Self {
        Self::new()
    }
}

impl Pal for MockPal {
    fn file_exists(&self, path: &FilePath) -> ShelfResult<bool> {
        Ok(self.files.lock().contains_key(path))
    }

    fn read_file(&self, path: &FilePath) -> ShelfResult<Box<dyn ReadSeek + 'static>> {
        let content = self.file_content(path).ok_or_else(|| {
            Box::new(ShelfError::new(ErrorKind::FileError {
                path: path.as_path().to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ),
            }))
        })?;
        Ok(Box::new(Cursor::new(content)))
    }

    fn create_file(&self, path: &FilePath) -> ShelfResult<Box<dyn Write>> {
        self.check_writable(path)?;
        // The content lands in storage when the writer is dropped
        Ok(Box::new(MockFileWriter {
            path: path.clone(),
            files: Arc::clone(&self.files),
            buffer: Vec::new(),
        }))
    }

    fn rename_file(&self, from: &FilePath, to: &FilePath) -> ShelfResult<()> {
        self.check_writable(to)?;
        let mut files = self.files.lock();
        let content = files.remove(from).ok_or_else(|| {
            Box::new(ShelfError::new(ErrorKind::FileError {
                path: from.as_path().to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", from),
                ),
            }))
        })?;
        files.insert(to.clone(), content);
        Ok(())
    }

    fn create_directory_all(&self, path: &FilePath) -> ShelfResult<()> {
        self.directories.lock().insert(path.clone());
        Ok(())
    }

    fn start_http_server(
        &self,
        service: Box<dyn HttpService>,
        config: HttpServerConfig,
    ) -> ShelfResult<HttpServerHandle> {
        let port = match config.port {
            Some(p) => p,
            None => self.next_port.fetch_add(1, Ordering::SeqCst),
        };

        self.http_servers.lock().insert(
            port,
            HttpServerInfo {
                service,
                _config: config,
            },
        );

        Ok(HttpServerHandle::new(port))
    }
}

/// Helper struct for writing files to MockPal.
struct MockFileWriter {
    path: FilePath,
    files: Arc<Mutex<HashMap<FilePath, Vec<u8>>>>,
    buffer: Vec<u8>,
}

impl Write for MockFileWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for MockFileWriter {
    fn drop(&mut self) {
        self.files
            .lock()
            .insert(self.path.clone(), std::mem::take(&mut self.buffer));
    }
}
