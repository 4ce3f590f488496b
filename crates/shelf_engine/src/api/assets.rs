/* 📖 # Why serve static files through the PAL?

The browser UI is a directory of plain files. Reading them through PalHandle keeps the
asset service testable with MockPal, and mapping the URL with
`FilePath::from_url_path` means a request can only ever address files below the
public directory: any `..` segment is answered with 404 before touching the disk.

The path is percent-decoded first, so `/my%20notes.txt` finds `my notes.txt` and an
encoded `%2e%2e` is caught by the same traversal check. A path that does not decode to
UTF-8 is a 404.
*/

use percent_encoding::percent_decode_str;
use tracing::{debug, warn};

use shelf_base::pal::http::{HttpBody, HttpResponse, HttpStatusCode};
use shelf_base::{FilePath, PalHandle, ResultExt, ShelfResult};

const INDEX_FILE: &str = "index.html";

/// Serves files from the public directory.
#[derive(Debug, Clone)]
pub struct StaticAssetService {
    pal: PalHandle,
    root: FilePath,
}

impl StaticAssetService {
    pub fn new(pal: PalHandle, root: FilePath) -> Self {
        Self { pal, root }
    }

    /// Serve the file addressed by a request path. `/` serves `index.html`.
    pub fn serve(&self, url_path: &str) -> ShelfResult<HttpResponse> {
        let Ok(decoded) = percent_decode_str(url_path).decode_utf8() else {
            debug!(path = url_path, "static path is not valid UTF-8");
            return Ok(Self::not_found());
        };
        let file = if decoded.trim_start_matches('/').is_empty() {
            self.root.join(INDEX_FILE)
        } else {
            match FilePath::from_url_path(&self.root, &decoded) {
                Some(file) => file,
                None => {
                    warn!(path = url_path, "rejected static path outside public directory");
                    return Ok(Self::not_found());
                }
            }
        };

        if !self.pal.file_exists(&file)? {
            debug!(path = url_path, file = %file, "static file not found");
            return Ok(Self::not_found());
        }

        let content = self
            .pal
            .read_file_to_bytes(&file)
            .with_context(|| format!("while serving static file {}", file))?;
        let content_type = guess_content_type(file.extension().unwrap_or_default());
        debug!(
            file = %file,
            content_type,
            content_size = content.len(),
            "serving static file"
        );

        Ok(HttpResponse::new(HttpStatusCode::Ok)
            .with_content_type(content_type)
            .with_body(HttpBody::from_bytes(content)))
    }

    fn not_found() -> HttpResponse {
        HttpResponse::text(HttpStatusCode::NotFound, "Not found")
    }
}

/// Guess the MIME type from a file extension.
pub fn guess_content_type(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "wasm" => "application/wasm",
        "xml" => "application/xml",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
