use std::io::{Read, Seek, Write};
use std::sync::Arc;

use crate::ShelfResult;

use super::file_path::FilePath;
use super::http::{HttpServerConfig, HttpServerHandle, HttpService};

/// Trait combining Read + Seek for file operations.
pub trait ReadSeek: Read + Seek + Send {}
impl<T: Read + Seek + Send> ReadSeek for T {}

/* 📖 # Why is Pal a trait instead of a struct?

The item store and the asset service only touch the platform through this trait:
1. **Testability**: MockPal keeps collections and assets in memory and can inject write failures
2. **Flexibility**: The engine never depends on std::fs or tiny_http directly
*/

/// Platform Abstraction Layer (PAL) trait providing filesystem and HTTP operations.
///
/// Two implementations are provided:
/// - `RealPal`: Uses the real filesystem via `std::fs` and serves HTTP with tiny_http
/// - `MockPal`: In-memory implementation for testing
pub trait Pal: std::fmt::Debug + Send + Sync + 'static {
    /// Check if a regular file exists at the given path.
    fn file_exists(&self, path: &FilePath) -> ShelfResult<bool>;

    /// Open a file for reading.
    fn read_file(&self, path: &FilePath) -> ShelfResult<Box<dyn ReadSeek + 'static>>;

    /// Read entire file contents.
    fn read_file_to_bytes(&self, path: &FilePath) -> ShelfResult<Vec<u8>> {
        let mut reader = self.read_file(path)?;
        let mut contents = Vec::new();
        reader.read_to_end(&mut contents).map_err(|e| {
            Box::new(crate::ShelfError::new(crate::ErrorKind::FileError {
                path: path.as_path().to_path_buf(),
                source: e,
            }))
        })?;
        Ok(contents)
    }

    /// Read entire file contents as a UTF-8 string.
    fn read_file_to_string(&self, path: &FilePath) -> ShelfResult<String> {
        let contents = self.read_file_to_bytes(path)?;
        String::from_utf8(contents).map_err(|_e| crate::err!("File is not valid UTF-8: {}", path))
    }

    /// Create a new file, overwriting if it exists.
    fn create_file(&self, path: &FilePath) -> ShelfResult<Box<dyn Write>>;

    /// Replace `to` with `from`. Used to swap a fully written file into place.
    fn rename_file(&self, from: &FilePath, to: &FilePath) -> ShelfResult<()>;

    /// Create a directory and all parent directories.
    fn create_directory_all(&self, path: &FilePath) -> ShelfResult<()>;

    /// Start an HTTP server with the given service.
    ///
    /// Returns once the listener is bound. Requests are served on background
    /// threads until the returned handle is shut down.
    fn start_http_server(
        &self,
        service: Box<dyn HttpService>,
        config: HttpServerConfig,
    ) -> ShelfResult<HttpServerHandle>;
}

/// Handle to a PAL implementation, enabling shared ownership.
///
/// Internally wraps `Arc<dyn Pal>` for cheap cloning and thread-safe sharing.
///
/// ```no_run
/// use shelf_base::{RealPal, PalHandle};
///
/// let pal = PalHandle::new(RealPal::new(".".into()));
/// let pal_clone = pal.clone(); // Cheap clone, shares the same implementation
/// ```
#[derive(Debug, Clone)]
pub struct PalHandle(Arc<dyn Pal>);

impl PalHandle {
    /// Create a new PalHandle from a Pal implementation.
    pub fn new(pal: impl Pal + 'static) -> Self {
        Self(Arc::new(pal))
    }
}

impl std::ops::Deref for PalHandle {
    type Target = dyn Pal;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}
