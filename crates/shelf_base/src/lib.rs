/* 📖 # Why have shelf_base as a core library?
shelf_base provides the error type, tracing setup and the platform abstraction layer
used by the other crates. Keeping them here prevents circular dependencies between the
engine and the binary.
*/

pub mod error;
pub mod pal;
pub mod tracing;

// Re-export commonly used types for convenience
pub use error::{ErrorKind, ResultExt, ShelfError, ShelfResult};
pub use pal::{FilePath, MockPal, Pal, PalHandle, RealPal};
