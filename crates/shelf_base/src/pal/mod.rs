/* 📖 # What is the Platform Abstraction Layer?

The PAL is a trait over the few platform services shelf needs: reading and atomically
replacing files, and serving HTTP. RealPal talks to std::fs and tiny_http, MockPal keeps
everything in memory so store and API tests run without touching disk or sockets.
*/

mod file_path;
pub mod http;
pub mod mock;
pub mod real_pal;
mod traits;

pub use file_path::FilePath;
pub use mock::MockPal;
pub use real_pal::RealPal;
pub use traits::{Pal, PalHandle, ReadSeek};
