mod file;
mod memory;
mod traits;

pub use file::{COLLECTION_FILE, FileStore};
pub use memory::InMemoryStore;
pub use traits::{ItemStore, StoreHandle};
