pub mod api;
pub mod config;
pub mod item;
pub mod store;

pub use api::{ApiService, ItemService, StaticAssetService};
pub use config::Config;
pub use item::{Item, ItemId, ItemPatch, NewItem, ValidItem, ValidPatch};
pub use store::{FileStore, InMemoryStore, ItemStore, StoreHandle};
