/* 📖 # Why create an ItemStore trait?

The ItemStore trait abstracts how items are persisted and retrieved, so the API
service works the same against:

1. **In-memory store**: For tests and throwaway instances
2. **File store**: A JSON collection file written through the PAL

Only validated input types (ValidItem, ValidPatch) are accepted, so every record a
store holds has a non-empty name. Mutations take `&mut self`; StoreHandle supplies
the locking.
*/

use std::sync::Arc;

use parking_lot::RwLock;

use shelf_base::ShelfResult;

use crate::item::{Item, ItemId, ValidItem, ValidPatch};

/// Trait for item storage implementations.
///
/// Lookups return `Ok(None)` when no item has the given id. An `Err` always means
/// the store itself failed.
pub trait ItemStore: Send + Sync + 'static {
    /// All items in insertion order.
    fn list(&self) -> ShelfResult<Vec<Item>>;

    /// Retrieve an item by its id.
    fn get(&self, id: &ItemId) -> ShelfResult<Option<Item>>;

    /// Persist a new item under a freshly generated id and return it.
    fn insert(&mut self, fields: ValidItem) -> ShelfResult<Item>;

    /// Apply an update and return the updated item.
    ///
    /// # Returns
    /// * `Ok(Some(item))` - The item after the update
    /// * `Ok(None)` - If no item with that id exists
    fn update(&mut self, id: &ItemId, patch: ValidPatch) -> ShelfResult<Option<Item>>;

    /// Remove an item, returning it if it existed.
    fn remove(&mut self, id: &ItemId) -> ShelfResult<Option<Item>>;

    /// Number of stored items.
    fn len(&self) -> ShelfResult<usize>;

    /// Returns true if the store holds no items.
    fn is_empty(&self) -> ShelfResult<bool>;
}

/// A thread-safe handle to an item store.
///
/// StoreHandle provides cheap cloning (via Arc) and interior mutability (via RwLock).
/// One handle is created at startup and passed to the API service; reads share the
/// lock, mutations take it exclusively, so concurrent updates of one item resolve as
/// last write wins.
///
/// This follows the same pattern as `PalHandle` in shelf_base.
#[derive(Clone)]
pub struct StoreHandle(Arc<RwLock<dyn ItemStore>>);

impl StoreHandle {
    /// Create a new StoreHandle wrapping the given store implementation.
    pub fn new<S: ItemStore>(store: S) -> Self {
        Self(Arc::new(RwLock::new(store)))
    }

    /// See [`ItemStore::list`].
    pub fn list(&self) -> ShelfResult<Vec<Item>> {
        self.0.read().list()
    }

    /// See [`ItemStore::get`].
    pub fn get(&self, id: &ItemId) -> ShelfResult<Option<Item>> {
        self.0.read().get(id)
    }

    /// See [`ItemStore::insert`].
    pub fn insert(&self, fields: ValidItem) -> ShelfResult<Item> {
        self.0.write().insert(fields)
    }

    /// See [`ItemStore::update`].
    pub fn update(&self, id: &ItemId, patch: ValidPatch) -> ShelfResult<Option<Item>> {
        self.0.write().update(id, patch)
    }

    /// See [`ItemStore::remove`].
    pub fn remove(&self, id: &ItemId) -> ShelfResult<Option<Item>> {
        self.0.write().remove(id)
    }

    /// See [`ItemStore::len`].
    pub fn len(&self) -> ShelfResult<usize> {
        self.0.read().len()
    }

    /// See [`ItemStore::is_empty`].
    pub fn is_empty(&self) -> ShelfResult<bool> {
        self.0.read().is_empty()
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle").finish_non_exhaustive()
    }
}
