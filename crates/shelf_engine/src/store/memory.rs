/* 📖 # Why provide an in-memory store implementation?

The InMemoryStore keeps all items in a HashMap for O(1) lookup by id plus a Vec of
ids recording insertion order, which is the order `list` returns. It backs the unit
and API tests, and FileStore uses it as its working copy of the collection.
*/

use std::collections::HashMap;

use shelf_base::{ErrorKind, ShelfError, ShelfResult};

use crate::item::{Item, ItemId, ValidItem, ValidPatch};
use crate::store::traits::ItemStore;

/// An insertion-ordered in-memory item store.
///
/// # Example
///
/// ```
/// use shelf_engine::{InMemoryStore, ItemStore, NewItem};
///
/// let mut store = InMemoryStore::new();
/// let fields = NewItem { name: Some("Lamp".into()), description: None }.validate().unwrap();
/// let item = store.insert(fields).unwrap();
///
/// assert_eq!(store.get(item.id()).unwrap(), Some(item));
/// assert_eq!(store.len().unwrap(), 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    items: HashMap<ItemId, Item>,
    order: Vec<ItemId>,
}

impl InMemoryStore {
    /// Create a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from previously persisted items, keeping their order.
    ///
    /// Every record is checked; all problems are reported together.
    pub fn from_items(items: Vec<Item>) -> ShelfResult<Self> {
        let mut store = Self::new();
        let mut errors = Vec::new();
        for item in items {
            if let Err(e) = item.check() {
                errors.push(*e);
                continue;
            }
            if store.items.contains_key(item.id()) {
                errors.push(ShelfError::message(format!("duplicate item id {}", item.id())));
                continue;
            }
            store.push(item);
        }
        if !errors.is_empty() {
            let count = errors.len();
            return Err(Box::new(ShelfError::new(ErrorKind::Multiple { errors, count })));
        }
        Ok(store)
    }

    /// Items in insertion order, borrowed.
    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.order.iter().filter_map(|id| self.items.get(id))
    }

    fn push(&mut self, item: Item) {
        self.order.push(*item.id());
        self.items.insert(*item.id(), item);
    }
}

impl ItemStore for InMemoryStore {
    fn list(&self) -> ShelfResult<Vec<Item>> {
        Ok(self.iter().cloned().collect())
    }

    fn get(&self, id: &ItemId) -> ShelfResult<Option<Item>> {
        Ok(self.items.get(id).cloned())
    }

    fn insert(&mut self, fields: ValidItem) -> ShelfResult<Item> {
        let mut id = ItemId::generate();
        while self.items.contains_key(&id) {
            id = ItemId::generate();
        }
        let item = Item::new(id, fields);
        self.push(item.clone());
        Ok(item)
    }

    fn update(&mut self, id: &ItemId, patch: ValidPatch) -> ShelfResult<Option<Item>> {
        Ok(self.items.get_mut(id).map(|item| {
            item.apply(patch);
            item.clone()
        }))
    }

    fn remove(&mut self, id: &ItemId) -> ShelfResult<Option<Item>> {
        let removed = self.items.remove(id);
        if removed.is_some() {
            self.order.retain(|existing| existing != id);
        }
        Ok(removed)
    }

    fn len(&self) -> ShelfResult<usize> {
        Ok(self.items.len())
    }

    fn is_empty(&self) -> ShelfResult<bool> {
        Ok(self.items.is_empty())
    }
}
