/* 📖 # Why a JSON collection file behind the PAL?

FileStore is the persistent backend. The whole collection lives in one JSON array,
`items.json`, inside the data directory:

1. **Connect = open**: `FileStore::open` creates the data directory, then loads and
   checks the collection. A corrupt or unreadable file fails startup.
2. **Write-through**: every mutation is applied to a copy of the collection, the copy
   is written to `items.json.tmp` and renamed over `items.json`, and only then does the
   in-memory state move forward. A failed write changes nothing.
3. **PAL only**: all file access goes through PalHandle, so MockPal can stand in for
   the disk and inject write failures.
*/

use std::io::Write;

use tracing::{debug, info, instrument};

use shelf_base::{ErrorKind, FilePath, PalHandle, ResultExt, ShelfError, ShelfResult};

use crate::item::{Item, ItemId, ValidItem, ValidPatch};
use crate::store::memory::InMemoryStore;
use crate::store::traits::ItemStore;

/// Name of the collection file inside the data directory.
pub const COLLECTION_FILE: &str = "items.json";

const STAGING_FILE: &str = "items.json.tmp";

/// An item store persisted as a JSON collection file.
#[derive(Debug)]
pub struct FileStore {
    pal: PalHandle,
    collection: FilePath,
    staging: FilePath,
    items: InMemoryStore,
}

impl FileStore {
    /// Open the collection in `data_dir`, creating the directory if needed.
    #[instrument(skip(pal), fields(data_dir = %data_dir))]
    pub fn open(pal: PalHandle, data_dir: &FilePath) -> ShelfResult<Self> {
        pal.create_directory_all(data_dir)
            .with_context(|| format!("while creating data directory {}", data_dir))?;

        let collection = data_dir.join(COLLECTION_FILE);
        let items = if pal.file_exists(&collection)? {
            let items = Self::load(&pal, &collection)
                .with_context(|| format!("while loading collection {}", collection))?;
            info!(count = items.len()?, "loaded item collection");
            items
        } else {
            info!("no collection file yet, starting empty");
            InMemoryStore::new()
        };

        Ok(Self {
            pal,
            collection,
            staging: data_dir.join(STAGING_FILE),
            items,
        })
    }

    fn load(pal: &PalHandle, collection: &FilePath) -> ShelfResult<InMemoryStore> {
        let bytes = pal.read_file_to_bytes(collection)?;
        let items: Vec<Item> = serde_json::from_slice(&bytes)
            .map_err(|e| shelf_base::err!("corrupt collection file: {}", e))?;
        InMemoryStore::from_items(items)
    }

    /// Write `next` to disk, then adopt it as the current state.
    fn commit(&mut self, next: InMemoryStore) -> ShelfResult<()> {
        self.persist(&next)
            .with_context(|| format!("while writing collection {}", self.collection))?;
        self.items = next;
        Ok(())
    }

    fn persist(&self, items: &InMemoryStore) -> ShelfResult<()> {
        let records: Vec<&Item> = items.iter().collect();
        let json = serde_json::to_vec_pretty(&records)
            .map_err(|e| shelf_base::err!("failed to serialize collection: {}", e))?;

        let mut writer = self.pal.create_file(&self.staging)?;
        writer
            .write_all(&json)
            .and_then(|()| writer.flush())
            .map_err(|e| self.write_error(e))?;
        drop(writer);

        self.pal.rename_file(&self.staging, &self.collection)?;
        debug!(count = records.len(), bytes = json.len(), "collection written");
        Ok(())
    }

    fn write_error(&self, source: std::io::Error) -> Box<ShelfError> {
        Box::new(ShelfError::new(ErrorKind::FileError {
            path: self.staging.as_path().to_path_buf(),
            source,
        }))
    }
}

impl ItemStore for FileStore {
    fn list(&self) -> ShelfResult<Vec<Item>> {
        self.items.list()
    }

    fn get(&self, id: &ItemId) -> ShelfResult<Option<Item>> {
        self.items.get(id)
    }

    fn insert(&mut self, fields: ValidItem) -> ShelfResult<Item> {
        let mut next = self.items.clone();
        let item = next.insert(fields)?;
        self.commit(next)?;
        Ok(item)
    }

    fn update(&mut self, id: &ItemId, patch: ValidPatch) -> ShelfResult<Option<Item>> {
        if self.items.get(id)?.is_none() {
            return Ok(None);
        }
        let mut next = self.items.clone();
        let updated = next.update(id, patch)?;
        self.commit(next)?;
        Ok(updated)
    }

    fn remove(&mut self, id: &ItemId) -> ShelfResult<Option<Item>> {
        if self.items.get(id)?.is_none() {
            return Ok(None);
        }
        let mut next = self.items.clone();
        let removed = next.remove(id)?;
        self.commit(next)?;
        Ok(removed)
    }

    fn len(&self) -> ShelfResult<usize> {
        self.items.len()
    }

    fn is_empty(&self) -> ShelfResult<bool> {
        self.items.is_empty()
    }
}
