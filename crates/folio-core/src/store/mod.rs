//! Record and blob storage.
//!
//! The ledger talks to storage only through [`RecordStore`] and [`BlobStore`].
//! In-memory implementations back the tests; the file implementations back
//! the command line tool.

mod blob;
mod json;
mod memory;

pub use blob::{FsBlobStore, MemoryBlobStore};
pub use json::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::models::invoice::{InvoiceRecord, RecordId};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Persistence for invoice records.
pub trait RecordStore {
    /// All records, ordered by identifier.
    fn list(&self) -> Result<Vec<InvoiceRecord>>;

    /// One record by identifier.
    fn get(&self, id: RecordId) -> Result<InvoiceRecord>;

    /// Store a new record, assigning its identifier.
    fn insert(&mut self, record: InvoiceRecord) -> Result<InvoiceRecord>;

    /// Overwrite an existing record.
    fn save(&mut self, record: &InvoiceRecord) -> Result<()>;

    /// Remove a record and return it.
    fn remove(&mut self, id: RecordId) -> Result<InvoiceRecord>;
}

/// Storage for the uploaded document bytes.
pub trait BlobStore {
    /// Store `data` under `key` and return its locator.
    fn put(&mut self, key: &str, data: &[u8]) -> Result<String>;

    /// Read back the bytes behind a locator.
    fn fetch(&self, locator: &str) -> Result<Vec<u8>>;

    /// Delete the bytes behind a locator.
    fn release(&mut self, locator: &str) -> Result<()>;
}

impl<S: RecordStore + ?Sized> RecordStore for &mut S {
    fn list(&self) -> Result<Vec<InvoiceRecord>> {
        (**self).list()
    }

    fn get(&self, id: RecordId) -> Result<InvoiceRecord> {
        (**self).get(id)
    }

    fn insert(&mut self, record: InvoiceRecord) -> Result<InvoiceRecord> {
        (**self).insert(record)
    }

    fn save(&mut self, record: &InvoiceRecord) -> Result<()> {
        (**self).save(record)
    }

    fn remove(&mut self, id: RecordId) -> Result<InvoiceRecord> {
        (**self).remove(id)
    }
}
