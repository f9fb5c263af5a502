use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{MemoryStore, RecordStore, Result};
use crate::error::StoreError;
use crate::models::invoice::{InvoiceRecord, RecordId};

/// On-disk layout. `next_id` is the identifier high-water mark, so an id
/// freed by a delete is never handed to a later upload.
#[derive(Serialize)]
struct Snapshot<'a> {
    next_id: RecordId,
    records: Vec<&'a InvoiceRecord>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredFile {
    Current {
        next_id: RecordId,
        records: Vec<InvoiceRecord>,
    },
    /// Bare array written by earlier versions.
    Bare(Vec<InvoiceRecord>),
}

/// Modification time and length of the file, `None` when it does not exist.
type FileStamp = Option<(Option<SystemTime>, u64)>;

fn stamp(path: &Path) -> Result<FileStamp> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some((meta.modified().ok(), meta.len()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Records kept in a single JSON file on disk.
///
/// The whole file is rewritten after every mutation, through a temporary
/// file and a rename so a crash never leaves a half-written file.
///
/// The store assumes a single writer per file. It does not merge concurrent
/// edits: when the file changed on disk since it was opened, a write fails
/// with [`StoreError::Conflict`] instead of overwriting the other change, and
/// the store must be reopened.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
    loaded: FileStamp,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let loaded = stamp(&path)?;
        let inner = if loaded.is_some() {
            let content = fs::read_to_string(&path)?;
            let inner = if content.trim().is_empty() {
                MemoryStore::new()
            } else {
                match serde_json::from_str::<StoredFile>(&content).map_err(|e| StoreError::Corrupt(e.to_string()))? {
                    StoredFile::Current { next_id, records } => MemoryStore::with_next_id(records, next_id.0),
                    StoredFile::Bare(records) => MemoryStore::from_records(records),
                }
            };
            debug!("Loaded {} records from {}", inner.len(), path.display());
            inner
        } else {
            MemoryStore::new()
        };

        Ok(Self { path, inner, loaded })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&mut self) -> Result<()> {
        if stamp(&self.path)? != self.loaded {
            return Err(StoreError::Conflict(self.path.display().to_string()));
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let snapshot = Snapshot {
            next_id: self.inner.next_id(),
            records: self.inner.records().collect(),
        };
        let content = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        self.loaded = stamp(&self.path)?;
        Ok(())
    }
}

impl RecordStore for JsonFileStore {
    fn list(&self) -> Result<Vec<InvoiceRecord>> {
        self.inner.list()
    }

    fn get(&self, id: RecordId) -> Result<InvoiceRecord> {
        self.inner.get(id)
    }

    fn insert(&mut self, record: InvoiceRecord) -> Result<InvoiceRecord> {
        let record = self.inner.insert(record)?;
        self.persist()?;
        Ok(record)
    }

    fn save(&mut self, record: &InvoiceRecord) -> Result<()> {
        self.inner.save(record)?;
        self.persist()
    }

    fn remove(&mut self, id: RecordId) -> Result<InvoiceRecord> {
        let record = self.inner.remove(id)?;
        self.persist()?;
        Ok(record)
    }
}
