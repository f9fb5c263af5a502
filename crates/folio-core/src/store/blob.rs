use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use super::{BlobStore, Result};
use crate::error::StoreError;

/// Blobs kept in memory, keyed by locator.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: HashMap<String, Vec<u8>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, locator: &str) -> bool {
        self.blobs.contains_key(locator)
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&mut self, key: &str, data: &[u8]) -> Result<String> {
        self.blobs.insert(key.to_string(), data.to_vec());
        Ok(key.to_string())
    }

    fn fetch(&self, locator: &str) -> Result<Vec<u8>> {
        self.blobs.get(locator).cloned().ok_or_else(|| StoreError::Blob {
            locator: locator.to_string(),
            reason: "not found".to_string(),
        })
    }

    fn release(&mut self, locator: &str) -> Result<()> {
        self.blobs.remove(locator);
        Ok(())
    }
}

/// Blobs stored as files below a root directory.
///
/// Locators are paths relative to the root, so a record store can be moved
/// together with its blob directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, locator: &str) -> Result<PathBuf> {
        let relative = Path::new(locator);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if locator.is_empty() || escapes {
            return Err(StoreError::Blob {
                locator: locator.to_string(),
                reason: "locator outside the blob directory".to_string(),
            });
        }
        Ok(self.root.join(relative))
    }
}

impl BlobStore for FsBlobStore {
    fn put(&mut self, key: &str, data: &[u8]) -> Result<String> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, data)?;
        Ok(key.to_string())
    }

    fn fetch(&self, locator: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.resolve(locator)?)?)
    }

    fn release(&mut self, locator: &str) -> Result<()> {
        let path = self.resolve(locator)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
