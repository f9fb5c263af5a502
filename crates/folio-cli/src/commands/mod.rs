pub mod config;
pub mod extract;
pub mod ingest;
pub mod ledger;
pub mod records;
pub mod sweep;

use std::path::{Path, PathBuf};

use folio_core::models::config::FolioConfig;
use folio_core::store::{FsBlobStore, JsonFileStore};
use tracing::debug;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("folio")
        .join("config.json")
}

/// The config file in effect: `--config` when given, else the default path.
pub fn config_path(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load the configuration, falling back to defaults when no file exists.
///
/// An explicit `--config` path must exist.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<FolioConfig> {
    if let Some(path) = explicit {
        let path = Path::new(path);
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        return Ok(FolioConfig::from_file(path)?);
    }

    let path = default_config_path();
    if path.exists() {
        debug!("Using config at {}", path.display());
        Ok(FolioConfig::from_file(&path)?)
    } else {
        Ok(FolioConfig::default())
    }
}

/// Record store and blob store named by the configuration.
pub fn open_stores(config: &FolioConfig) -> anyhow::Result<(JsonFileStore, FsBlobStore)> {
    let store = JsonFileStore::open(&config.store.records_path)?;
    let blobs = FsBlobStore::new(&config.store.blob_dir);
    Ok((store, blobs))
}
