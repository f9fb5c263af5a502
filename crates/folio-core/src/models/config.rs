//! Configuration structures for the ledger pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{FolioError, Result};
use crate::expiration::ExpirationPolicy;

/// Main configuration for folio.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    /// Record and blob storage locations.
    pub store: StoreConfig,

    /// Upload validation limits.
    pub upload: UploadConfig,

    /// Expiration reminder policy.
    pub expiration: ExpirationConfig,

    /// Notification delivery settings.
    pub notify: NotifyConfig,
}

/// Storage locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON file holding the record set.
    pub records_path: PathBuf,

    /// Directory receiving uploaded PDFs.
    pub blob_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            records_path: PathBuf::from("data/records.json"),
            blob_dir: PathBuf::from("data/blobs"),
        }
    }
}

/// Upload validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Largest accepted PDF in bytes.
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 25 * 1024 * 1024,
        }
    }
}

/// Expiration reminder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpirationConfig {
    /// Days before the due date at which reminders start.
    pub reminder_days: f64,

    /// Days before the due date at which reminders become urgent.
    pub urgent_days: f64,

    /// Days after the due date during which urgent notices are still sent.
    pub grace_days: f64,

    /// Recipient used when a record has no uploader address.
    pub fallback_recipient: Option<String>,

    /// Base URL of the portal, used to build links in messages.
    pub portal_base_url: String,

    /// Display name of the sender.
    pub sender_name: String,
}

impl Default for ExpirationConfig {
    fn default() -> Self {
        let policy = ExpirationPolicy::default();
        Self {
            reminder_days: policy.reminder_days,
            urgent_days: policy.urgent_days,
            grace_days: policy.grace_days,
            fallback_recipient: None,
            portal_base_url: "http://localhost:3000".to_string(),
            sender_name: "Portal de Facturas".to_string(),
        }
    }
}

impl ExpirationConfig {
    /// Tier thresholds as an evaluator policy.
    pub fn policy(&self) -> ExpirationPolicy {
        ExpirationPolicy {
            reminder_days: self.reminder_days,
            urgent_days: self.urgent_days,
            grace_days: self.grace_days,
        }
    }
}

/// Notification delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Directory receiving rendered messages.
    pub outbox_dir: PathBuf,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            outbox_dir: PathBuf::from("data/outbox"),
        }
    }
}

impl FolioConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| FolioError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| FolioError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
