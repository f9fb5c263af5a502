use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::debug;

use super::{NotificationTransport, Result};
use crate::error::TransportError;
use crate::expiration::NotificationPayload;

/// Drops every message as a JSON file into a directory, for a mailer or an
/// operator to pick up.
#[derive(Debug, Clone)]
pub struct OutboxTransport {
    dir: PathBuf,
}

impl OutboxTransport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(payload: &NotificationPayload) -> String {
        format!(
            "{}-{}-{}.json",
            Utc::now().format("%Y%m%dT%H%M%S%.6f"),
            payload.record_id,
            payload.tier
        )
    }
}

impl NotificationTransport for OutboxTransport {
    fn deliver(&self, payload: &NotificationPayload) -> Result<()> {
        if payload.recipient.trim().is_empty() {
            return Err(TransportError::Delivery("empty recipient".to_string()));
        }

        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(Self::file_name(payload));
        let content = serde_json::to_string_pretty(payload)
            .map_err(|e| TransportError::Delivery(e.to_string()))?;
        fs::write(&path, content)?;

        debug!("Queued notification at {}", path.display());
        Ok(())
    }
}
