//! Periodic pass over unpaid records that sends due-date reminders.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{ExpirationPolicy, MessageContext, NotificationPayload};
use crate::error::SweepError;
use crate::models::config::ExpirationConfig;
use crate::models::invoice::{InvoiceRecord, RecordId};
use crate::notify::NotificationTransport;
use crate::store::RecordStore;

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepReport {
    /// Unpaid records with a due date that were looked at.
    pub reviewed: usize,
    /// Records whose notification was handed to the transport.
    pub sent: Vec<RecordId>,
    /// Records skipped because this tier was already notified.
    pub already_notified: usize,
    pub failures: Vec<SweepFailure>,
    /// True when the sweep stopped early on request.
    pub cancelled: bool,
}

/// A record the sweep could not handle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepFailure {
    pub id: RecordId,
    pub reason: String,
}

/// Evaluates every unpaid record against the policy and delivers the
/// resulting reminders.
///
/// A sweep is not reentrant: calling [`run`](Self::run) while another run is
/// in progress fails with [`SweepError::AlreadyRunning`].
#[derive(Debug)]
pub struct ExpirationSweep {
    policy: ExpirationPolicy,
    message: MessageContext,
    fallback_recipient: Option<String>,
    running: AtomicBool,
    cancelled: AtomicBool,
}

struct RunGuard<'a> {
    sweep: &'a ExpirationSweep,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.sweep.cancelled.store(false, Ordering::SeqCst);
        self.sweep.running.store(false, Ordering::SeqCst);
    }
}

impl ExpirationSweep {
    pub fn new(policy: ExpirationPolicy, message: MessageContext) -> Self {
        Self {
            policy,
            message,
            fallback_recipient: None,
            running: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &ExpirationConfig) -> Self {
        let message = MessageContext {
            portal_base_url: config.portal_base_url.clone(),
            sender_name: config.sender_name.clone(),
        };
        Self::new(config.policy(), message)
            .with_fallback_recipient(config.fallback_recipient.clone())
    }

    /// Recipient for records without an uploader address.
    pub fn with_fallback_recipient(mut self, recipient: Option<String>) -> Self {
        self.fallback_recipient = recipient.filter(|r| !r.trim().is_empty());
        self
    }

    /// Ask the current run to stop before its next record.
    pub fn cancel(&self) {
        if self.running.load(Ordering::SeqCst) {
            self.cancelled.store(true, Ordering::SeqCst);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn recipient_for(&self, record: &InvoiceRecord) -> Option<String> {
        record
            .uploaded_by
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .or_else(|| self.fallback_recipient.clone())
    }

    /// Run one pass at `now`.
    ///
    /// Only listing the records can fail the whole run; problems with a
    /// single record are logged and reported, and the pass continues.
    pub fn run<S, T>(&self, store: &mut S, transport: &T, now: DateTime<Utc>) -> Result<SweepReport, SweepError>
    where
        S: RecordStore + ?Sized,
        T: NotificationTransport + ?Sized,
    {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SweepError::AlreadyRunning);
        }
        let _guard = RunGuard { sweep: self };

        let mut report = SweepReport::default();
        let records = store.list()?;

        for mut record in records {
            if self.cancelled.load(Ordering::SeqCst) {
                info!("Expiration sweep cancelled after {} records", report.reviewed);
                report.cancelled = true;
                break;
            }

            let Some(due_at) = record.due_at else {
                continue;
            };
            if !record.awaits_payment() {
                continue;
            }
            report.reviewed += 1;

            let decision = self.policy.evaluate(due_at, now);
            if !decision.notifies() {
                continue;
            }
            if record.last_notified_tier.is_some_and(|last| last >= decision.tier) {
                debug!("Record {} already notified at {:?}", record.id, decision.tier);
                report.already_notified += 1;
                continue;
            }

            let Some(recipient) = self.recipient_for(&record) else {
                warn!("Record {} has no recipient, skipping", record.id);
                report.failures.push(SweepFailure {
                    id: record.id,
                    reason: "no recipient".to_string(),
                });
                continue;
            };

            let Some(payload) = NotificationPayload::render(&decision, &record, &recipient, &self.message) else {
                continue;
            };

            if let Err(e) = transport.deliver(&payload) {
                warn!("Failed to notify record {}: {}", record.id, e);
                report.failures.push(SweepFailure {
                    id: record.id,
                    reason: e.to_string(),
                });
                continue;
            }
            report.sent.push(record.id);

            record.last_notified_tier = Some(decision.tier);
            if let Err(e) = store.save(&record) {
                warn!("Notified record {} but failed to mark it: {}", record.id, e);
                report.failures.push(SweepFailure {
                    id: record.id,
                    reason: format!("mark failed: {}", e),
                });
            }
        }

        info!(
            "Expiration sweep reviewed {} records, sent {} notifications",
            report.reviewed,
            report.sent.len()
        );
        Ok(report)
    }
}
