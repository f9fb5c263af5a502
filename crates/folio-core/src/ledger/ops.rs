//! Record mutations: folder moves, status and due-date edits, deletion.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::models::invoice::{InvoiceRecord, PaymentStatus, RecordId};
use crate::store::{BlobStore, RecordStore, Result};

/// Assign `folder` to a record, or clear the assignment with `None`.
///
/// A blank name clears the assignment. Moving a record to the folder it is
/// already in changes nothing, `updated_at` included.
pub fn move_to_folder<S>(store: &mut S, id: RecordId, folder: Option<&str>, now: DateTime<Utc>) -> Result<InvoiceRecord>
where
    S: RecordStore + ?Sized,
{
    let mut record = store.get(id)?;
    let target = folder
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    if record.folder_name == target {
        debug!("Record {} already in folder {:?}", id, target);
        return Ok(record);
    }

    record.folder_name = target;
    record.updated_at = now;
    store.save(&record)?;
    info!("Moved record {} to folder {:?}", id, record.folder_name);
    Ok(record)
}

/// Outcome of a bulk move.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BulkMoveReport {
    pub moved: Vec<RecordId>,
    pub failed: Vec<(RecordId, String)>,
}

impl BulkMoveReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Move every record independently. Failures are reported and the records
/// already moved stay moved.
pub fn move_many<S>(store: &mut S, ids: &[RecordId], folder: Option<&str>, now: DateTime<Utc>) -> BulkMoveReport
where
    S: RecordStore + ?Sized,
{
    let mut report = BulkMoveReport::default();
    for &id in ids {
        match move_to_folder(store, id, folder, now) {
            Ok(_) => report.moved.push(id),
            Err(e) => {
                warn!("Failed to move record {}: {}", id, e);
                report.failed.push((id, e.to_string()));
            }
        }
    }
    report
}

/// Set the payment status of a record.
pub fn update_payment_status<S>(store: &mut S, id: RecordId, status: PaymentStatus, now: DateTime<Utc>) -> Result<InvoiceRecord>
where
    S: RecordStore + ?Sized,
{
    let mut record = store.get(id)?;
    if record.payment_status != status {
        record.payment_status = status;
        record.updated_at = now;
        store.save(&record)?;
    }
    Ok(record)
}

/// Set or clear the due date of a record.
///
/// A changed due date resets the notification mark, so reminders for the
/// new date are sent again.
pub fn set_due_date<S>(store: &mut S, id: RecordId, due_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Result<InvoiceRecord>
where
    S: RecordStore + ?Sized,
{
    let mut record = store.get(id)?;
    if record.due_at != due_at {
        record.due_at = due_at;
        record.last_notified_tier = None;
        record.updated_at = now;
        store.save(&record)?;
    }
    Ok(record)
}

/// A deleted record and what happened to its document.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletedInvoice {
    pub record: InvoiceRecord,
    /// Set when the record is gone but its blob could not be released.
    pub blob_error: Option<String>,
}

/// Remove a record, then release its stored document.
pub fn delete_invoice<S, B>(store: &mut S, blobs: &mut B, id: RecordId) -> Result<DeletedInvoice>
where
    S: RecordStore + ?Sized,
    B: BlobStore + ?Sized,
{
    let record = store.remove(id)?;
    let blob_error = match blobs.release(&record.locator) {
        Ok(()) => None,
        Err(e) => {
            warn!("Record {} deleted but blob {} was not released: {}", id, record.locator, e);
            Some(e.to_string())
        }
    };
    info!("Deleted record {}", id);
    Ok(DeletedInvoice { record, blob_error })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::expiration::Tier;
    use crate::store::{MemoryBlobStore, MemoryStore};
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap()
    }

    fn store_with(titles: &[&str]) -> MemoryStore {
        let mut store = MemoryStore::new();
        for title in titles {
            store
                .insert(InvoiceRecord::new(*title, format!("pdfs/{}.pdf", title), t0()))
                .unwrap();
        }
        store
    }

    #[test]
    fn test_move_is_idempotent() {
        let mut store = store_with(&["luz"]);
        let later = t0() + Duration::hours(1);
        let much_later = t0() + Duration::hours(2);

        let first = move_to_folder(&mut store, RecordId(1), Some("Servicios"), later).unwrap();
        assert_eq!(first.folder_name.as_deref(), Some("Servicios"));
        assert_eq!(first.updated_at, later);

        let second = move_to_folder(&mut store, RecordId(1), Some(" Servicios "), much_later).unwrap();
        assert_eq!(second, first);
        assert_eq!(store.get(RecordId(1)).unwrap(), first);
    }

    #[test]
    fn test_move_to_none_clears() {
        let mut store = store_with(&["luz"]);
        move_to_folder(&mut store, RecordId(1), Some("Servicios"), t0()).unwrap();
        let cleared = move_to_folder(&mut store, RecordId(1), Some("  "), t0()).unwrap();
        assert_eq!(cleared.folder_name, None);
    }

    #[test]
    fn test_move_unknown_record() {
        let mut store = store_with(&[]);
        let err = move_to_folder(&mut store, RecordId(5), Some("x"), t0()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(RecordId(5))));
    }

    #[test]
    fn test_move_many_reports_partial_failure() {
        let mut store = store_with(&["luz", "agua"]);
        let report = move_many(&mut store, &[RecordId(1), RecordId(7), RecordId(2)], Some("Casa"), t0());
        assert_eq!(report.moved, vec![RecordId(1), RecordId(2)]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, RecordId(7));
        assert!(!report.is_complete());
        assert_eq!(store.get(RecordId(2)).unwrap().folder_name.as_deref(), Some("Casa"));
    }

    #[test]
    fn test_update_payment_status() {
        let mut store = store_with(&["luz"]);
        let later = t0() + Duration::minutes(5);
        let record = update_payment_status(&mut store, RecordId(1), PaymentStatus::Paid, later).unwrap();
        assert_eq!(record.payment_status, PaymentStatus::Paid);
        assert_eq!(record.updated_at, later);
    }

    #[test]
    fn test_set_due_date_resets_mark() {
        let mut store = store_with(&["luz"]);
        let due = t0() + Duration::days(3);
        let mut record = set_due_date(&mut store, RecordId(1), Some(due), t0()).unwrap();
        record.last_notified_tier = Some(Tier::Reminder);
        store.save(&record).unwrap();

        // Same date keeps the mark.
        let same = set_due_date(&mut store, RecordId(1), Some(due), t0()).unwrap();
        assert_eq!(same.last_notified_tier, Some(Tier::Reminder));

        let moved = set_due_date(&mut store, RecordId(1), Some(due + Duration::days(10)), t0()).unwrap();
        assert_eq!(moved.last_notified_tier, None);

        let cleared = set_due_date(&mut store, RecordId(1), None, t0()).unwrap();
        assert_eq!(cleared.due_at, None);
    }

    #[test]
    fn test_delete_releases_blob() {
        let mut store = store_with(&[]);
        let mut blobs = MemoryBlobStore::new();
        let locator = blobs.put("pdfs/luz.pdf", b"%PDF").unwrap();
        let record = store.insert(InvoiceRecord::new("luz", locator.clone(), t0())).unwrap();

        let deleted = delete_invoice(&mut store, &mut blobs, record.id).unwrap();
        assert_eq!(deleted.blob_error, None);
        assert!(!blobs.contains(&locator));
        assert!(store.is_empty());
        assert!(delete_invoice(&mut store, &mut blobs, record.id).is_err());
    }
}
