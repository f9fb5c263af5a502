use std::collections::BTreeMap;

use super::{RecordStore, Result};
use crate::error::StoreError;
use crate::models::invoice::{InvoiceRecord, RecordId};

/// Records held in a map, identifiers assigned from 1.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    records: BTreeMap<RecordId, InvoiceRecord>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Build a store from existing records, keeping their identifiers.
    pub fn from_records(records: impl IntoIterator<Item = InvoiceRecord>) -> Self {
        Self::with_next_id(records, 1)
    }

    /// Like [`MemoryStore::from_records`], but never hands out an identifier
    /// below `next_id`, even if the records that used them are gone.
    pub fn with_next_id(records: impl IntoIterator<Item = InvoiceRecord>, next_id: u64) -> Self {
        let records: BTreeMap<_, _> = records.into_iter().map(|r| (r.id, r)).collect();
        let after_last = records.keys().next_back().map(|id| id.0 + 1).unwrap_or(1);
        Self {
            records,
            next_id: next_id.max(after_last),
        }
    }

    /// Identifier the next insert will receive.
    pub fn next_id(&self) -> RecordId {
        RecordId(self.next_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn records(&self) -> impl Iterator<Item = &InvoiceRecord> {
        self.records.values()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryStore {
    fn list(&self) -> Result<Vec<InvoiceRecord>> {
        Ok(self.records.values().cloned().collect())
    }

    fn get(&self, id: RecordId) -> Result<InvoiceRecord> {
        self.records.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    fn insert(&mut self, mut record: InvoiceRecord) -> Result<InvoiceRecord> {
        record.id = RecordId(self.next_id);
        self.next_id += 1;
        self.records.insert(record.id, record.clone());
        Ok(record)
    }

    fn save(&mut self, record: &InvoiceRecord) -> Result<()> {
        match self.records.get_mut(&record.id) {
            Some(slot) => {
                *slot = record.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(record.id)),
        }
    }

    fn remove(&mut self, id: RecordId) -> Result<InvoiceRecord> {
        self.records.remove(&id).ok_or(StoreError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(title: &str) -> InvoiceRecord {
        let now = Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap();
        InvoiceRecord::new(title, format!("pdfs/{}.pdf", title), now)
    }

    #[test]
    fn test_insert_assigns_ids() {
        let mut store = MemoryStore::new();
        let a = store.insert(record("a")).unwrap();
        let b = store.insert(record("b")).unwrap();
        assert_eq!(a.id, RecordId(1));
        assert_eq!(b.id, RecordId(2));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_ids_not_reused_after_remove() {
        let mut store = MemoryStore::new();
        let a = store.insert(record("a")).unwrap();
        store.remove(a.id).unwrap();
        let b = store.insert(record("b")).unwrap();
        assert_eq!(b.id, RecordId(2));
    }

    #[test]
    fn test_save_requires_existing_record() {
        let mut store = MemoryStore::new();
        let mut ghost = record("ghost");
        ghost.id = RecordId(9);
        assert!(matches!(store.save(&ghost), Err(StoreError::NotFound(RecordId(9)))));
        assert!(matches!(store.get(RecordId(9)), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_from_records_continues_numbering() {
        let mut existing = record("a");
        existing.id = RecordId(7);
        let mut store = MemoryStore::from_records(vec![existing]);
        let next = store.insert(record("b")).unwrap();
        assert_eq!(next.id, RecordId(8));
    }

    #[test]
    fn test_with_next_id_keeps_high_water_mark() {
        let mut existing = record("a");
        existing.id = RecordId(3);

        let store = MemoryStore::with_next_id(vec![existing.clone()], 6);
        assert_eq!(store.next_id(), RecordId(6));

        // A stale mark never goes below the records present.
        let store = MemoryStore::with_next_id(vec![existing], 2);
        assert_eq!(store.next_id(), RecordId(4));
    }
}
