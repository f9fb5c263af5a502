//! Folder grouping and monetary aggregates.
//!
//! Folders are never stored. They are derived from the record set on every
//! call, keyed by [`resolve_folder_key`].

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::invoice::{InvoiceRecord, RecordId};

/// Key used when a record has neither folder, title nor provider.
pub const UNNAMED_FOLDER: &str = "SIN NOMBRE";

/// Canonical folder key of a record. Never empty.
///
/// An explicit folder name is used verbatim. Otherwise the title, then the
/// provider, upper-cased with whitespace runs collapsed.
pub fn resolve_folder_key(record: &InvoiceRecord) -> String {
    if let Some(name) = record.folder_name.as_deref() {
        if !name.trim().is_empty() {
            return name.to_string();
        }
    }

    [Some(record.title.as_str()), record.fields.provider.as_deref()]
        .into_iter()
        .flatten()
        .map(canonical_name)
        .find(|key| !key.is_empty())
        .unwrap_or_else(|| UNNAMED_FOLDER.to_string())
}

fn canonical_name(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Monetary sums over a set of records. Absent amounts count as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub count: usize,
    pub net: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl Totals {
    pub fn add(&mut self, record: &InvoiceRecord) {
        self.count += 1;
        self.net += record.fields.net_amount.unwrap_or_default();
        self.tax += record.fields.tax_amount.unwrap_or_default();
        self.total += record.fields.total_amount.unwrap_or_default();
    }

    pub fn of<'a>(records: impl IntoIterator<Item = &'a InvoiceRecord>) -> Self {
        let mut totals = Self::default();
        for record in records {
            totals.add(record);
        }
        totals
    }
}

/// A derived folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Folder {
    pub key: String,
    #[serde(flatten)]
    pub totals: Totals,
    /// Most recent `created_at` among the folder's records.
    pub latest_created_at: DateTime<Utc>,
}

/// Group records into folders, most recently active first, then by key.
pub fn aggregate(records: &[InvoiceRecord]) -> Vec<Folder> {
    let mut groups: BTreeMap<String, Folder> = BTreeMap::new();

    for record in records {
        let key = resolve_folder_key(record);
        let folder = groups.entry(key.clone()).or_insert_with(|| Folder {
            key,
            totals: Totals::default(),
            latest_created_at: record.created_at,
        });
        folder.totals.add(record);
        if record.created_at > folder.latest_created_at {
            folder.latest_created_at = record.created_at;
        }
    }

    let mut folders: Vec<Folder> = groups.into_values().collect();
    folders.sort_by(|a, b| {
        b.latest_created_at
            .cmp(&a.latest_created_at)
            .then_with(|| a.key.cmp(&b.key))
    });
    folders
}

/// Totals for a view, with the selection taking over when it has members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Aggregate {
    #[serde(flatten)]
    pub totals: Totals,
    /// True when the totals cover the selection rather than the whole view.
    pub from_selection: bool,
}

/// Totals of `records`, or of the selected subset of them when any selected
/// identifier is present in `records`.
///
/// Identifiers in `selection` that are not part of `records` are ignored.
pub fn recompute(records: &[InvoiceRecord], selection: &HashSet<RecordId>) -> Aggregate {
    let selected: Vec<&InvoiceRecord> = records
        .iter()
        .filter(|r| selection.contains(&r.id))
        .collect();

    if selected.is_empty() {
        Aggregate {
            totals: Totals::of(records),
            from_selection: false,
        }
    } else {
        Aggregate {
            totals: Totals::of(selected),
            from_selection: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap()
    }

    fn record(id: u64, title: &str, total: Option<i64>, age_days: i64) -> InvoiceRecord {
        let mut r = InvoiceRecord::new(title, "pdfs/x.pdf", base_time() - Duration::days(age_days));
        r.id = RecordId(id);
        r.fields.total_amount = total.map(Decimal::from);
        r
    }

    #[test]
    fn test_folder_key_precedence() {
        let mut r = record(1, "  luz   enel ", None, 0);
        assert_eq!(resolve_folder_key(&r), "LUZ ENEL");

        r.folder_name = Some("Servicios básicos".to_string());
        assert_eq!(resolve_folder_key(&r), "Servicios básicos");

        r.folder_name = Some("   ".to_string());
        assert_eq!(resolve_folder_key(&r), "LUZ ENEL");
    }

    #[test]
    fn test_folder_key_falls_back_to_provider_then_sentinel() {
        let mut r = record(1, "   ", None, 0);
        assert_eq!(resolve_folder_key(&r), UNNAMED_FOLDER);

        r.fields.provider = Some("Aguas  Andinas".to_string());
        assert_eq!(resolve_folder_key(&r), "AGUAS ANDINAS");
    }

    #[test]
    fn test_aggregate_groups_and_orders() {
        let mut a = record(1, "luz", Some(1000), 10);
        a.fields.net_amount = Some(Decimal::from(840));
        a.fields.tax_amount = Some(Decimal::from(160));
        let b = record(2, "LUZ", None, 2);
        let c = record(3, "agua", Some(500), 5);
        let d = record(4, "gas", Some(1), 2);

        let folders = aggregate(&[a, b, c, d]);
        let keys: Vec<&str> = folders.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["GAS", "LUZ", "AGUA"]);

        let luz = &folders[1];
        assert_eq!(
            luz.totals,
            Totals {
                count: 2,
                net: Decimal::from(840),
                tax: Decimal::from(160),
                total: Decimal::from(1000),
            }
        );
        assert_eq!(luz.latest_created_at, base_time() - Duration::days(2));
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate(&[]).is_empty());
    }

    #[test]
    fn test_recompute_selection_overrides() {
        let records = vec![
            record(1, "luz", Some(100), 0),
            record(2, "luz", Some(200), 0),
            record(3, "luz", Some(300), 0),
        ];

        let all = recompute(&records, &HashSet::new());
        assert_eq!(all.totals.total, Decimal::from(600));
        assert!(!all.from_selection);

        let selection: HashSet<RecordId> = [RecordId(1), RecordId(3)].into_iter().collect();
        let selected = recompute(&records, &selection);
        assert_eq!(selected.totals.total, Decimal::from(400));
        assert_eq!(selected.totals.count, 2);
        assert!(selected.from_selection);
    }

    #[test]
    fn test_recompute_ignores_foreign_selection() {
        let records = vec![record(1, "luz", Some(100), 0)];
        let selection: HashSet<RecordId> = [RecordId(99)].into_iter().collect();
        let aggregate = recompute(&records, &selection);
        assert_eq!(aggregate.totals.total, Decimal::from(100));
        assert!(!aggregate.from_selection);
    }
}
