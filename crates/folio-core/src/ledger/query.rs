//! Record filtering, sorting and status counts.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use super::folders::resolve_folder_key;
use crate::models::invoice::{InvoiceRecord, PaymentStatus};

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// First instant of the month.
    pub fn start(&self) -> DateTime<Utc> {
        self.first_day().and_time(chrono::NaiveTime::MIN).and_utc()
    }

    /// Last millisecond of the month.
    pub fn end(&self) -> DateTime<Utc> {
        let next = if self.month == 12 {
            NaiveDate::from_ymd_opt(self.year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
        };
        match next {
            Some(next) => next.and_time(chrono::NaiveTime::MIN).and_utc() - Duration::milliseconds(1),
            None => DateTime::<Utc>::MAX_UTC,
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Error returned for a month that is not `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid month '{0}', expected YYYY-MM")]
pub struct ParseYearMonthError(String);

impl FromStr for YearMonth {
    type Err = ParseYearMonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseYearMonthError(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(err)?;
        if year.len() != 4 || month.is_empty() || month.len() > 2 {
            return Err(err());
        }
        let year: i32 = year.parse().map_err(|_| err())?;
        let month: u32 = month.parse().map_err(|_| err())?;
        Self::new(year, month).ok_or_else(err)
    }
}

/// Error returned for an unknown listing order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sort order '{0}', expected date-desc, date-asc, amount-desc or amount-asc")]
pub struct ParseSortOrderError(String);

/// Listing order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Newest upload first.
    #[default]
    DateDesc,
    DateAsc,
    /// Largest total first; an absent total sorts as zero.
    AmountDesc,
    AmountAsc,
}

impl FromStr for SortOrder {
    type Err = ParseSortOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "date-desc" | "fecha-desc" => Ok(SortOrder::DateDesc),
            "date-asc" | "fecha-asc" => Ok(SortOrder::DateAsc),
            "amount-desc" | "monto-desc" => Ok(SortOrder::AmountDesc),
            "amount-asc" | "monto-asc" => Ok(SortOrder::AmountAsc),
            _ => Err(ParseSortOrderError(s.to_string())),
        }
    }
}

/// Filters and order for a record listing. All filters are optional.
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
    /// Only records whose folder key equals this.
    pub folder: Option<String>,
    pub status: Option<PaymentStatus>,
    /// Case-insensitive substring of title, folio or provider.
    pub search: Option<String>,
    /// Inclusive lower bound on the upload month.
    pub month_from: Option<YearMonth>,
    /// Inclusive upper bound on the upload month.
    pub month_to: Option<YearMonth>,
    pub sort: SortOrder,
}

impl RecordQuery {
    pub fn matches(&self, record: &InvoiceRecord) -> bool {
        if let Some(folder) = &self.folder {
            if &resolve_folder_key(record) != folder {
                return false;
            }
        }

        if let Some(status) = self.status {
            if record.payment_status != status {
                return false;
            }
        }

        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let term = term.to_lowercase();
            let hit = [
                Some(record.title.as_str()),
                record.fields.folio.as_deref(),
                record.fields.provider.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|value| value.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }

        if let Some(from) = self.month_from {
            if record.created_at < from.start() {
                return false;
            }
        }
        if let Some(to) = self.month_to {
            if record.created_at > to.end() {
                return false;
            }
        }

        true
    }

    /// Matching records in the requested order.
    pub fn apply(&self, records: &[InvoiceRecord]) -> Vec<InvoiceRecord> {
        let mut out: Vec<InvoiceRecord> = records.iter().filter(|r| self.matches(r)).cloned().collect();
        sort_records(&mut out, self.sort);
        out
    }
}

/// Sort in place. Ties keep their relative order.
pub fn sort_records(records: &mut [InvoiceRecord], order: SortOrder) {
    let amount = |r: &InvoiceRecord| r.fields.total_amount.unwrap_or_default();
    match order {
        SortOrder::DateDesc => records.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::DateAsc => records.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortOrder::AmountDesc => records.sort_by(|a, b| amount(b).cmp(&amount(a))),
        SortOrder::AmountAsc => records.sort_by(|a, b| amount(a).cmp(&amount(b))),
    }
}

/// Document count, total amount and counts per payment status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub documents: usize,
    pub total: Decimal,
    pub paid: usize,
    pub pending: usize,
    pub overdue: usize,
    pub void: usize,
}

impl StatusSummary {
    pub fn of(records: &[InvoiceRecord]) -> Self {
        let mut summary = Self::default();
        for record in records {
            summary.documents += 1;
            summary.total += record.fields.total_amount.unwrap_or_default();
            match record.payment_status {
                PaymentStatus::Paid => summary.paid += 1,
                PaymentStatus::Pending => summary.pending += 1,
                PaymentStatus::Overdue => summary.overdue += 1,
                PaymentStatus::Void => summary.void += 1,
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::invoice::RecordId;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn record(id: u64, title: &str, created: DateTime<Utc>, total: Option<i64>) -> InvoiceRecord {
        let mut r = InvoiceRecord::new(title, "pdfs/x.pdf", created);
        r.id = RecordId(id);
        r.fields.total_amount = total.map(Decimal::from);
        r
    }

    fn ids(records: &[InvoiceRecord]) -> Vec<u64> {
        records.iter().map(|r| r.id.0).collect()
    }

    fn sample() -> Vec<InvoiceRecord> {
        let mut a = record(1, "Luz agosto", Utc.with_ymd_and_hms(2024, 8, 31, 23, 59, 59).unwrap(), Some(300));
        a.fields.provider = Some("ENEL DISTRIBUCION".to_string());
        let mut b = record(2, "Agua", Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap(), None);
        b.fields.folio = Some("998877".to_string());
        b.payment_status = PaymentStatus::Paid;
        let c = record(3, "Luz septiembre", Utc.with_ymd_and_hms(2024, 9, 30, 12, 0, 0).unwrap(), Some(100));
        let d = record(4, "Gas", Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap(), Some(200));
        vec![a, b, c, d]
    }

    #[test]
    fn test_year_month_parsing() {
        assert_eq!("2024-09".parse::<YearMonth>(), Ok(YearMonth { year: 2024, month: 9 }));
        assert!("2024-13".parse::<YearMonth>().is_err());
        assert!("24-09".parse::<YearMonth>().is_err());
        assert!("septiembre".parse::<YearMonth>().is_err());

        let err = "2024-13".parse::<YearMonth>().unwrap_err();
        assert_eq!(err.to_string(), "invalid month '2024-13', expected YYYY-MM");
    }

    #[test]
    fn test_year_month_bounds() {
        let feb = YearMonth::new(2024, 2).unwrap();
        assert_eq!(feb.start(), Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(
            feb.end(),
            Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap() + Duration::milliseconds(999)
        );
        let dec = YearMonth::new(2024, 12).unwrap();
        assert_eq!(dec.end(), Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() - Duration::milliseconds(1));
        assert_eq!(dec.to_string(), "2024-12");
    }

    #[test]
    fn test_month_range_is_inclusive() {
        let query = RecordQuery {
            month_from: Some(YearMonth::new(2024, 9).unwrap()),
            month_to: Some(YearMonth::new(2024, 9).unwrap()),
            sort: SortOrder::DateAsc,
            ..Default::default()
        };
        assert_eq!(ids(&query.apply(&sample())), vec![2, 3]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let records = sample();
        let by_provider = RecordQuery {
            search: Some("enel".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&by_provider.apply(&records)), vec![1]);

        let by_folio = RecordQuery {
            search: Some(" 9988 ".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&by_folio.apply(&records)), vec![2]);

        let by_title = RecordQuery {
            search: Some("LUZ".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&by_title.apply(&records)), vec![3, 1]);
    }

    #[test]
    fn test_status_and_folder_filters() {
        let records = sample();
        let paid = RecordQuery {
            status: Some(PaymentStatus::Paid),
            ..Default::default()
        };
        assert_eq!(ids(&paid.apply(&records)), vec![2]);

        let gas = RecordQuery {
            folder: Some("GAS".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&gas.apply(&records)), vec![4]);
    }

    #[test]
    fn test_sort_orders() {
        let mut records = sample();
        sort_records(&mut records, SortOrder::AmountDesc);
        assert_eq!(ids(&records), vec![1, 4, 3, 2]);
        sort_records(&mut records, SortOrder::AmountAsc);
        assert_eq!(ids(&records), vec![2, 3, 4, 1]);
        sort_records(&mut records, SortOrder::DateDesc);
        assert_eq!(ids(&records), vec![4, 3, 2, 1]);
        assert_eq!("monto-desc".parse::<SortOrder>(), Ok(SortOrder::AmountDesc));
        assert_eq!(
            "size".parse::<SortOrder>(),
            Err(ParseSortOrderError("size".to_string()))
        );
        let err: Box<dyn std::error::Error + Send + Sync> = Box::new(ParseSortOrderError("size".to_string()));
        assert!(err.to_string().starts_with("unknown sort order 'size'"));
    }

    #[test]
    fn test_status_summary() {
        let summary = StatusSummary::of(&sample());
        assert_eq!(
            summary,
            StatusSummary {
                documents: 4,
                total: Decimal::from(600),
                paid: 1,
                pending: 3,
                overdue: 0,
                void: 0,
            }
        );
    }
}
