//! Invoice data models for the ledger.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::expiration::Tier;

/// Fields recovered from the text of an invoice document.
///
/// Every field is independently optional. `None` means the value could not
/// be recovered, never zero or an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedInvoiceFields {
    /// Issuer name as printed on the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Document sequence number (digits only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folio: Option<String>,

    /// Date the document was issued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<NaiveDate>,

    /// Amount before tax.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_amount: Option<Decimal>,

    /// Tax amount (IVA).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_amount: Option<Decimal>,

    /// Amount payable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<Decimal>,
}

impl ExtractedInvoiceFields {
    /// True when at least one field was recovered.
    pub fn any_present(&self) -> bool {
        self.provider.is_some()
            || self.folio.is_some()
            || self.issue_date.is_some()
            || self.net_amount.is_some()
            || self.tax_amount.is_some()
            || self.total_amount.is_some()
    }

    /// Names of the fields that could not be recovered.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.provider.is_none() {
            missing.push("provider");
        }
        if self.folio.is_none() {
            missing.push("folio");
        }
        if self.issue_date.is_none() {
            missing.push("issue_date");
        }
        if self.net_amount.is_none() {
            missing.push("net_amount");
        }
        if self.tax_amount.is_none() {
            missing.push("tax_amount");
        }
        if self.total_amount.is_none() {
            missing.push("total_amount");
        }
        missing
    }
}

/// Identifier assigned to a record by its store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(RecordId)
    }
}

/// Payment state of an invoice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Paid (pagada).
    Paid,
    /// Awaiting payment (pendiente).
    #[default]
    Pending,
    /// Cancelled (anulada).
    Void,
    /// Marked overdue (vencida).
    Overdue,
}

/// Error returned for an unknown payment status label.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown payment status '{0}', expected paid, pending, void or overdue")]
pub struct ParsePaymentStatusError(String);

/// Accepts English or Spanish labels, case-insensitive.
impl FromStr for PaymentStatus {
    type Err = ParsePaymentStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "paid" | "pagada" => Ok(PaymentStatus::Paid),
            "pending" | "pendiente" => Ok(PaymentStatus::Pending),
            "void" | "anulada" => Ok(PaymentStatus::Void),
            "overdue" | "vencida" => Ok(PaymentStatus::Overdue),
            _ => Err(ParsePaymentStatusError(s.to_string())),
        }
    }
}

impl PaymentStatus {
    /// Spanish label shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "pagada",
            PaymentStatus::Pending => "pendiente",
            PaymentStatus::Void => "anulada",
            PaymentStatus::Overdue => "vencida",
        }
    }
}

/// Processing state of the uploaded document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    /// Stored, nothing recovered from the text.
    #[default]
    Uploaded,
    /// At least one field recovered.
    Parsed,
    /// Fields confirmed by a user.
    Validated,
    /// Document rejected by a user.
    Rejected,
}

/// A persisted invoice in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Store-assigned identifier.
    pub id: RecordId,

    /// Visible title given at upload.
    pub title: String,

    /// Locator of the stored PDF, owned by the blob store.
    pub locator: String,

    /// Address of the uploader, used as the reminder recipient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_by: Option<String>,

    /// Explicit folder assignment.
    #[serde(default)]
    pub folder_name: Option<String>,

    #[serde(default)]
    pub payment_status: PaymentStatus,

    #[serde(default)]
    pub processing_status: ProcessingStatus,

    /// Fields recovered from the document text.
    #[serde(flatten)]
    pub fields: ExtractedInvoiceFields,

    /// Payment due instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,

    /// Most urgent tier already notified for the current due date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_notified_tier: Option<Tier>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InvoiceRecord {
    /// Create a pending record stamped with `now`.
    ///
    /// The identifier is a placeholder until the record is inserted.
    pub fn new(title: impl Into<String>, locator: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: RecordId::default(),
            title: title.into(),
            locator: locator.into(),
            uploaded_by: None,
            folder_name: None,
            payment_status: PaymentStatus::Pending,
            processing_status: ProcessingStatus::Uploaded,
            fields: ExtractedInvoiceFields::default(),
            due_at: None,
            last_notified_tier: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach extracted fields and derive the processing status from them.
    pub fn with_fields(mut self, fields: ExtractedInvoiceFields) -> Self {
        self.processing_status = if fields.any_present() {
            ProcessingStatus::Parsed
        } else {
            ProcessingStatus::Uploaded
        };
        self.fields = fields;
        self
    }

    /// True when the sweep should look at this record.
    pub fn awaits_payment(&self) -> bool {
        self.payment_status != PaymentStatus::Paid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_payment_status_parsing() {
        assert_eq!("pagada".parse::<PaymentStatus>(), Ok(PaymentStatus::Paid));
        assert_eq!("PENDING".parse::<PaymentStatus>(), Ok(PaymentStatus::Pending));
        assert_eq!("anulada".parse::<PaymentStatus>(), Ok(PaymentStatus::Void));
        assert_eq!(" vencida ".parse::<PaymentStatus>(), Ok(PaymentStatus::Overdue));

        let err = "otra".parse::<PaymentStatus>().unwrap_err();
        assert_eq!(err, ParsePaymentStatusError("otra".to_string()));
        assert_eq!(
            err.to_string(),
            "unknown payment status 'otra', expected paid, pending, void or overdue"
        );
    }

    #[test]
    fn test_processing_status_follows_fields() {
        let now = Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap();

        let empty = InvoiceRecord::new("Luz", "pdfs/luz.pdf", now)
            .with_fields(ExtractedInvoiceFields::default());
        assert_eq!(empty.processing_status, ProcessingStatus::Uploaded);

        let parsed = InvoiceRecord::new("Luz", "pdfs/luz.pdf", now).with_fields(ExtractedInvoiceFields {
            folio: Some("123".to_string()),
            ..Default::default()
        });
        assert_eq!(parsed.processing_status, ProcessingStatus::Parsed);
    }

    #[test]
    fn test_record_serializes_flat_fields() {
        let now = Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap();
        let record = InvoiceRecord::new("Agua", "pdfs/agua.pdf", now).with_fields(ExtractedInvoiceFields {
            provider: Some("AGUAS ANDINAS".to_string()),
            ..Default::default()
        });

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["provider"], "AGUAS ANDINAS");
        assert_eq!(json["payment_status"], "pending");

        let back: InvoiceRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_missing_fields() {
        let fields = ExtractedInvoiceFields {
            total_amount: Some(Decimal::from(10_000)),
            ..Default::default()
        };
        assert_eq!(
            fields.missing_fields(),
            vec!["provider", "folio", "issue_date", "net_amount", "tax_amount"]
        );
    }
}
