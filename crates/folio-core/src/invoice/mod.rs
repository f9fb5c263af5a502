//! Invoice field extraction module.

mod normalize;
mod parser;
pub mod rules;

pub use normalize::normalize;
pub use parser::{ExtractionResult, InvoiceParser, RuleBasedParser};

use crate::models::invoice::ExtractedInvoiceFields;

/// Trait for invoice field extractors.
///
/// Extraction is total: a field that cannot be recovered is `None`, and no
/// input makes the whole extraction fail.
pub trait InvoiceExtractor {
    /// Extract invoice fields from normalized text.
    fn extract(&self, text: &str) -> ExtractedInvoiceFields;
}
