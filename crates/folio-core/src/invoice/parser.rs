//! Rule-driven invoice field extraction.

use std::time::Instant;

use tracing::{debug, trace};

use crate::models::invoice::ExtractedInvoiceFields;

use super::normalize::normalize;
use super::rules::{coerce_date, coerce_money, find_field, Field, FieldRule, FIELD_RULES};
use super::InvoiceExtractor;

/// Result of parsing one document.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Recovered fields.
    pub fields: ExtractedInvoiceFields,
    /// Normalized text the rules ran against.
    pub normalized_text: String,
    /// Fields that could not be recovered.
    pub missing: Vec<&'static str>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Trait for invoice parsing from raw document text.
pub trait InvoiceParser {
    /// Normalize `raw` and extract fields from it.
    fn parse(&self, raw: &str) -> ExtractionResult;
}

/// Field extraction engine over an ordered rule table.
#[derive(Debug, Clone)]
pub struct RuleBasedParser {
    rules: Vec<FieldRule>,
}

impl RuleBasedParser {
    /// Create a parser using the built-in rule table.
    pub fn new() -> Self {
        Self {
            rules: FIELD_RULES.clone(),
        }
    }

    /// Replace the rule table.
    pub fn with_rules(mut self, rules: Vec<FieldRule>) -> Self {
        self.rules = rules;
        self
    }

    fn text_field(&self, field: Field, text: &str) -> Option<String> {
        find_field(&self.rules, field, text).map(|m| {
            trace!("{} matched by rule {}: {:?}", field.name(), m.rule_index, m.value);
            m.value
        })
    }
}

impl Default for RuleBasedParser {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceExtractor for RuleBasedParser {
    fn extract(&self, text: &str) -> ExtractedInvoiceFields {
        let issue_date_raw = self.text_field(Field::IssueDate, text);
        let net_raw = self.text_field(Field::NetAmount, text);
        let tax_raw = self.text_field(Field::TaxAmount, text);
        let total_raw = self.text_field(Field::TotalAmount, text);

        ExtractedInvoiceFields {
            provider: self.text_field(Field::Provider, text),
            folio: self.text_field(Field::Folio, text),
            issue_date: coerce_date(issue_date_raw.as_deref()),
            net_amount: coerce_money(net_raw.as_deref()),
            tax_amount: coerce_money(tax_raw.as_deref()),
            total_amount: coerce_money(total_raw.as_deref()),
        }
    }
}

impl InvoiceParser for RuleBasedParser {
    fn parse(&self, raw: &str) -> ExtractionResult {
        let start = Instant::now();
        let normalized_text = normalize(raw);

        let fields = self.extract(&normalized_text);
        let missing = fields.missing_fields();

        debug!(
            "Extracted {} of {} fields from {} characters",
            Field::ALL.len() - missing.len(),
            Field::ALL.len(),
            normalized_text.len()
        );

        ExtractionResult {
            fields,
            normalized_text,
            missing,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    const SAMPLE: &str = r#"
        COMERCIAL LOS ANDES LTDA   R.U.T.: 76.123.456-7
        FACTURA ELECTRONICA N° 004512
        Fecha Emisión: 11 de septiembre del 2024

        Detalle            Cant.   Total
        Flete Santiago     1       TOTAL 150.000
        Flete Valparaíso   1       TOTAL 200.000

        MONTO NETO $ 350.000
        I.V.A. 19% $ 66.500
        TOTAL $ 416.500
    "#;

    #[test]
    fn test_parse_full_invoice() {
        let parser = RuleBasedParser::new();
        let result = parser.parse(SAMPLE);

        assert_eq!(
            result.fields,
            ExtractedInvoiceFields {
                provider: Some("COMERCIAL LOS ANDES LTDA".to_string()),
                folio: Some("004512".to_string()),
                issue_date: NaiveDate::from_ymd_opt(2024, 9, 11),
                net_amount: Some(Decimal::from(350_000)),
                tax_amount: Some(Decimal::from(66_500)),
                total_amount: Some(Decimal::from(416_500)),
            }
        );
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_last_total_wins() {
        let parser = RuleBasedParser::new();
        let fields = parser.extract("TOTAL 500\nDetalle\nTOTAL 12345");
        assert_eq!(fields.total_amount, Some(Decimal::from(12_345)));
    }

    #[test]
    fn test_partial_extraction() {
        let parser = RuleBasedParser::new();
        let result = parser.parse("TOTAL $10.000");

        assert_eq!(result.fields.total_amount, Some(Decimal::from(10_000)));
        assert_eq!(result.fields.provider, None);
        assert_eq!(result.fields.folio, None);
        assert_eq!(result.fields.issue_date, None);
        assert_eq!(result.fields.net_amount, None);
        assert_eq!(result.fields.tax_amount, None);
        assert_eq!(result.missing.len(), 5);
    }

    #[test]
    fn test_unparseable_date_is_absent() {
        let parser = RuleBasedParser::new();
        let fields = parser.extract("Fecha Emisión: pendiente\nFolio N° 77");

        assert_eq!(fields.issue_date, None);
        assert_eq!(fields.folio.as_deref(), Some("77"));
    }

    #[test]
    fn test_no_structure_yields_empty_fields() {
        let parser = RuleBasedParser::new();
        for text in ["", "hola mundo", "€€€ ### \n\n ...", "TOTAL ,,,"] {
            assert_eq!(parser.parse(text).fields, ExtractedInvoiceFields::default());
        }
    }

    #[test]
    fn test_subtotal_used_for_net_when_no_neto_label() {
        let parser = RuleBasedParser::new();
        let fields = parser.extract("SUBTOTAL: 1.000\nIMPUESTO IVA 190");
        assert_eq!(fields.net_amount, Some(Decimal::from(1_000)));
        assert_eq!(fields.tax_amount, Some(Decimal::from(190)));
    }
}
