//! Declarative pattern table for invoice field extraction.
//!
//! Each semantic field owns an ordered list of rules. Tuning the heuristics
//! means editing [`FIELD_RULES`], not the engine.

use lazy_static::lazy_static;
use regex::Regex;

/// Semantic invoice field targeted by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Provider,
    Folio,
    IssueDate,
    NetAmount,
    TaxAmount,
    TotalAmount,
}

impl Field {
    /// Every field, in output order.
    pub const ALL: [Field; 6] = [
        Field::Provider,
        Field::Folio,
        Field::IssueDate,
        Field::NetAmount,
        Field::TaxAmount,
        Field::TotalAmount,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::Provider => "provider",
            Field::Folio => "folio",
            Field::IssueDate => "issue_date",
            Field::NetAmount => "net_amount",
            Field::TaxAmount => "tax_amount",
            Field::TotalAmount => "total_amount",
        }
    }
}

/// Which occurrence of a pattern supplies the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Earliest occurrence in the document.
    First,
    /// Final occurrence in the document. Line-item tables repeat
    /// summary-like tokens before the authoritative totals block.
    Last,
}

/// One extraction rule: capture group 1 of `pattern` is the raw value.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: Field,
    pub mode: MatchMode,
    pub pattern: Regex,
}

impl FieldRule {
    pub fn new(field: Field, mode: MatchMode, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            field,
            mode,
            pattern: Regex::new(pattern)?,
        })
    }
}

fn rule(field: Field, mode: MatchMode, pattern: &str) -> FieldRule {
    FieldRule::new(field, mode, pattern).unwrap()
}

lazy_static! {
    /// Built-in rules, in priority order within each field.
    pub static ref FIELD_RULES: Vec<FieldRule> = vec![
        // Issuer name right before the tax-id marker
        rule(Field::Provider, MatchMode::First,
            r"(?i)([A-ZÁÉÍÓÚÑ0-9.\-& ]{3,})\s+R\.?U\.?T\.?"),
        rule(Field::Provider, MatchMode::First,
            r"(?i)([A-ZÁÉÍÓÚÑ0-9.\-& ]{3,})\s+FACTURA\s+ELECTR[OÓ]NICA"),
        rule(Field::Provider, MatchMode::First,
            r"(?i)(?:raz[oó]n\s+social|emisor|proveedor)\s*[:\-]\s*([^\n]+)"),

        rule(Field::Folio, MatchMode::First,
            r"(?i)FACTURA\s+ELECTR[OÓ]NICA\s*(?:N[°º#]\s*|No\.?\s*)?([0-9]{1,10})"),
        rule(Field::Folio, MatchMode::First,
            r"(?i)\bN[°º#]\s*([0-9]{1,10})\b"),
        rule(Field::Folio, MatchMode::First,
            r"(?i)\bNo\.?\s*([0-9]{1,10})\b"),

        rule(Field::IssueDate, MatchMode::First,
            r"(?i)Fecha\s*Emisi[oó]n\s*[:\-]\s*([^\n]+)"),
        rule(Field::IssueDate, MatchMode::First,
            r"(?i)\bEmisi[oó]n\s*[:\-]\s*([^\n]+)"),
        rule(Field::IssueDate, MatchMode::First,
            r"(?i)Fecha\s*[:\-]\s*([^\n]+)"),

        rule(Field::NetAmount, MatchMode::Last,
            r"(?i)MONTO\s+NETO\s*[$:]?\s*([0-9.,]+)"),
        rule(Field::NetAmount, MatchMode::Last,
            r"(?i)\bNETO\s*[$:]?\s*([0-9.,]+)"),
        rule(Field::NetAmount, MatchMode::Last,
            r"(?i)\bSUBTOTAL\s*[$:]?\s*([0-9.,]+)"),

        rule(Field::TaxAmount, MatchMode::Last,
            r"(?i)I\.?V\.?A\.?(?:\s*\d{1,2}%)?\s*[$:]?\s*([0-9.,]+)"),
        rule(Field::TaxAmount, MatchMode::Last,
            r"(?i)IMPUESTO\s*(?:ADICIONAL|IVA)\s*[$:]?\s*([0-9.,]+)"),

        rule(Field::TotalAmount, MatchMode::Last,
            r"(?i)TOTAL\s*(?:FACTURA|A\s*PAGAR|GENERAL)?\s*[$:]?\s*([0-9.,]+)"),
        rule(Field::TotalAmount, MatchMode::Last,
            r"(?i)MONTO\s*TOTAL\s*[$:]?\s*([0-9.,]+)"),
    ];

    // Date coercion
    pub static ref DATE_VERBAL: Regex = Regex::new(
        r"(?i)(\d{1,2})\s+de\s+([A-Za-zÁÉÍÓÚáéíóúÑñ]+)\s+(?:del?\s+)?(\d{4})"
    ).unwrap();

    pub static ref DATE_NUMERIC: Regex = Regex::new(
        r"(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4}|\d{2})"
    ).unwrap();

    // Text normalization
    pub static ref HORIZONTAL_SPACE: Regex = Regex::new(r"[ \t]+").unwrap();

    pub static ref BLANK_LINES: Regex = Regex::new(r"\n{2,}").unwrap();
}
