//! Rule-based field extraction for Chilean electronic invoices.

pub mod amounts;
pub mod dates;
pub mod patterns;

pub use amounts::{coerce_money, format_clp, format_optional_clp};
pub use dates::{coerce_date, format_long_date, spanish_month_to_number};
pub use patterns::{Field, FieldRule, MatchMode, FIELD_RULES};

/// A raw value located by a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    /// Field the value belongs to.
    pub field: Field,
    /// Trimmed capture text.
    pub value: String,
    /// Byte span of the capture in the source text.
    pub position: (usize, usize),
    /// Index of the winning rule within its field.
    pub rule_index: usize,
}

/// Locate the raw value of `field` using the ordered `rules`.
///
/// Rules for the field are tried in order; the first rule producing a
/// non-empty capture wins. Depending on the rule's [`MatchMode`] the earliest
/// or the final occurrence supplies the value.
pub fn find_field(rules: &[FieldRule], field: Field, text: &str) -> Option<RuleMatch> {
    for (rule_index, rule) in rules.iter().filter(|r| r.field == field).enumerate() {
        let capture = match rule.mode {
            MatchMode::First => rule.pattern.captures(text).and_then(|c| c.get(1)),
            MatchMode::Last => rule
                .pattern
                .captures_iter(text)
                .filter_map(|c| c.get(1))
                .last(),
        };

        if let Some(m) = capture {
            let value = m.as_str().trim();
            if !value.is_empty() {
                return Some(RuleMatch {
                    field,
                    value: value.to_string(),
                    position: (m.start(), m.end()),
                    rule_index,
                });
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_prefers_earlier_rule() {
        let text = "Proveedor: Otra Empresa\nCOMERCIAL LOS ANDES LTDA R.U.T. 76.123.456-7";
        let found = find_field(&FIELD_RULES, Field::Provider, text).unwrap();

        assert_eq!(found.value, "COMERCIAL LOS ANDES LTDA");
        assert_eq!(found.rule_index, 0);
    }

    #[test]
    fn test_last_match_takes_final_occurrence() {
        let text = "TOTAL 500\nitem\nTOTAL 12345";
        let found = find_field(&FIELD_RULES, Field::TotalAmount, text).unwrap();

        assert_eq!(found.value, "12345");
        assert_eq!(&text[found.position.0..found.position.1], "12345");
    }

    #[test]
    fn test_later_rule_used_when_earlier_misses() {
        let text = "Razón Social: Transportes Sur SpA";
        let found = find_field(&FIELD_RULES, Field::Provider, text).unwrap();

        assert_eq!(found.value, "Transportes Sur SpA");
        assert_eq!(found.rule_index, 2);
    }

    #[test]
    fn test_custom_rule_table() {
        let rules = vec![FieldRule::new(Field::Folio, MatchMode::Last, r"DOC-(\d+)").unwrap()];
        let found = find_field(&rules, Field::Folio, "DOC-1 DOC-2").unwrap();
        assert_eq!(found.value, "2");
        assert!(find_field(&rules, Field::Provider, "DOC-1").is_none());
    }
}
