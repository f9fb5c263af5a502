//! Money coercion for Latin-American formatted amounts.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Coerce a matched amount such as `"$ 1.234.567"` or `"12.345,67"`.
///
/// A period followed by exactly three digits and then a non-digit (or the
/// end) is a thousands separator and is dropped; the first remaining comma
/// is the decimal separator. This means `"12.500"` reads as 12500 even when
/// the document meant twelve and a half.
pub fn coerce_money(input: Option<&str>) -> Option<Decimal> {
    let input = input?;
    if input.is_empty() {
        return None;
    }

    let cleaned: Vec<char> = input
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();

    let mut kept = String::with_capacity(cleaned.len());
    for (i, c) in cleaned.iter().enumerate() {
        if *c == '.' && is_thousands_separator(&cleaned[i + 1..]) {
            continue;
        }
        kept.push(*c);
    }

    parse_decimal(&kept.replacen(',', ".", 1))
}

fn is_thousands_separator(rest: &[char]) -> bool {
    rest.len() >= 3
        && rest[..3].iter().all(|c| c.is_ascii_digit())
        && !matches!(rest.get(3), Some(c) if c.is_ascii_digit())
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let mut s = s.to_string();

    // "1234." and ".5" are accepted number forms
    if s.matches('.').count() == 1 {
        if s.ends_with('.') {
            s.pop();
        }
        if s.starts_with('.') {
            s.insert(0, '0');
        } else if s.starts_with("-.") {
            s.insert(1, '0');
        }
    }

    if s.is_empty() || s == "-" {
        return None;
    }

    Decimal::from_str(&s).ok()
}

/// Format an amount as Chilean pesos (`$1.234.567`, no decimals).
pub fn format_clp(amount: Decimal) -> String {
    let rounded = amount
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i128()
        .unwrap_or_default();

    let digits = rounded.unsigned_abs().to_string();
    let chars: Vec<char> = digits.chars().collect();
    let mut grouped = String::new();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*c);
    }

    if rounded < 0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

/// Format an optional amount, using a dash when it is absent.
pub fn format_optional_clp(amount: Option<Decimal>) -> String {
    amount.map(format_clp).unwrap_or_else(|| "—".to_string())
}
