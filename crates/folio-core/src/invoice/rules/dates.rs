//! Date coercion for Spanish-language invoices.

use chrono::{Datelike, NaiveDate, Weekday};

use super::patterns::{DATE_NUMERIC, DATE_VERBAL};

/// Coerce a matched date string.
///
/// Tries the verbal form (`"11 de septiembre del 2024"`) first, then the
/// numeric day-month-year form (`"11/09/2024"`, `"11-09-24"`). Invalid
/// calendar dates yield `None`, never a clamped date.
pub fn coerce_date(input: Option<&str>) -> Option<NaiveDate> {
    let input = input?;
    verbal_date(input).or_else(|| numeric_date(input))
}

fn verbal_date(s: &str) -> Option<NaiveDate> {
    let caps = DATE_VERBAL.captures(s)?;
    let day: u32 = caps[1].parse().ok()?;
    let month = spanish_month_to_number(&caps[2])?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn numeric_date(s: &str) -> Option<NaiveDate> {
    let caps = DATE_NUMERIC.captures(s)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year = parse_year(&caps[3])?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    // Two-digit years are always this century
    Some(if year < 100 { 2000 + year } else { year })
}

/// Month number for a Spanish month name.
pub fn spanish_month_to_number(month: &str) -> Option<u32> {
    match month.to_lowercase().as_str() {
        "enero" => Some(1),
        "febrero" => Some(2),
        "marzo" => Some(3),
        "abril" => Some(4),
        "mayo" => Some(5),
        "junio" => Some(6),
        "julio" => Some(7),
        "agosto" => Some(8),
        "septiembre" | "setiembre" => Some(9),
        "octubre" => Some(10),
        "noviembre" => Some(11),
        "diciembre" => Some(12),
        _ => None,
    }
}

const MONTH_NAMES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "lunes",
        Weekday::Tue => "martes",
        Weekday::Wed => "miércoles",
        Weekday::Thu => "jueves",
        Weekday::Fri => "viernes",
        Weekday::Sat => "sábado",
        Weekday::Sun => "domingo",
    }
}

/// Long Spanish date, e.g. `"miércoles, 11 de septiembre de 2024"`.
pub fn format_long_date(date: NaiveDate) -> String {
    format!(
        "{}, {} de {} de {}",
        weekday_name(date.weekday()),
        date.day(),
        MONTH_NAMES[date.month0() as usize],
        date.year()
    )
}
