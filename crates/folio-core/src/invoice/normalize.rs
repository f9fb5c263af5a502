//! Whitespace normalization of extracted document text.

use super::rules::patterns::{BLANK_LINES, HORIZONTAL_SPACE};

/// Collapse line noise into a stable form for pattern matching.
///
/// Carriage returns become line breaks, runs of spaces and tabs become a
/// single space, consecutive line breaks become one, and the result is
/// trimmed.
pub fn normalize(raw: &str) -> String {
    let text = raw.replace('\r', "\n");
    let text = HORIZONTAL_SPACE.replace_all(&text, " ");
    let text = BLANK_LINES.replace_all(&text, "\n");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_spaces_and_lines() {
        let raw = "  FACTURA\t\tELECTRONICA\r\n\r\nN°   123 \n\n\nTOTAL  $ 1.000  ";
        assert_eq!(normalize(raw), "FACTURA ELECTRONICA\nN° 123 \nTOTAL $ 1.000");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \r\n\t "), "");
    }

    #[test]
    fn test_normalize_is_stable() {
        let once = normalize("a  b\r\rc\n\n d");
        assert_eq!(normalize(&once), once);
    }
}
