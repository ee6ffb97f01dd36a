//! Normalization of raw currency and percentage tokens.
//!
//! K-1 preparers print negatives three different ways: a leading minus, a
//! parenthesized value, or a trailing dash. All three normalize to a
//! negative float here.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMBEDDED_NUMBER: Regex = Regex::new(r"-?\d+(?:\.\d+)?").unwrap();
}

/// Parse a raw currency token into a signed amount.
///
/// Returns `None` when no digit sequence is recoverable; absence is never
/// coerced to zero.
pub fn parse_amount(raw: &str) -> Option<f64> {
    parse_numeric(raw, '$')
}

/// Parse a raw percentage token into a number. Range checking is the
/// validator's job, not this parser's.
pub fn parse_percent(raw: &str) -> Option<f64> {
    parse_numeric(raw, '%')
}

fn parse_numeric(raw: &str, unit: char) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != unit && *c != ',')
        .collect();
    let mut s = cleaned.trim().to_string();

    let mut negate = false;
    if s.len() >= 2 && s.starts_with('(') && s.ends_with(')') {
        negate = true;
        s = s[1..s.len() - 1].trim().to_string();
    }
    if s.ends_with('-') {
        negate = true;
        s.truncate(s.len() - 1);
        s = s.trim_end().to_string();
    }

    let parsed = s.parse::<f64>().ok().or_else(|| {
        // Salvage the longest embedded numeric substring
        EMBEDDED_NUMBER
            .find_iter(&s)
            .max_by_key(|m| m.as_str().len())
            .and_then(|m| m.as_str().parse::<f64>().ok())
    })?;

    Some(if negate { -parsed.abs() } else { parsed })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_forms() {
        assert_eq!(parse_amount("$1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("(1,234.56)"), Some(-1234.56));
        assert_eq!(parse_amount("1234.56-"), Some(-1234.56));
        assert_eq!(parse_amount("-1234.56"), Some(-1234.56));
    }

    #[test]
    fn test_whole_dollar_values() {
        assert_eq!(parse_amount("50,000"), Some(50000.0));
        assert_eq!(parse_amount(" $500,000 "), Some(500000.0));
        assert_eq!(parse_amount("(9,100)"), Some(-9100.0));
    }

    #[test]
    fn test_not_numeric_is_absent() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("N/A"), None);
        assert_eq!(parse_amount("see statement"), None);
    }

    #[test]
    fn test_embedded_substring_fallback() {
        assert_eq!(parse_amount("approx 1234.56 total"), Some(1234.56));
        // Longest run wins over a shorter earlier one
        assert_eq!(parse_amount("p1 value 50000"), Some(50000.0));
    }

    #[test]
    fn test_percent_forms() {
        assert_eq!(parse_percent("50%"), Some(50.0));
        assert_eq!(parse_percent("33.33 %"), Some(33.33));
        assert_eq!(parse_percent("100"), Some(100.0));
        assert_eq!(parse_percent("n/a"), None);
    }

    #[test]
    fn test_parenthesized_dash_combination() {
        // Parens already negate; a stray trailing dash must not flip back
        assert_eq!(parse_amount("(500)-"), Some(-500.0));
    }
}
