//! Text normalization for matching
//!
//! The same canonical form is used for rule matching and for duplicate keys,
//! so "Uber *Trip" and "UBER TRIP" compare equal.

use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static NON_MATCHABLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Z0-9\s]").expect("valid regex"));

/// Trim and collapse internal whitespace runs to single spaces
pub fn normalize_text(s: &str) -> String {
    WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

/// [`normalize_text`] for optional input; `None` becomes ""
pub fn normalize_opt(s: Option<&str>) -> String {
    s.map(normalize_text).unwrap_or_default()
}

/// Canonical form for matching: uppercase ASCII letters, digits and single spaces
pub fn normalize_for_match(s: &str) -> String {
    let upper = normalize_text(s).to_uppercase();
    let stripped = NON_MATCHABLE.replace_all(&upper, " ");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Uber   trip\t\nhome "), "Uber trip home");
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_opt(None), "");
        assert_eq!(normalize_opt(Some(" a  b ")), "a b");
    }

    #[test]
    fn test_normalize_for_match() {
        assert_eq!(normalize_for_match("Uber *Trip #123"), "UBER TRIP 123");
        assert_eq!(normalize_for_match("mcdonald's"), "MCDONALD S");
        assert_eq!(normalize_for_match("***"), "");
        assert_eq!(normalize_for_match("  swiggy/zomato  "), "SWIGGY ZOMATO");
    }

    #[test]
    fn test_non_ascii_letters_are_stripped() {
        // Upper-cased non-ASCII letters fall outside [A-Z] and become spaces
        assert_eq!(normalize_for_match("Café ₹100"), "CAF 100");
    }

    #[test]
    fn test_normalize_for_match_output_alphabet() {
        let inputs = [
            "  Amazon.in  Order#402-11 ",
            "\tNetflix\u{a0}Subscription\n",
            "UPI/1234/PAYTM@okaxis",
            "ÄÖÜ straße",
            "",
        ];
        for input in inputs {
            let out = normalize_for_match(input);
            assert!(out
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == ' '));
            assert!(!out.contains("  "));
            assert_eq!(out, out.trim());
        }
    }
}
