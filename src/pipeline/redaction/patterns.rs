use std::sync::LazyLock;

use regex::Regex;

use crate::models::PiiKind;

/// One identifying-data shape and its replacement.
pub struct PiiPattern {
    pub kind: PiiKind,
    pub regex: Regex,
    pub placeholder: &'static str,
}

impl PiiPattern {
    fn new(kind: PiiKind, pattern: &str, placeholder: &'static str) -> Self {
        Self {
            kind,
            regex: Regex::new(pattern).expect("invalid PII pattern"),
            placeholder,
        }
    }
}

/// Patterns in table order. Every pattern needs a digit or an `@` to match
/// and no placeholder contains either, so placeholders never match.
pub static PII_PATTERNS: LazyLock<Vec<PiiPattern>> = LazyLock::new(|| {
    vec![
        PiiPattern::new(PiiKind::Ssn, r"\d{3}-\d{2}-\d{4}", "[REDACTED-SSN]"),
        PiiPattern::new(
            PiiKind::AlienNumber,
            r"(?i)\bA-?\d{8,9}\b",
            "[REDACTED-A-NUMBER]",
        ),
        PiiPattern::new(
            PiiKind::CreditCard,
            r"\b\d{4}[ -]?\d{4}[ -]?\d{4}[ -]?\d{4}\b",
            "[REDACTED-CARD]",
        ),
        PiiPattern::new(
            PiiKind::Phone,
            r"(?:\+?1[ .-]?)?(?:\(\d{3}\)[ ]?|\b\d{3}[ .-])\d{3}[ .-]\d{4}\b",
            "[REDACTED-PHONE]",
        ),
        PiiPattern::new(
            PiiKind::Email,
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
            "[REDACTED-EMAIL]",
        ),
        PiiPattern::new(
            PiiKind::DriversLicense,
            r"\b[A-Z]{2}\d{6,8}\b",
            "[REDACTED-LICENSE]",
        ),
        PiiPattern::new(
            PiiKind::StreetAddress,
            r"(?i)\b\d{1,5}[ \t]+[A-Za-z][A-Za-z0-9.' \t-]{0,30}?[ \t](?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Lane|Ln|Drive)\b",
            "[REDACTED-ADDRESS]",
        ),
    ]
});

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(kind: PiiKind) -> &'static PiiPattern {
        PII_PATTERNS.iter().find(|p| p.kind == kind).unwrap()
    }

    #[test]
    fn placeholders_never_match_any_pattern() {
        for placeholder in PII_PATTERNS.iter().map(|p| p.placeholder) {
            assert!(!placeholder.chars().any(|c| c.is_ascii_digit() || c == '@'));
            for p in PII_PATTERNS.iter() {
                assert!(!p.regex.is_match(placeholder), "{} matches {placeholder}", p.kind);
            }
        }
    }

    #[test]
    fn alien_number_shapes() {
        let p = pattern(PiiKind::AlienNumber);
        assert!(p.regex.is_match("A12345678"));
        assert!(p.regex.is_match("a-123456789"));
        assert!(!p.regex.is_match("A1234567"));
    }

    #[test]
    fn phone_shapes() {
        let p = pattern(PiiKind::Phone);
        assert!(p.regex.is_match("(555) 123-4567"));
        assert!(p.regex.is_match("555-123-4567"));
        assert!(p.regex.is_match("+1 555.123.4567"));
        assert!(!p.regex.is_match("$240,000"));
    }

    #[test]
    fn license_requires_two_capitals() {
        let p = pattern(PiiKind::DriversLicense);
        assert!(p.regex.is_match("CA1234567"));
        assert!(!p.regex.is_match("Ca1234567"));
    }

    #[test]
    fn street_address_shapes() {
        let p = pattern(PiiKind::StreetAddress);
        assert!(p.regex.is_match("123 Main Street"));
        assert!(p.regex.is_match("4500 N. Martin Luther King Blvd"));
        assert!(p.regex.is_match("12 Elm St."));
        assert!(!p.regex.is_match("12 Elm Stone"));
        // An address never spans a line break.
        assert!(!p.regex.is_match("Room 12\nMain Street"));
    }

    #[test]
    fn money_and_dates_are_not_pii() {
        let text = "$240,000 due January 1, 2025 or 01/15/2025 under 2 CFR 200 and 8 U.S.C. § 1229";
        for p in PII_PATTERNS.iter() {
            assert!(!p.regex.is_match(text), "{} matched", p.kind);
        }
    }
}
