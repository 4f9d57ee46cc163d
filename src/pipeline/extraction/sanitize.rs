/// Sanitize extracted text before passing downstream.
/// Strips control characters and stray symbols and trims every line. A run
/// of blank lines becomes one paragraph break (`\n\n`); leading and trailing
/// blank lines go. Legal punctuation (`§`, `¶`, `$`, citations) is preserved.
pub fn sanitize_extracted_text(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| {
            c.is_alphanumeric()
                || c.is_whitespace()
                || matches!(
                    c,
                    '.' | ','
                        | ';'
                        | ':'
                        | '-'
                        | '/'
                        | '('
                        | ')'
                        | '['
                        | ']'
                        | '+'
                        | '='
                        | '%'
                        | '#'
                        | '@'
                        | '&'
                        | '\''
                        | '"'
                        | '!'
                        | '?'
                        | '<'
                        | '>'
                        | '*'
                        | '_'
                        | '$'
                        | '§'
                        | '¶'
                        | '©'
                        | '°'
                        | '€'
                        | '£'
                        | '\u{2013}' // En-dash
                        | '\u{2014}' // Em-dash
                        | '\u{2019}' // Right single quotation mark
                        | '\u{2018}' // Left single quotation mark
                        | '\u{201C}' // Left double quotation mark
                        | '\u{201D}' // Right double quotation mark
                )
        })
        .collect();

    let mut out = String::with_capacity(kept.len());
    let mut paragraph_break = false;
    for line in kept.lines().map(str::trim) {
        if line.is_empty() {
            paragraph_break = !out.is_empty();
            continue;
        }
        if !out.is_empty() {
            out.push_str(if paragraph_break { "\n\n" } else { "\n" });
        }
        out.push_str(line);
        paragraph_break = false;
    }
    out
}

/// Characters that are not whitespace. Used by the length gate.
pub fn visible_char_count(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_null_bytes() {
        let raw = "Respondent:\x00 Garcia";
        let clean = sanitize_extracted_text(raw);
        assert!(!clean.contains('\x00'));
        assert!(clean.contains("Garcia"));
    }

    #[test]
    fn strips_control_characters() {
        let raw = "Hearing\x01\x02\x03\nDate: 2025-03-14";
        let clean = sanitize_extracted_text(raw);
        assert!(!clean.contains('\x01'));
        assert!(clean.contains("Hearing"));
        assert!(clean.contains("2025-03-14"));
    }

    #[test]
    fn preserves_legal_punctuation() {
        let raw = "Pursuant to 8 U.S.C. § 1229(a), ¶ 4: $240,000.00 (50%)";
        let clean = sanitize_extracted_text(raw);
        assert_eq!(clean, raw);
    }

    #[test]
    fn collapses_blank_line_runs_to_one_break() {
        let raw = "\n\nLine one\n\n\n\nLine two\n  \n\t\nLine three\nLine four\n\n";
        assert_eq!(
            sanitize_extracted_text(raw),
            "Line one\n\nLine two\n\nLine three\nLine four"
        );
    }

    #[test]
    fn paragraph_break_survives_for_sentence_splitting() {
        use crate::pipeline::text::split_into_sentences;

        let raw = "The grantee shall report quarterly\n\n\nfunds are disbursed monthly";
        let clean = sanitize_extracted_text(raw);
        assert_eq!(
            split_into_sentences(&clean),
            vec!["The grantee shall report quarterly", "funds are disbursed monthly"]
        );
    }

    #[test]
    fn trims_whitespace_per_line() {
        let raw = "  leading spaces  \n  trailing too  ";
        assert_eq!(sanitize_extracted_text(raw), "leading spaces\ntrailing too");
    }

    #[test]
    fn empty_input_returns_empty() {
        assert_eq!(sanitize_extracted_text(""), "");
        assert_eq!(sanitize_extracted_text("\x00\x01\x02"), "");
    }

    #[test]
    fn drops_replacement_characters() {
        let raw = "Notice\u{FFFD}\u{FFFD} to Appear";
        assert_eq!(sanitize_extracted_text(raw), "Notice to Appear");
    }

    #[test]
    fn preserves_accented_names_and_quotes() {
        let raw = "Matter of Peña \u{201C}the respondent\u{201D}";
        assert_eq!(sanitize_extracted_text(raw), raw);
    }

    #[test]
    fn visible_chars_ignore_whitespace() {
        assert_eq!(visible_char_count(" a b\n c\t"), 3);
    }
}
