//! Small text utilities shared by the classifier, the structured extractor
//! and the query engine.

/// Abbreviations that end with a period but do not end a sentence.
/// Matched case-insensitively and only at a word start.
const ABBREVIATIONS: &[&str] = &[
    "v.", "vs.", "no.", "nos.", "u.s.", "u.s.c.", "c.f.r.", "i.n.a.", "b.i.a.", "i.&n.",
    "inc.", "corp.", "co.", "ltd.", "llc.", "dr.", "mr.", "mrs.", "ms.", "jr.", "sr.", "st.",
    "sec.", "secs.", "art.", "id.", "e.g.", "i.e.", "etc.", "al.", "cf.", "cir.", "app.",
    "supp.", "stat.", "fed.", "reg.", "dec.", "jan.", "feb.", "mar.", "apr.", "jun.", "jul.",
    "aug.", "sept.", "oct.", "nov.", "p.", "pp.", "para.", "approx.", "dept.", "ex.",
];

/// Longest line still treated as a heading when it has no lowercase letters.
const MAX_HEADING_LEN: usize = 80;

/// Split document text into sentences.
///
/// Blank lines and all-caps heading lines always end a sentence. Wrapped
/// lines inside a paragraph are joined. Whitespace inside a sentence is
/// collapsed to single spaces; the words themselves are untouched.
pub fn split_into_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();

    for block in text.split("\n\n") {
        let mut paragraph = String::new();
        for line in block.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if is_heading(line) {
                split_paragraph(&paragraph, &mut sentences);
                paragraph.clear();
                sentences.push(collapse_whitespace(line));
                continue;
            }
            if !paragraph.is_empty() {
                paragraph.push(' ');
            }
            paragraph.push_str(line);
        }
        split_paragraph(&paragraph, &mut sentences);
    }

    sentences
}

fn is_heading(line: &str) -> bool {
    line.len() <= MAX_HEADING_LEN
        && line.chars().any(char::is_alphabetic)
        && !line.chars().any(char::is_lowercase)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn split_paragraph(paragraph: &str, out: &mut Vec<String>) {
    let paragraph = collapse_whitespace(paragraph);
    if paragraph.is_empty() {
        return;
    }

    let mut start = 0;
    let mut iter = paragraph.char_indices().peekable();
    while let Some((i, c)) = iter.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        if c == '.' && ends_with_abbreviation(&paragraph, i) {
            continue;
        }
        // Boundary only when followed by a space and something that can start a sentence.
        let Some(&(_, ' ')) = iter.peek() else {
            continue;
        };
        let next_start = i + 2;
        let starts_sentence = paragraph[next_start..].chars().next().is_some_and(|n| {
            n.is_uppercase()
                || n.is_ascii_digit()
                || matches!(n, '"' | '(' | '[' | '§' | '\u{201C}')
        });
        if starts_sentence {
            let sentence = paragraph[start..=i].trim();
            if !sentence.is_empty() {
                out.push(sentence.to_string());
            }
            start = next_start;
        }
    }

    let tail = paragraph[start..].trim();
    if !tail.is_empty() {
        out.push(tail.to_string());
    }
}

/// Check if the text ending at `period_pos` ends with a known abbreviation
/// or a single-letter initial.
fn ends_with_abbreviation(text: &str, period_pos: usize) -> bool {
    let prefix = &text[..=period_pos];
    let word_start = prefix[..period_pos]
        .rfind(|c: char| c.is_whitespace() || c == '(')
        .map_or(0, |p| p + 1);
    let word = &prefix[word_start..];

    let mut letters = word.chars().filter(|c| c.is_alphabetic());
    if let (Some(first), None) = (letters.next(), letters.next()) {
        if first.is_uppercase() && word.chars().count() == 2 {
            return true;
        }
    }

    ABBREVIATIONS.iter().any(|abbr| word.eq_ignore_ascii_case(abbr))
}

/// Byte offset of the first occurrence of `needle` in `haystack` that sits on
/// word boundaries. A trailing plural `s` on the haystack side is accepted.
/// Both sides are expected to be lowercase already.
pub fn find_phrase(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let check_before = needle.starts_with(|c: char| c.is_alphanumeric());
    let check_after = needle.ends_with(|c: char| c.is_alphanumeric());

    let mut from = 0;
    while let Some(pos) = haystack[from..].find(needle) {
        let start = from + pos;
        let end = start + needle.len();

        let before_ok = !check_before
            || haystack[..start]
                .chars()
                .next_back()
                .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = !check_after || {
            let mut rest = haystack[end..].chars();
            match rest.next() {
                None => true,
                Some('s') => rest.next().map_or(true, |c| !c.is_alphanumeric()),
                Some(c) => !c.is_alphanumeric(),
            }
        };
        if before_ok && after_ok {
            return Some(start);
        }

        from = start + haystack[start..].chars().next().map_or(1, char::len_utf8);
    }
    None
}

/// Clip to at most `max_chars` characters, cutting at a word boundary and
/// marking the cut with an ellipsis.
pub fn clip_at_word(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut = text
        .char_indices()
        .nth(max_chars)
        .map_or(text.len(), |(i, _)| i);
    let head = &text[..cut];
    let head = match head.rfind(char::is_whitespace) {
        Some(space) if space > 0 => &head[..space],
        _ => head,
    };
    format!("{}…", head.trim_end_matches(|c: char| c == ',' || c == ';' || c.is_whitespace()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_simple_sentences() {
        let sentences =
            split_into_sentences("The hearing is set. Bring all documents! Any questions?");
        assert_eq!(
            sentences,
            vec!["The hearing is set.", "Bring all documents!", "Any questions?"]
        );
    }

    #[test]
    fn legal_abbreviations_do_not_split() {
        let text = "See Matter of Acosta, 19 I.&N. Dec. 211 (BIA 1985). Smith v. Jones controls. \
                    Under 8 U.S.C. § 1229 the notice issues. Case No. 12 is pending.";
        let sentences = split_into_sentences(text);
        assert_eq!(sentences.len(), 4, "{sentences:?}");
        assert!(sentences[1].starts_with("Smith v. Jones"));
        assert!(sentences[2].contains("8 U.S.C. § 1229"));
    }

    #[test]
    fn initials_do_not_split() {
        let sentences =
            split_into_sentences("Judge John R. Smith presided. The motion was denied.");
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0], "Judge John R. Smith presided.");
    }

    #[test]
    fn decimals_do_not_split() {
        let sentences = split_into_sentences("The award is $1,250.50 in total. Payment follows.");
        assert_eq!(sentences.len(), 2);
    }

    #[test]
    fn headings_and_blank_lines_split() {
        let text = "NOTICE TO APPEAR\nIn removal proceedings under section 240\nof the Act.\n\nYou are ordered to appear";
        let sentences = split_into_sentences(text);
        assert_eq!(
            sentences,
            vec![
                "NOTICE TO APPEAR",
                "In removal proceedings under section 240 of the Act.",
                "You are ordered to appear",
            ]
        );
    }

    #[test]
    fn find_phrase_respects_word_boundaries() {
        assert_eq!(find_phrase("the grant is", "grant"), Some(4));
        assert_eq!(find_phrase("grants awarded", "grant"), Some(0));
        assert_eq!(find_phrase("the grantee", "grant"), None);
        assert_eq!(find_phrase("emigrant", "grant"), None);
        assert_eq!(find_phrase("see form i-589", "form i-"), Some(4));
        assert_eq!(find_phrase("anything", ""), None);
    }

    #[test]
    fn clip_cuts_at_word_boundary() {
        let clipped = clip_at_word("The applicant shall maintain records for three years", 20);
        assert_eq!(clipped, "The applicant shall…");
        assert_eq!(clip_at_word("short", 20), "short");
    }
}
