//! Context labels for findings.
//!
//! Each family has a phrase table. The phrase closest to the match names the
//! finding; table order breaks ties, so specific phrases come before the
//! broad ones they contain. The context window never crosses a sentence end.

use crate::pipeline::text::find_phrase;

pub const GENERIC_DATE_LABEL: &str = "Date reference";
pub const GENERIC_AMOUNT_LABEL: &str = "Amount";
pub const GENERIC_REQUIREMENT_LABEL: &str = "Requirement";

pub static DATE_CONTEXT: &[(&str, &str)] = &[
    ("no later than", "Deadline"),
    ("deadline", "Deadline"),
    ("due", "Deadline"),
    ("hearing", "Hearing date"),
    ("appear", "Hearing date"),
    ("effective", "Effective date"),
    ("expiration", "Expiration date"),
    ("expire", "Expiration date"),
    ("filed", "Filing date"),
    ("signed", "Signature date"),
    ("dated", "Document date"),
    ("period", "Performance period"),
    ("through", "Performance period"),
    ("start", "Start date"),
    ("end", "End date"),
];

pub static FINANCIAL_CONTEXT: &[(&str, &str)] = &[
    ("matching funds", "Matching requirement"),
    ("cost share", "Cost share"),
    ("indirect", "Indirect costs"),
    ("budget", "Budget"),
    ("grant", "Grant funding"),
    ("funding", "Grant funding"),
    ("award", "Award amount"),
    ("filing fee", "Filing fee"),
    ("fee", "Fee"),
    ("bond", "Bond amount"),
    ("fine", "Fine"),
    ("salary", "Personnel cost"),
    ("payment", "Payment"),
    ("rate", "Rate"),
];

pub static COMPLIANCE_CONTEXT: &[(&str, &str)] = &[
    ("matching", "Matching requirement"),
    ("report", "Reporting requirement"),
    ("appear", "Appearance requirement"),
    ("file", "Filing requirement"),
    ("submit", "Filing requirement"),
    ("pursuant to", "Regulatory requirement"),
    ("cfr", "Regulatory requirement"),
    ("u.s.c", "Regulatory requirement"),
    ("comply", "Compliance requirement"),
];

/// Lowercased text around a match, with the match's offsets inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub text: String,
    match_start: usize,
    match_end: usize,
}

impl Context {
    /// Bytes between a phrase occurrence and the match; 0 when they touch
    /// or overlap.
    fn distance(&self, pos: usize, len: usize) -> usize {
        if pos + len <= self.match_start {
            self.match_start - (pos + len)
        } else if pos >= self.match_end {
            pos - self.match_end
        } else {
            0
        }
    }
}

/// Text around `[start, end)`, extended by up to `chars` characters on each
/// side but stopping at sentence ends. Offsets must sit on char boundaries.
pub fn window(text: &str, start: usize, end: usize, chars: usize) -> Context {
    let mut from = if chars == 0 {
        start
    } else {
        text[..start]
            .char_indices()
            .rev()
            .nth(chars - 1)
            .map_or(0, |(i, _)| i)
    };
    let mut to = text[end..]
        .char_indices()
        .nth(chars)
        .map_or(text.len(), |(i, _)| end + i);

    if let Some(cut) = last_sentence_end(&text[from..start]) {
        from += cut;
    }
    if let Some(cut) = first_sentence_end(&text[end..to]) {
        to = end + cut;
    }

    let before = text[from..start].to_lowercase();
    let matched = text[start..end].to_lowercase();
    let after = text[end..to].to_lowercase();
    Context {
        match_start: before.len(),
        match_end: before.len() + matched.len(),
        text: before + &matched + &after,
    }
}

/// Label of the phrase nearest the match, else `generic`.
pub fn label_for(
    context: &Context,
    table: &[(&str, &'static str)],
    generic: &'static str,
) -> &'static str {
    table
        .iter()
        .enumerate()
        .filter_map(|(rank, (phrase, label))| {
            occurrences(&context.text, phrase)
                .map(|pos| context.distance(pos, phrase.len()))
                .min()
                .map(|distance| (distance, rank, *label))
        })
        .min_by_key(|(distance, rank, _)| (*distance, *rank))
        .map_or(generic, |(_, _, label)| label)
}

fn occurrences<'a>(haystack: &'a str, needle: &'a str) -> impl Iterator<Item = usize> + 'a {
    let mut from = 0;
    std::iter::from_fn(move || {
        let pos = from + find_phrase(&haystack[from..], needle)?;
        from = pos + needle.len();
        Some(pos)
    })
}

/// Byte offset just past the last `. `/`! `/`? ` followed by an uppercase
/// letter, or past the last blank line.
fn last_sentence_end(text: &str) -> Option<usize> {
    sentence_ends(text).last().map(|(_, resume)| resume)
}

/// Byte offset of the first sentence terminator, keeping the punctuation.
fn first_sentence_end(text: &str) -> Option<usize> {
    sentence_ends(text).next().map(|(cut, _)| cut)
}

/// `(end of sentence, start of next)` pairs.
fn sentence_ends(text: &str) -> impl Iterator<Item = (usize, usize)> + '_ {
    text.char_indices().filter_map(move |(i, c)| {
        let rest = &text[i + c.len_utf8()..];
        match c {
            '.' | '!' | '?' => {
                let mut next = rest.chars();
                match (next.next(), next.next()) {
                    (Some(' '), Some(n)) if n.is_uppercase() => Some((i + 1, i + 2)),
                    _ => None,
                }
            }
            '\n' if rest.starts_with('\n') => Some((i, i + 2)),
            _ => None,
        }
    })
}
