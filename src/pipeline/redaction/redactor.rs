use std::collections::BTreeMap;

use super::patterns::{PiiPattern, PII_PATTERNS};
use crate::models::PiiKind;

/// Redacted text plus what was removed (counts only, never values).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactionOutcome {
    pub text: String,
    pub items_count: usize,
    pub counts_by_kind: BTreeMap<PiiKind, usize>,
    pub summary: String,
}

#[derive(Debug, Clone, Copy)]
struct Span {
    start: usize,
    end: usize,
    kind: PiiKind,
    placeholder: &'static str,
}

/// Strips identifying substrings from document text.
///
/// All patterns are matched against the same input and overlaps are resolved
/// by position, so the table order has no influence on the output. Passes
/// repeat until nothing matches, which makes the result a fixed point.
pub struct Redactor {
    patterns: &'static [PiiPattern],
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new()
    }
}

impl Redactor {
    pub fn new() -> Self {
        Self {
            patterns: PII_PATTERNS.as_slice(),
        }
    }

    /// `file_name` is only used for logging.
    pub fn redact(&self, text: &str, file_name: &str) -> RedactionOutcome {
        let mut current = text.to_string();
        let mut counts: BTreeMap<PiiKind, usize> = BTreeMap::new();

        // Each pass removes at least one digit or '@', so this terminates.
        loop {
            let spans = self.find_spans(&current);
            if spans.is_empty() {
                break;
            }
            for span in &spans {
                *counts.entry(span.kind).or_default() += 1;
            }
            current = replace_spans(&current, &spans);
        }

        let items_count = counts.values().sum();
        let summary = summarize(items_count, &counts);

        tracing::info!(
            file_name,
            items = items_count,
            kinds = counts.len(),
            "Redaction complete"
        );

        RedactionOutcome {
            text: current,
            items_count,
            counts_by_kind: counts,
            summary,
        }
    }

    /// Non-overlapping spans in text order: earliest start, then longest,
    /// then the fixed `PiiKind` order.
    fn find_spans(&self, text: &str) -> Vec<Span> {
        let mut candidates: Vec<Span> = self
            .patterns
            .iter()
            .flat_map(|pattern| {
                pattern.regex.find_iter(text).map(move |m| Span {
                    start: m.start(),
                    end: m.end(),
                    kind: pattern.kind,
                    placeholder: pattern.placeholder,
                })
            })
            .collect();

        candidates.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then((b.end - b.start).cmp(&(a.end - a.start)))
                .then(a.kind.cmp(&b.kind))
        });

        let mut accepted: Vec<Span> = Vec::with_capacity(candidates.len());
        for span in candidates {
            if accepted.last().map_or(true, |last| span.start >= last.end) {
                accepted.push(span);
            }
        }
        accepted
    }
}

fn replace_spans(text: &str, spans: &[Span]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for span in spans {
        out.push_str(&text[cursor..span.start]);
        out.push_str(span.placeholder);
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);
    out
}

fn summarize(items_count: usize, counts: &BTreeMap<PiiKind, usize>) -> String {
    if items_count == 0 {
        return "No sensitive items found".to_string();
    }
    let parts: Vec<String> = counts
        .iter()
        .map(|(kind, count)| format!("{count} {kind}"))
        .collect();
    format!("Redacted {items_count} items ({})", parts.join(", "))
}
