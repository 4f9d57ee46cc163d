//! Corruption detection for extracted text.
//!
//! Text that passes the length gate can still be garbage: broken font maps,
//! binary streams decoded as text, OCR confetti. The detector combines a few
//! cheap independent signals into a verdict and, when the verdict is
//! "corrupted", supplies placeholder findings that point the reader back to
//! the original document instead of surfacing garbled fragments.

use serde::{Deserialize, Serialize};

use crate::models::{CorruptionSignal, DocumentCategory, Finding, StructuredFindings};

/// Marker carried by text the pipeline already judged unusable.
/// No digits and no `@`, so redaction leaves it intact.
pub const CORRUPTED_TEXT_SENTINEL: &str = "[[LEXSCAN:CORRUPTED-TEXT]]";

const MIN_ALPHABETIC_RATIO: f32 = 0.45;
const SEVERE_ALPHABETIC_RATIO: f32 = 0.20;
const NOISE_RUN_LEN: usize = 5;
const MIN_NOISE_RUNS: usize = 3;
const SHORT_TOKEN_LEN: usize = 2;
const MAX_SHORT_TOKEN_RATIO: f32 = 0.60;
const MIN_TOKENS_FOR_SHORT_CHECK: usize = 20;
const MIN_WORD_RATIO: f32 = 0.40;
const MIN_ALPHA_TOKENS_FOR_WORD_CHECK: usize = 20;
const MIN_TOKENS_FOR_HEURISTICS: usize = 5;
const HEURISTIC_SIGNALS_REQUIRED: usize = 2;

/// Outcome of a corruption assessment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorruptionReport {
    pub corrupted: bool,
    pub signals: Vec<CorruptionSignal>,
    /// Canned findings for the document type; empty unless `corrupted`.
    pub fallback_findings: StructuredFindings,
}

/// Pure, deterministic corruption judge.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorruptionDetector;

impl CorruptionDetector {
    pub fn new() -> Self {
        Self
    }

    /// Bare verdict.
    pub fn is_corrupted(&self, text: &str) -> bool {
        judge(text).0
    }

    /// Verdict plus the signals that fired, without category-specific findings.
    pub fn inspect(&self, text: &str) -> (bool, Vec<CorruptionSignal>) {
        judge(text)
    }

    /// Verdict, fired signals and, when corrupted, canned findings for `category`.
    pub fn assess(
        &self,
        text: &str,
        file_name: &str,
        category: DocumentCategory,
    ) -> CorruptionReport {
        let (corrupted, signals) = judge(text);

        if corrupted {
            tracing::debug!(
                file_name,
                signals = ?signals,
                category = category.as_str(),
                "Text judged corrupted"
            );
        }

        CorruptionReport {
            corrupted,
            fallback_findings: if corrupted {
                canned_findings(category)
            } else {
                StructuredFindings::default()
            },
            signals,
        }
    }
}

fn judge(text: &str) -> (bool, Vec<CorruptionSignal>) {
    if text.contains(CORRUPTED_TEXT_SENTINEL) {
        return (true, vec![CorruptionSignal::Sentinel]);
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.is_empty() {
        return (false, Vec::new());
    }

    let ratio = alphabetic_ratio(text);
    let mut signals = Vec::new();
    if ratio < MIN_ALPHABETIC_RATIO {
        signals.push(CorruptionSignal::LowAlphabeticRatio);
    }

    // Too little text for the distributional signals to mean anything.
    if tokens.len() < MIN_TOKENS_FOR_HEURISTICS {
        return (ratio < SEVERE_ALPHABETIC_RATIO, signals);
    }

    if count_noise_runs(text) >= MIN_NOISE_RUNS {
        signals.push(CorruptionSignal::NoiseRuns);
    }
    if short_token_ratio(&tokens).is_some_and(|r| r > MAX_SHORT_TOKEN_RATIO) {
        signals.push(CorruptionSignal::RepeatedShortTokens);
    }
    if word_ratio(&tokens).is_some_and(|r| r < MIN_WORD_RATIO) {
        signals.push(CorruptionSignal::UnrecognizableWords);
    }

    let corrupted = signals.len() >= HEURISTIC_SIGNALS_REQUIRED || ratio < SEVERE_ALPHABETIC_RATIO;
    (corrupted, signals)
}

/// Letters over non-whitespace characters.
fn alphabetic_ratio(text: &str) -> f32 {
    let mut visible = 0usize;
    let mut letters = 0usize;
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        visible += 1;
        if c.is_alphabetic() {
            letters += 1;
        }
    }
    if visible == 0 {
        return 1.0;
    }
    letters as f32 / visible as f32
}

/// Form separators and table-of-contents leaders are not noise.
fn is_noise_char(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_whitespace() && !matches!(c, '.' | '_' | '-' | '=' | '*')
}

fn count_noise_runs(text: &str) -> usize {
    let mut runs = 0;
    let mut current = 0;
    for c in text.chars() {
        if is_noise_char(c) {
            current += 1;
        } else {
            if current >= NOISE_RUN_LEN {
                runs += 1;
            }
            current = 0;
        }
    }
    if current >= NOISE_RUN_LEN {
        runs += 1;
    }
    runs
}

fn short_token_ratio(tokens: &[&str]) -> Option<f32> {
    if tokens.len() < MIN_TOKENS_FOR_SHORT_CHECK {
        return None;
    }
    let short = tokens
        .iter()
        .filter(|t| t.chars().count() <= SHORT_TOKEN_LEN)
        .count();
    Some(short as f32 / tokens.len() as f32)
}

fn word_ratio(tokens: &[&str]) -> Option<f32> {
    let alpha: Vec<&str> = tokens
        .iter()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| t.chars().any(char::is_alphabetic))
        .collect();
    if alpha.len() < MIN_ALPHA_TOKENS_FOR_WORD_CHECK {
        return None;
    }
    let words = alpha.iter().filter(|t| looks_like_word(t)).count();
    Some(words as f32 / alpha.len() as f32)
}

fn looks_like_word(token: &str) -> bool {
    let has_vowel = token.chars().any(|c| {
        matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
            || (!c.is_ascii() && c.is_alphabetic())
    });
    if !has_vowel || token.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }

    let mut previous = None;
    let mut repeat = 0;
    for c in token.chars().map(|c| c.to_ascii_lowercase()) {
        if Some(c) == previous {
            repeat += 1;
            if repeat > 3 {
                return false;
            }
        } else {
            previous = Some(c);
            repeat = 1;
        }
    }
    true
}

// ── Canned findings ──

const ILLEGIBLE: &str = "not legible in source";

/// Placeholder findings for a document whose text cannot be trusted.
pub fn canned_findings(category: DocumentCategory) -> StructuredFindings {
    let verify = |what: &str| format!("{ILLEGIBLE}, verify against {what}");

    match category {
        DocumentCategory::Proposal => StructuredFindings {
            dates: vec![
                Finding::canned("Performance period", verify("the funding announcement")),
                Finding::canned("Deadline", verify("the submission instructions")),
            ],
            financial: vec![Finding::canned("Requested amount", verify("the budget narrative"))],
            compliance: vec![Finding::canned(
                "Regulatory requirement",
                verify("the award terms and applicable federal grant regulations"),
            )],
        },
        DocumentCategory::NoticeToAppear => StructuredFindings {
            dates: vec![Finding::canned("Hearing date", verify("original notice"))],
            financial: Vec::new(),
            compliance: vec![
                Finding::canned("Appearance requirement", verify("original notice")),
                Finding::canned("Charging allegations", verify("original notice")),
            ],
        },
        DocumentCategory::MotionBrief => StructuredFindings {
            dates: vec![Finding::canned("Filing deadline", verify("the court's docket"))],
            financial: Vec::new(),
            compliance: vec![Finding::canned("Relief requested", verify("the filed motion"))],
        },
        DocumentCategory::AdjudicatorDecision => StructuredFindings {
            dates: vec![
                Finding::canned("Decision date", verify("the signed decision")),
                Finding::canned("Appeal deadline", verify("the signed decision")),
            ],
            financial: Vec::new(),
            compliance: vec![Finding::canned("Order", verify("the signed decision"))],
        },
        DocumentCategory::GovernmentForm => StructuredFindings {
            dates: vec![Finding::canned("Form edition date", verify("the issued form"))],
            financial: vec![Finding::canned("Filing fee", verify("the current fee schedule"))],
            compliance: vec![Finding::canned(
                "Filing instructions",
                verify("the form instructions"),
            )],
        },
        DocumentCategory::CountryConditions => StructuredFindings {
            dates: vec![Finding::canned("Reporting period", verify("the published report"))],
            financial: Vec::new(),
            compliance: vec![Finding::canned("Cited sources", verify("the published report"))],
        },
        DocumentCategory::Administrative => StructuredFindings {
            dates: vec![Finding::canned("Date reference", verify("the original document"))],
            financial: vec![Finding::canned("Amount", verify("the original document"))],
            compliance: vec![Finding::canned("Requirement", verify("the original document"))],
        },
    }
}
