use std::cmp::Ordering;

use super::keywords::{
    normalize_file_name, CategoryRule, StructuralMarker, CATEGORY_RULES, COURT_CAPTION,
    LITIGATION_TERMS, LITIGATION_TERMS_REQUIRED, STRUCTURAL_MARKERS,
};
use crate::models::{Classification, DocumentCategory};
use crate::pipeline::extraction::DocumentText;
use crate::pipeline::text::find_phrase;

/// Minimum score a category needs before it can win.
const SCORE_FLOOR: f32 = 1.0;
/// Filename hits count for half a content term.
const FILENAME_WEIGHT: f32 = 0.5;
const SCORE_EPSILON: f32 = 1e-4;

const BASE_CONFIDENCE: f32 = 0.40;
const CONTENT_BONUS: f32 = 0.20;
const MARKER_BONUS: f32 = 0.10;
const FILENAME_BONUS: f32 = 0.10;
const SINGLE_SOURCE_CAP: f32 = 0.90;
const CORROBORATED_CAP: f32 = 0.98;
const DEFAULT_CONFIDENCE: f32 = 0.30;
const DEFAULT_CONFIDENCE_NO_TEXT: f32 = 0.20;

const DEFAULT_CATEGORY: DocumentCategory = DocumentCategory::Administrative;

/// Evidence gathered for one category.
#[derive(Debug, Clone, Default)]
struct CategoryEvidence {
    content_terms: Vec<(usize, &'static str)>,
    markers: Vec<(usize, &'static str)>,
    filename_terms: Vec<&'static str>,
    score: f32,
}

impl CategoryEvidence {
    fn indicator_count(&self) -> usize {
        self.content_terms.len() + self.markers.len() + self.filename_terms.len()
    }

    /// Matched content and markers in text order, then filename hits.
    fn describe(&self) -> Vec<String> {
        let mut found: Vec<(usize, String)> = self
            .content_terms
            .iter()
            .map(|(pos, term)| (*pos, format!("content term: {term}")))
            .chain(
                self.markers
                    .iter()
                    .map(|(pos, label)| (*pos, format!("structural marker: {label}"))),
            )
            .collect();
        found.sort_by_key(|(pos, _)| *pos);

        found
            .into_iter()
            .map(|(_, e)| e)
            .chain(self.filename_terms.iter().map(|t| format!("file name: {t}")))
            .collect()
    }
}

/// Table-driven document classifier.
///
/// Only extracted text counts as content evidence; synthetic and corrupted
/// text leave the file name as the sole signal.
pub struct DocumentClassifier {
    rules: &'static [CategoryRule],
    markers: &'static [StructuralMarker],
}

impl Default for DocumentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentClassifier {
    pub fn new() -> Self {
        Self {
            rules: CATEGORY_RULES,
            markers: STRUCTURAL_MARKERS.as_slice(),
        }
    }

    pub fn classify(&self, file_name: &str, text: &DocumentText) -> Classification {
        let content = text.is_evidence().then(|| text.as_str());
        let lower = content.map(str::to_lowercase);
        let name = normalize_file_name(file_name);

        let mut evidence: Vec<(DocumentCategory, CategoryEvidence)> = self
            .rules
            .iter()
            .map(|rule| (rule.category, self.gather(rule, content, lower.as_deref(), &name)))
            .collect();

        let negatives = content.map(negative_indicators).unwrap_or_default();
        if !negatives.is_empty() {
            for (category, ev) in evidence.iter_mut() {
                if *category == DocumentCategory::Proposal {
                    ev.score = 0.0;
                }
            }
        }

        let classification = match pick_winner(&evidence) {
            Some((category, ev)) => {
                let confidence = confidence_for(ev);
                let mut items = ev.describe();
                items.extend(negatives.iter().cloned());
                Classification {
                    verdict: category,
                    confidence,
                    reasoning: reasoning_for(category, ev, text.is_evidence()),
                    evidence: items,
                }
            }
            None => {
                let confidence = if text.is_evidence() {
                    DEFAULT_CONFIDENCE
                } else {
                    DEFAULT_CONFIDENCE_NO_TEXT
                };
                Classification {
                    verdict: DEFAULT_CATEGORY,
                    confidence,
                    evidence: negatives,
                    reasoning: if text.is_evidence() {
                        format!(
                            "No category had clear enough evidence; defaulting to {}.",
                            DEFAULT_CATEGORY.label()
                        )
                    } else {
                        format!(
                            "No readable document text; the file name alone was not conclusive, defaulting to {}.",
                            DEFAULT_CATEGORY.label()
                        )
                    },
                }
            }
        };

        tracing::info!(
            verdict = classification.verdict.as_str(),
            confidence = classification.confidence,
            evidence = classification.evidence.len(),
            text_origin = text.origin().as_str(),
            "Document classified"
        );

        classification
    }

    fn gather(
        &self,
        rule: &CategoryRule,
        content: Option<&str>,
        lower: Option<&str>,
        file_name: &str,
    ) -> CategoryEvidence {
        let mut ev = CategoryEvidence::default();

        if let (Some(content), Some(lower)) = (content, lower) {
            for (term, weight) in rule.content_terms {
                if let Some(pos) = find_phrase(lower, term) {
                    ev.content_terms.push((pos, *term));
                    ev.score += weight;
                }
            }
            for marker in self.markers.iter().filter(|m| m.category == rule.category) {
                if let Some(m) = marker.regex.find(content) {
                    ev.markers.push((m.start(), marker.label));
                    ev.score += marker.weight;
                }
            }
        }

        for term in rule.filename_terms {
            if find_phrase(file_name, term).is_some() {
                ev.filename_terms.push(*term);
                ev.score += FILENAME_WEIGHT;
            }
        }

        ev
    }
}

/// Court captions and litigation vocabulary rule out a funding proposal.
fn negative_indicators(text: &str) -> Vec<String> {
    let mut found = Vec::new();
    if COURT_CAPTION.is_match(text) {
        found.push("negative indicator: court caption".to_string());
    }

    let lower = text.to_lowercase();
    let terms: Vec<&str> = LITIGATION_TERMS
        .iter()
        .copied()
        .filter(|term| find_phrase(&lower, term).is_some())
        .collect();
    if terms.len() >= LITIGATION_TERMS_REQUIRED {
        found.push(format!("negative indicator: litigation terms ({})", terms.join(", ")));
    }
    found
}

/// Highest score above the floor. Ties go to the richer evidence, then to
/// the default category.
fn pick_winner(
    evidence: &[(DocumentCategory, CategoryEvidence)],
) -> Option<(DocumentCategory, &CategoryEvidence)> {
    let mut best: Option<&(DocumentCategory, CategoryEvidence)> = None;
    let mut tied = false;

    for entry in evidence.iter().filter(|(_, ev)| ev.score >= SCORE_FLOOR) {
        let Some(current) = best else {
            best = Some(entry);
            continue;
        };
        match compare_evidence(&entry.1, &current.1) {
            Ordering::Greater => {
                best = Some(entry);
                tied = false;
            }
            Ordering::Equal => tied = true,
            Ordering::Less => {}
        }
    }

    if tied {
        return None;
    }
    best.map(|(category, ev)| (*category, ev))
}

fn compare_evidence(a: &CategoryEvidence, b: &CategoryEvidence) -> Ordering {
    if (a.score - b.score).abs() < SCORE_EPSILON {
        a.indicator_count().cmp(&b.indicator_count())
    } else if a.score > b.score {
        Ordering::Greater
    } else {
        Ordering::Less
    }
}

fn confidence_for(ev: &CategoryEvidence) -> f32 {
    let has_content = !ev.content_terms.is_empty();
    let has_filename = !ev.filename_terms.is_empty();

    let mut confidence = BASE_CONFIDENCE;
    if has_content {
        confidence += CONTENT_BONUS;
    }
    confidence += MARKER_BONUS * ev.markers.len() as f32;
    if has_filename {
        confidence += FILENAME_BONUS;
    }

    let cap = if has_content && has_filename {
        CORROBORATED_CAP
    } else {
        SINGLE_SOURCE_CAP
    };
    confidence.min(cap).clamp(0.0, 1.0)
}

fn reasoning_for(category: DocumentCategory, ev: &CategoryEvidence, has_text: bool) -> String {
    let mut parts = Vec::new();
    if !ev.content_terms.is_empty() {
        parts.push(format!("{} content term(s)", ev.content_terms.len()));
    }
    if !ev.markers.is_empty() {
        parts.push(format!("{} structural marker(s)", ev.markers.len()));
    }
    if !ev.filename_terms.is_empty() {
        parts.push("a matching file name".to_string());
    }
    let source = if has_text {
        ""
    } else {
        " (file name only, no readable text)"
    };
    format!(
        "Classified as {} based on {}{source}.",
        category.label(),
        parts.join(" and ")
    )
}
