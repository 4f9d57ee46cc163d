use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::context::{
    label_for, window, COMPLIANCE_CONTEXT, DATE_CONTEXT, FINANCIAL_CONTEXT, GENERIC_AMOUNT_LABEL,
    GENERIC_DATE_LABEL, GENERIC_REQUIREMENT_LABEL,
};
use crate::config::AnalysisConfig;
use crate::models::{DocumentCategory, Finding, StructuredFindings};
use crate::pipeline::corruption::{canned_findings, CorruptionReport};
use crate::pipeline::extraction::DocumentText;
use crate::pipeline::text::{clip_at_word, split_into_sentences};

const MAX_REQUIREMENT_CHARS: usize = 160;

static DATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    const MONTH: &str = r"(?:January|February|March|April|May|June|July|August|September|October|November|December|Jan\.?|Feb\.?|Mar\.?|Apr\.?|Jun\.?|Jul\.?|Aug\.?|Sept?\.?|Oct\.?|Nov\.?|Dec\.?)";
    vec![
        // March 3, 2025
        Regex::new(&format!(r"(?i)\b{MONTH}[ \t]+\d{{1,2}},?[ \t]+\d{{4}}\b")).unwrap(),
        // 3 March 2025
        Regex::new(&format!(r"(?i)\b\d{{1,2}}[ \t]+{MONTH}[ \t]+\d{{4}}\b")).unwrap(),
        // 03/03/2025
        Regex::new(r"\b\d{1,2}/\d{1,2}/\d{4}\b").unwrap(),
        // 2025-03-03
        Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").unwrap(),
    ]
});

static MONEY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\$[ \t]?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{2})?\b(?:[ \t]+(?:thousand|million|billion)\b)?").unwrap(),
        Regex::new(r"\bUSD[ \t]?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{2})?\b").unwrap(),
        Regex::new(r"(?i)\b\d+(?:\.\d+)?[ \t]?(?:%|percent\b)").unwrap(),
    ]
});

static OBLIGATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:shall|must|pursuant\s+to|required\s+to|in\s+accordance\s+with|comply|complies|compliance)\b").unwrap()
});

/// `2 CFR 200`, `8 C.F.R. § 1003.38`, `8 U.S.C. § 1229(a)`, `INA § 240`.
static CITATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d+[ \t]+(?:C\.?F\.?R\.?|U\.?S\.?C\.?)[ \t]*(?:(?:§+|Part|part)[ \t]*)?\d+(?:\.\d+)*(?:\([A-Za-z0-9]+\))*|\bINA[ \t]+§+[ \t]*\d+(?:\([A-Za-z0-9]+\))*").unwrap()
});

/// Pulls dates, money amounts and obligations out of redacted text.
pub struct StructuredExtractor {
    context_window_chars: usize,
    max_per_family: usize,
}

impl StructuredExtractor {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            context_window_chars: config.context_window_chars,
            max_per_family: config.max_findings_per_family,
        }
    }

    pub fn extract(
        &self,
        text: &DocumentText,
        file_name: &str,
        category: DocumentCategory,
        corruption: &CorruptionReport,
    ) -> StructuredFindings {
        let findings = match text {
            DocumentText::Synthetic(_) => StructuredFindings::default(),
            _ if corruption.corrupted => corruption.fallback_findings.clone(),
            DocumentText::Corrupted => canned_findings(category),
            DocumentText::Extracted(content) => StructuredFindings {
                dates: self.scan(content, &DATE_PATTERNS, DATE_CONTEXT, GENERIC_DATE_LABEL),
                financial: self.scan(
                    content,
                    &MONEY_PATTERNS,
                    FINANCIAL_CONTEXT,
                    GENERIC_AMOUNT_LABEL,
                ),
                compliance: self.compliance(content),
            },
        };

        tracing::info!(
            file_name,
            category = category.as_str(),
            text_origin = text.origin().as_str(),
            dates = findings.dates.len(),
            financial = findings.financial.len(),
            compliance = findings.compliance.len(),
            "Structured findings extracted"
        );

        findings
    }

    /// All pattern matches in document order, each labeled from its
    /// surrounding text. Matches overlapping an earlier one are skipped.
    fn scan(
        &self,
        text: &str,
        patterns: &[Regex],
        table: &[(&str, &'static str)],
        generic: &'static str,
    ) -> Vec<Finding> {
        let mut spans: Vec<(usize, usize)> = patterns
            .iter()
            .flat_map(|re| re.find_iter(text).map(|m| (m.start(), m.end())))
            .collect();
        spans.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

        let mut last_end = 0;
        let mut found = Vec::new();
        for (start, end) in spans {
            if start < last_end {
                continue;
            }
            last_end = end;
            let context = window(text, start, end, self.context_window_chars);
            found.push(Finding::matched(label_for(&context, table, generic), &text[start..end]));
        }
        self.dedupe_and_cap(found)
    }

    fn compliance(&self, text: &str) -> Vec<Finding> {
        let found = split_into_sentences(text)
            .into_iter()
            .filter_map(|sentence| {
                let obligation = OBLIGATION.find(&sentence)?;
                let context = window(
                    &sentence,
                    obligation.start(),
                    obligation.end(),
                    self.context_window_chars,
                );
                let label = label_for(&context, COMPLIANCE_CONTEXT, GENERIC_REQUIREMENT_LABEL);
                let value = match CITATION.find(&sentence) {
                    Some(citation) => citation.as_str().to_string(),
                    None => clip_at_word(&sentence, MAX_REQUIREMENT_CHARS),
                };
                Some(Finding::matched(label, value))
            })
            .collect();
        self.dedupe_and_cap(found)
    }

    fn dedupe_and_cap(&self, findings: Vec<Finding>) -> Vec<Finding> {
        let mut seen = HashSet::new();
        findings
            .into_iter()
            .filter(|f| seen.insert(f.value.clone()))
            .take(self.max_per_family)
            .collect()
    }
}
