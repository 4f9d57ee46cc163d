use serde::{Deserialize, Serialize};

use super::enums::{DocumentCategory, FindingSource};

/// Category verdict with its supporting evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub verdict: DocumentCategory,
    /// Always within [0, 1].
    pub confidence: f32,
    /// Matched indicators, in the order they were found.
    pub evidence: Vec<String>,
    pub reasoning: String,
}

/// One structured finding: a contextual label plus the literal value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub label: String,
    pub value: String,
    pub source: FindingSource,
}

impl Finding {
    pub fn matched(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            source: FindingSource::Matched,
        }
    }

    pub fn canned(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            source: FindingSource::Canned,
        }
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.label, self.value)
    }
}

/// The three finding families, each in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredFindings {
    pub dates: Vec<Finding>,
    pub financial: Vec<Finding>,
    pub compliance: Vec<Finding>,
}

impl StructuredFindings {
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() && self.financial.is_empty() && self.compliance.is_empty()
    }

    pub fn len(&self) -> usize {
        self.dates.len() + self.financial.len() + self.compliance.len()
    }

    pub fn all(&self) -> impl Iterator<Item = &Finding> {
        self.dates
            .iter()
            .chain(self.financial.iter())
            .chain(self.compliance.iter())
    }
}
