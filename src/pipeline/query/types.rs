use serde::{Deserialize, Serialize};

use crate::models::DocumentCategory;

/// A question about one analyzed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub question: String,
    /// Redacted document text, sentinels included.
    pub document_text: String,
    pub document_type: DocumentCategory,
    #[serde(default)]
    pub prior_questions: Vec<PriorQuestion>,
}

/// An earlier exchange on the same document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorQuestion {
    pub question: String,
    pub answer: String,
}

/// Answer composed only of document excerpts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryAnswer {
    pub answer: String,
    /// Within [0, 0.95]; 0 when `cannot_answer`.
    pub confidence: f32,
    pub source_excerpts: Vec<String>,
    pub reasoning: String,
    pub cannot_answer: bool,
    pub suggestions: Vec<String>,
}
