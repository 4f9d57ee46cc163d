use serde::{Deserialize, Serialize};

use super::fallback::SYNTHETIC_TEXT_SENTINEL;
use super::ExtractionError;
use crate::models::{CorruptionSignal, ExtractionMethod, TextOrigin};
use crate::pipeline::corruption::CORRUPTED_TEXT_SENTINEL;

/// Uploaded file as handed over by the upload collaborator.
#[derive(Debug, Clone)]
pub struct ExtractionInput {
    pub bytes: Vec<u8>,
    pub declared_media_type: Option<String>,
    pub file_name: String,
    pub file_size_bytes: u64,
}

impl ExtractionInput {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_size_bytes: bytes.len() as u64,
            bytes,
            declared_media_type: None,
            file_name: file_name.into(),
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.declared_media_type = Some(media_type.into());
        self
    }
}

/// Text of one page, as produced by a strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page_number: usize,
    pub text: String,
}

/// Document text tagged with how trustworthy it is.
///
/// Only `Extracted` counts as evidence. `Corrupted` carries nothing but the
/// sentinel; `Synthetic` is a metadata summary written by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentText {
    Extracted(String),
    Corrupted,
    Synthetic(String),
}

impl DocumentText {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Extracted(text) | Self::Synthetic(text) => text,
            Self::Corrupted => CORRUPTED_TEXT_SENTINEL,
        }
    }

    pub fn origin(&self) -> TextOrigin {
        match self {
            Self::Extracted(_) => TextOrigin::Extracted,
            Self::Corrupted => TextOrigin::Corrupted,
            Self::Synthetic(_) => TextOrigin::Synthetic,
        }
    }

    pub fn is_evidence(&self) -> bool {
        matches!(self, Self::Extracted(_))
    }

    /// Rewrite the content, keeping the tag. The corrupted sentinel is left alone.
    pub fn map(self, f: impl FnOnce(String) -> String) -> Self {
        match self {
            Self::Extracted(text) => Self::Extracted(f(text)),
            Self::Synthetic(text) => Self::Synthetic(f(text)),
            Self::Corrupted => Self::Corrupted,
        }
    }

    /// Rebuild a tagged text from persisted content.
    pub fn from_stored(origin: TextOrigin, text: String) -> Self {
        match origin {
            TextOrigin::Extracted => Self::Extracted(text),
            TextOrigin::Corrupted => Self::Corrupted,
            TextOrigin::Synthetic => Self::Synthetic(text),
        }
    }

    /// True when `text` carries one of the pipeline's own sentinels.
    pub fn has_sentinel(text: &str) -> bool {
        text.contains(SYNTHETIC_TEXT_SENTINEL) || text.contains(CORRUPTED_TEXT_SENTINEL)
    }
}

/// Why a strategy's output was not used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Accepted,
    TooShort { chars: usize },
    Corrupted { signals: Vec<CorruptionSignal> },
    Failed { reason: String },
}

/// One strategy run. Never carries document text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionAttempt {
    pub method: ExtractionMethod,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

impl std::fmt::Display for ExtractionAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.outcome {
            AttemptOutcome::Accepted => write!(f, "{}: accepted", self.method),
            AttemptOutcome::TooShort { chars } => {
                write!(f, "{}: too short ({chars} chars)", self.method)
            }
            AttemptOutcome::Corrupted { signals } => {
                let names: Vec<&str> = signals.iter().map(|s| s.as_str()).collect();
                write!(f, "{}: corrupted ({})", self.method, names.join(", "))
            }
            AttemptOutcome::Failed { reason } => write!(f, "{}: failed ({reason})", self.method),
        }
    }
}

/// Result of the extraction stage.
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub text: DocumentText,
    pub method: ExtractionMethod,
    /// False only when the synthetic fallback was used.
    pub success: bool,
    pub page_count: usize,
    pub attempts: Vec<ExtractionAttempt>,
    /// Signals from the attempt that was judged corrupted, if any.
    pub corruption_signals: Vec<CorruptionSignal>,
}

/// One way of turning bytes into page text.
pub trait ExtractionStrategy: Send + Sync {
    fn method(&self) -> ExtractionMethod;

    fn extract(&self, bytes: &[u8]) -> Result<Vec<PageText>, ExtractionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupted_text_reads_as_sentinel() {
        let text = DocumentText::Corrupted;
        assert_eq!(text.as_str(), CORRUPTED_TEXT_SENTINEL);
        assert_eq!(text.origin(), TextOrigin::Corrupted);
        assert!(!text.is_evidence());
    }

    #[test]
    fn map_keeps_tag() {
        let text = DocumentText::Synthetic("abc".into()).map(|t| t.to_uppercase());
        assert_eq!(text, DocumentText::Synthetic("ABC".into()));
        assert_eq!(DocumentText::Corrupted.map(|_| "x".into()), DocumentText::Corrupted);
    }

    #[test]
    fn from_stored_restores_variant() {
        let text = DocumentText::from_stored(TextOrigin::Extracted, "body".into());
        assert!(text.is_evidence());
        let text = DocumentText::from_stored(TextOrigin::Corrupted, "ignored".into());
        assert_eq!(text, DocumentText::Corrupted);
    }

    #[test]
    fn attempt_display_has_no_content() {
        let attempt = ExtractionAttempt {
            method: ExtractionMethod::Utf8Decode,
            outcome: AttemptOutcome::TooShort { chars: 12 },
        };
        assert_eq!(attempt.to_string(), "utf8_decode: too short (12 chars)");
    }
}
