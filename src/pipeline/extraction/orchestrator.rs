use std::panic::{catch_unwind, AssertUnwindSafe};

use super::fallback::synthetic_summary;
use super::media::resolve_media_kind;
use super::pdf::{PdfObjectTextStrategy, PdfTextLayerStrategy};
use super::plain_text::{LossyDecodeStrategy, Utf8DecodeStrategy};
use super::sanitize::{sanitize_extracted_text, visible_char_count};
use super::types::{
    AttemptOutcome, DocumentText, ExtractionAttempt, ExtractionInput, ExtractionOutcome,
    ExtractionStrategy, PageText,
};
use super::ExtractionError;
use crate::config::AnalysisConfig;
use crate::models::{CorruptionSignal, ExtractionMethod, MediaKind};
use crate::pipeline::corruption::CorruptionDetector;

type Strategy = Box<dyn ExtractionStrategy>;

/// Turns uploaded bytes into tagged document text.
///
/// Strategies are tried in order for the resolved media kind. Each output is
/// sanitized, length-gated and checked for corruption; the first clean one
/// wins. Extraction never fails the job: the worst case is a synthetic
/// summary built from file metadata.
pub struct ExtractionCoordinator {
    detector: CorruptionDetector,
    min_text_chars: usize,
    pdf: Vec<Strategy>,
    plain_text: Vec<Strategy>,
    other: Vec<Strategy>,
}

impl ExtractionCoordinator {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            detector: CorruptionDetector::new(),
            min_text_chars: config.min_text_chars,
            // No lossy decode here: the raw bytes of a PDF are syntax, not text.
            pdf: vec![Box::new(PdfTextLayerStrategy), Box::new(PdfObjectTextStrategy)],
            plain_text: vec![Box::new(Utf8DecodeStrategy), Box::new(LossyDecodeStrategy)],
            other: vec![Box::new(Utf8DecodeStrategy), Box::new(LossyDecodeStrategy)],
        }
    }

    /// Replace the strategy chain for one media kind.
    pub fn with_strategies(mut self, kind: MediaKind, strategies: Vec<Strategy>) -> Self {
        match kind {
            MediaKind::Pdf => self.pdf = strategies,
            MediaKind::PlainText => self.plain_text = strategies,
            MediaKind::Other => self.other = strategies,
        }
        self
    }

    pub fn strategies_for(&self, kind: MediaKind) -> &[Strategy] {
        match kind {
            MediaKind::Pdf => &self.pdf,
            MediaKind::PlainText => &self.plain_text,
            MediaKind::Other => &self.other,
        }
    }

    pub fn extract(&self, input: &ExtractionInput) -> ExtractionOutcome {
        let kind = resolve_media_kind(
            &input.bytes,
            input.declared_media_type.as_deref(),
            &input.file_name,
        );

        tracing::info!(
            media_kind = kind.as_str(),
            file_size = input.file_size_bytes,
            "Starting text extraction"
        );

        let mut attempts = Vec::new();
        let mut first_corrupted: Option<(ExtractionMethod, usize, Vec<CorruptionSignal>)> = None;

        for strategy in self.strategies_for(kind) {
            let method = strategy.method();

            let pages = match run_strategy(strategy.as_ref(), &input.bytes) {
                Ok(pages) => pages,
                Err(e) => {
                    tracing::debug!(method = method.as_str(), error = %e, "Strategy failed");
                    attempts.push(ExtractionAttempt {
                        method,
                        outcome: AttemptOutcome::Failed {
                            reason: e.to_string(),
                        },
                    });
                    continue;
                }
            };

            let page_count = pages.len();
            let text = join_pages(&pages);
            let chars = visible_char_count(&text);

            if chars < self.min_text_chars {
                attempts.push(ExtractionAttempt {
                    method,
                    outcome: AttemptOutcome::TooShort { chars },
                });
                continue;
            }

            let (corrupted, signals) = self.detector.inspect(&text);
            if corrupted {
                attempts.push(ExtractionAttempt {
                    method,
                    outcome: AttemptOutcome::Corrupted {
                        signals: signals.clone(),
                    },
                });
                first_corrupted.get_or_insert((method, page_count, signals));
                continue;
            }

            attempts.push(ExtractionAttempt {
                method,
                outcome: AttemptOutcome::Accepted,
            });

            tracing::info!(
                method = method.as_str(),
                pages = page_count,
                text_length = text.len(),
                attempts = attempts.len(),
                "Text extraction complete"
            );

            return ExtractionOutcome {
                text: DocumentText::Extracted(text),
                method,
                success: true,
                page_count,
                attempts,
                corruption_signals: Vec::new(),
            };
        }

        // Raw garbled fragments are dropped; only the sentinel travels on.
        if let Some((method, page_count, signals)) = first_corrupted {
            tracing::warn!(
                method = method.as_str(),
                signals = ?signals,
                "Extracted text is corrupted"
            );
            return ExtractionOutcome {
                text: DocumentText::Corrupted,
                method,
                success: true,
                page_count,
                attempts,
                corruption_signals: signals,
            };
        }

        tracing::warn!(
            media_kind = kind.as_str(),
            attempts = attempts.len(),
            "No strategy produced usable text, using synthetic summary"
        );

        ExtractionOutcome {
            text: DocumentText::Synthetic(synthetic_summary(
                &input.file_name,
                input.file_size_bytes,
                kind,
            )),
            method: ExtractionMethod::SyntheticFallback,
            success: false,
            page_count: 0,
            attempts,
            corruption_signals: Vec::new(),
        }
    }
}

/// Third-party parsers occasionally panic on hostile input; that is a
/// strategy failure, not a crash.
fn run_strategy(
    strategy: &dyn ExtractionStrategy,
    bytes: &[u8],
) -> Result<Vec<PageText>, ExtractionError> {
    catch_unwind(AssertUnwindSafe(|| strategy.extract(bytes)))
        .unwrap_or(Err(ExtractionError::ParserPanic))
}

fn join_pages(pages: &[PageText]) -> String {
    pages
        .iter()
        .map(|p| sanitize_extracted_text(&p.text))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
