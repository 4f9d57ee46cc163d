pub mod types;
pub mod sanitize;
pub mod media;
pub mod pdf;
pub mod plain_text;
pub mod fallback;
pub mod orchestrator;

pub use types::*;
pub use sanitize::*;
pub use media::*;
pub use pdf::*;
pub use plain_text::*;
pub use fallback::*;
pub use orchestrator::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("Text encoding error: {0}")]
    EncodingError(String),

    #[error("Input looks like binary content ({replacement_share:.0}% undecodable)")]
    BinaryContent { replacement_share: f32 },

    #[error("Parser panicked")]
    ParserPanic,
}
