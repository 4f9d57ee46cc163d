//! Structured findings: dates, money amounts and obligations, each with a
//! label taken from the surrounding text.

pub mod context;
pub mod extractor;

pub use extractor::StructuredExtractor;
