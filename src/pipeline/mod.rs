pub mod text;
pub mod corruption;
pub mod extraction;
pub mod redaction;
pub mod classification;
pub mod findings;
pub mod query;
pub mod processor; // Job orchestration: extract → redact → classify → findings
