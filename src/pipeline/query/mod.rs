//! Grounded question answering over a single document.

pub mod engine;
pub mod intent;
pub mod types;

pub use engine::{QueryEngine, NOT_FOUND_ANSWER};
pub use intent::classify_intent;
pub use types::{PriorQuestion, QueryAnswer, QueryRequest};
