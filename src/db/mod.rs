pub mod memory;
pub mod sqlite;
pub mod store;

pub use memory::MemoryJobStore;
pub use sqlite::*;
pub use store::JobStore;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("Job {id} is {status} and can no longer be updated")]
    TerminalJob { id: String, status: String },

    #[error("Payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    LockPoisoned,
}

impl DatabaseError {
    pub(crate) fn job_not_found(id: &uuid::Uuid) -> Self {
        Self::NotFound {
            entity_type: "Job".into(),
            id: id.to_string(),
        }
    }
}
