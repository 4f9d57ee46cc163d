use uuid::Uuid;

use super::DatabaseError;
use crate::models::{Job, QueryRecord};

/// Persistence collaborator for analysis jobs.
///
/// Implementations are internally synchronized; the pipeline shares one
/// store across concurrently running jobs. `update` must refuse to
/// overwrite a job whose stored status is already terminal.
pub trait JobStore: Send + Sync {
    fn insert(&self, job: &Job) -> Result<(), DatabaseError>;
    fn update(&self, job: &Job) -> Result<(), DatabaseError>;
    fn get(&self, id: &Uuid) -> Result<Option<Job>, DatabaseError>;
    fn delete(&self, id: &Uuid) -> Result<(), DatabaseError>;
    fn append_query(&self, id: &Uuid, record: &QueryRecord) -> Result<(), DatabaseError>;
    fn query_history(&self, id: &Uuid) -> Result<Vec<QueryRecord>, DatabaseError>;
}
