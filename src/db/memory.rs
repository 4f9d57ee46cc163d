use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use super::{DatabaseError, JobStore};
use crate::models::{Job, QueryRecord};

struct StoredJob {
    job: Job,
    queries: Vec<QueryRecord>,
}

/// Process-local job store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<Uuid, StoredJob>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.read().map(|jobs| jobs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl JobStore for MemoryJobStore {
    fn insert(&self, job: &Job) -> Result<(), DatabaseError> {
        let mut jobs = self.jobs.write().map_err(|_| DatabaseError::LockPoisoned)?;
        if jobs.contains_key(&job.id) {
            return Err(DatabaseError::ConstraintViolation(format!(
                "job {} already exists",
                job.id
            )));
        }
        jobs.insert(
            job.id,
            StoredJob {
                job: job.clone(),
                queries: Vec::new(),
            },
        );
        Ok(())
    }

    fn update(&self, job: &Job) -> Result<(), DatabaseError> {
        let mut jobs = self.jobs.write().map_err(|_| DatabaseError::LockPoisoned)?;
        let stored = jobs
            .get_mut(&job.id)
            .ok_or_else(|| DatabaseError::job_not_found(&job.id))?;
        if stored.job.status.is_terminal() {
            return Err(DatabaseError::TerminalJob {
                id: job.id.to_string(),
                status: stored.job.status.to_string(),
            });
        }
        stored.job = job.clone();
        Ok(())
    }

    fn get(&self, id: &Uuid) -> Result<Option<Job>, DatabaseError> {
        let jobs = self.jobs.read().map_err(|_| DatabaseError::LockPoisoned)?;
        Ok(jobs.get(id).map(|stored| stored.job.clone()))
    }

    fn delete(&self, id: &Uuid) -> Result<(), DatabaseError> {
        let mut jobs = self.jobs.write().map_err(|_| DatabaseError::LockPoisoned)?;
        jobs.remove(id)
            .map(|_| ())
            .ok_or_else(|| DatabaseError::job_not_found(id))
    }

    fn append_query(&self, id: &Uuid, record: &QueryRecord) -> Result<(), DatabaseError> {
        let mut jobs = self.jobs.write().map_err(|_| DatabaseError::LockPoisoned)?;
        let stored = jobs
            .get_mut(id)
            .ok_or_else(|| DatabaseError::job_not_found(id))?;
        stored.queries.push(record.clone());
        Ok(())
    }

    fn query_history(&self, id: &Uuid) -> Result<Vec<QueryRecord>, DatabaseError> {
        let jobs = self.jobs.read().map_err(|_| DatabaseError::LockPoisoned)?;
        jobs.get(id)
            .map(|stored| stored.queries.clone())
            .ok_or_else(|| DatabaseError::job_not_found(id))
    }
}
