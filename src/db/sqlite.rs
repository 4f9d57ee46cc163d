use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{DatabaseError, JobStore};
use crate::models::{Job, JobStatus, QueryRecord};

/// Open a SQLite connection to the given path and run migrations
pub fn open_database(path: &Path) -> Result<Connection, DatabaseError> {
    let conn = Connection::open(path)?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing)
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    let conn = Connection::open_in_memory()?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

fn configure_pragmas(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "PRAGMA journal_mode=DELETE;
         PRAGMA foreign_keys=ON;"
    )?;
    Ok(())
}

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let current_version = get_current_version(conn);

    let migrations: Vec<(i64, &str)> = vec![
        (1, include_str!("../../resources/migrations/001_jobs.sql")),
    ];

    for (version, sql) in migrations {
        if version > current_version {
            tracing::info!("Running migration v{version}");
            conn.execute_batch(sql).map_err(|e| DatabaseError::MigrationFailed {
                version,
                reason: e.to_string(),
            })?;
        }
    }

    Ok(())
}

/// Get the current schema version (0 if no schema exists yet)
fn get_current_version(conn: &Connection) -> i64 {
    conn.query_row(
        "SELECT MAX(version) FROM schema_version",
        [],
        |row| row.get::<_, i64>(0),
    )
    .unwrap_or(0)
}

// ── Job store ──

/// SQLite-backed [`JobStore`]. Status and progress live in their own
/// columns for cheap polling; the rest of the job is a JSON payload.
pub struct SqliteJobStore {
    conn: Mutex<Connection>,
}

impl SqliteJobStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self::new(open_database(path)?))
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::new(open_memory_database()?))
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, DatabaseError>,
    ) -> Result<T, DatabaseError> {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }
}

fn stored_status(conn: &Connection, id: &Uuid) -> Result<Option<JobStatus>, DatabaseError> {
    let result = conn.query_row(
        "SELECT status FROM jobs WHERE id = ?1",
        params![id.to_string()],
        |row| row.get::<_, String>(0),
    );
    match result {
        Ok(status) => Ok(Some(JobStatus::from_str(&status)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn require_job(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    match stored_status(conn, id)? {
        Some(_) => Ok(()),
        None => Err(DatabaseError::job_not_found(id)),
    }
}

impl JobStore for SqliteJobStore {
    fn insert(&self, job: &Job) -> Result<(), DatabaseError> {
        let payload = serde_json::to_string(job)?;
        self.with_conn(|conn| {
            if stored_status(conn, &job.id)?.is_some() {
                return Err(DatabaseError::ConstraintViolation(format!(
                    "job {} already exists",
                    job.id
                )));
            }
            conn.execute(
                "INSERT INTO jobs (id, file_name, status, progress, content_hash, payload,
                 created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    job.id.to_string(),
                    job.file_name,
                    job.status.as_str(),
                    job.progress,
                    job.content_hash,
                    payload,
                    job.created_at,
                    job.updated_at,
                ],
            )?;
            Ok(())
        })
    }

    fn update(&self, job: &Job) -> Result<(), DatabaseError> {
        let payload = serde_json::to_string(job)?;
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE jobs SET status = ?2, progress = ?3, payload = ?4, updated_at = ?5
                 WHERE id = ?1 AND status NOT IN ('DONE', 'ERROR')",
                params![
                    job.id.to_string(),
                    job.status.as_str(),
                    job.progress,
                    payload,
                    job.updated_at,
                ],
            )?;
            if changed > 0 {
                return Ok(());
            }
            match stored_status(conn, &job.id)? {
                Some(status) => Err(DatabaseError::TerminalJob {
                    id: job.id.to_string(),
                    status: status.to_string(),
                }),
                None => Err(DatabaseError::job_not_found(&job.id)),
            }
        })
    }

    fn get(&self, id: &Uuid) -> Result<Option<Job>, DatabaseError> {
        self.with_conn(|conn| {
            let result = conn.query_row(
                "SELECT payload FROM jobs WHERE id = ?1",
                params![id.to_string()],
                |row| row.get::<_, String>(0),
            );
            match result {
                Ok(payload) => Ok(Some(serde_json::from_str(&payload)?)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn delete(&self, id: &Uuid) -> Result<(), DatabaseError> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM jobs WHERE id = ?1", params![id.to_string()])?;
            if changed == 0 {
                return Err(DatabaseError::job_not_found(id));
            }
            Ok(())
        })
    }

    fn append_query(&self, id: &Uuid, record: &QueryRecord) -> Result<(), DatabaseError> {
        self.with_conn(|conn| {
            require_job(conn, id)?;
            conn.execute(
                "INSERT INTO job_queries (job_id, question, answer, cannot_answer, asked_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    id.to_string(),
                    record.question,
                    record.answer,
                    record.cannot_answer as i32,
                    record.asked_at,
                ],
            )?;
            Ok(())
        })
    }

    fn query_history(&self, id: &Uuid) -> Result<Vec<QueryRecord>, DatabaseError> {
        self.with_conn(|conn| {
            require_job(conn, id)?;
            let mut stmt = conn.prepare(
                "SELECT question, answer, cannot_answer, asked_at
                 FROM job_queries WHERE job_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![id.to_string()], |row| {
                Ok(QueryRecord {
                    question: row.get(0)?,
                    answer: row.get(1)?,
                    cannot_answer: row.get::<_, i32>(2)? != 0,
                    asked_at: row.get::<_, DateTime<Utc>>(3)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Classification, DocumentCategory, ExtractionMethod, ExtractionMetadata, Finding,
        JobAnalysis, RedactionSummary, StructuredFindings, TextOrigin,
    };

    fn count_tables(conn: &Connection) -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |row| row.get::<_, i64>(0),
        )
        .unwrap()
    }

    fn job() -> Job {
        Job::new("grant.txt", 512, "text/plain", "aGFzaA==")
    }

    fn finished(mut job: Job) -> Job {
        job.begin_processing().unwrap();
        job.complete(JobAnalysis {
            text_origin: TextOrigin::Extracted,
            redacted_text: "Grant funding of $240,000.".into(),
            extraction: ExtractionMetadata {
                method: ExtractionMethod::Utf8Decode,
                success: true,
                page_count: 1,
            },
            redaction: RedactionSummary {
                items_count: 1,
                summary: "Redacted 1 items (1 ssn)".into(),
            },
            classification: Classification {
                verdict: DocumentCategory::Proposal,
                confidence: 0.9,
                evidence: vec!["content term: grant".into()],
                reasoning: "Funding vocabulary".into(),
            },
            findings: StructuredFindings {
                financial: vec![Finding::matched("Grant funding", "$240,000")],
                ..Default::default()
            },
            warnings: vec![],
        })
        .unwrap();
        job
    }

    #[test]
    fn database_initializes_tables() {
        let conn = open_memory_database().unwrap();
        // schema_version + jobs + job_queries
        assert_eq!(count_tables(&conn), 3);
    }

    #[test]
    fn schema_version_is_current() {
        let conn = open_memory_database().unwrap();
        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn migration_idempotent() {
        let conn = open_memory_database().unwrap();
        assert!(run_migrations(&conn).is_ok());
    }

    #[test]
    fn foreign_keys_enabled() {
        let conn = open_memory_database().unwrap();
        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn job_round_trips_through_payload() {
        let store = SqliteJobStore::open_in_memory().unwrap();
        let job = job();
        store.insert(&job).unwrap();

        let done = finished(job.clone());
        store.update(&done).unwrap();

        let loaded = store.get(&job.id).unwrap().unwrap();
        assert_eq!(loaded, done);
        assert_eq!(loaded.status, JobStatus::Done);
    }

    #[test]
    fn status_column_tracks_payload() {
        let store = SqliteJobStore::open_in_memory().unwrap();
        let mut job = job();
        store.insert(&job).unwrap();
        job.begin_processing().unwrap();
        job.record_progress(50);
        store.update(&job).unwrap();

        let (status, progress): (String, i64) = store
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT status, progress FROM jobs WHERE id = ?1",
                    params![job.id.to_string()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?)
            })
            .unwrap();
        assert_eq!(status, "PROCESSING");
        assert_eq!(progress, 50);
    }

    #[test]
    fn terminal_job_rejected() {
        let store = SqliteJobStore::open_in_memory().unwrap();
        let job = job();
        store.insert(&job).unwrap();
        let done = finished(job);
        store.update(&done).unwrap();

        let err = store.update(&done).unwrap_err();
        assert!(matches!(err, DatabaseError::TerminalJob { .. }));
    }

    #[test]
    fn unknown_job_update_not_found() {
        let store = SqliteJobStore::open_in_memory().unwrap();
        let err = store.update(&job()).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn duplicate_insert_rejected() {
        let store = SqliteJobStore::open_in_memory().unwrap();
        let job = job();
        store.insert(&job).unwrap();
        assert!(matches!(
            store.insert(&job).unwrap_err(),
            DatabaseError::ConstraintViolation(_)
        ));
    }

    #[test]
    fn query_history_in_insertion_order() {
        let store = SqliteJobStore::open_in_memory().unwrap();
        let job = job();
        store.insert(&job).unwrap();
        store
            .append_query(&job.id, &QueryRecord::new("What is the deadline?", "x", false))
            .unwrap();
        store
            .append_query(&job.id, &QueryRecord::new("Who is the judge?", "y", true))
            .unwrap();

        let history = store.query_history(&job.id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].question, "What is the deadline?");
        assert!(history[1].cannot_answer);
    }

    #[test]
    fn delete_cascades_history() {
        let store = SqliteJobStore::open_in_memory().unwrap();
        let job = job();
        store.insert(&job).unwrap();
        store
            .append_query(&job.id, &QueryRecord::new("q", "a", false))
            .unwrap();
        store.delete(&job.id).unwrap();

        assert!(store.get(&job.id).unwrap().is_none());
        let orphans: i64 = store
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM job_queries", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[test]
    fn on_disk_database_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.db");
        let job = job();
        {
            let store = SqliteJobStore::open(&path).unwrap();
            store.insert(&job).unwrap();
        }
        let store = SqliteJobStore::open(&path).unwrap();
        assert_eq!(store.get(&job.id).unwrap().unwrap().file_name, "grant.txt");
    }
}
