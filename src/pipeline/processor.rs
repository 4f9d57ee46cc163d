//! Document processing orchestrator.
//!
//! Single entry point that drives the full pipeline for one job:
//! extract → redact → classify → structured findings → persist.
//!
//! Every stage runs in sequence inside one async task; the only shared state
//! is the injected `JobStore`, so many jobs can run concurrently.

use std::sync::Arc;

use base64::Engine;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::AnalysisConfig;
use crate::db::{DatabaseError, JobStore};
use crate::models::{
    ExtractionMetadata, Job, JobAnalysis, JobError, JobReport, PipelineWarning, QueryRecord,
    RedactionSummary,
};
use crate::pipeline::classification::DocumentClassifier;
use crate::pipeline::corruption::{CorruptionDetector, CorruptionReport};
use crate::pipeline::extraction::{
    effective_media_type, DocumentText, ExtractionCoordinator, ExtractionInput, ExtractionOutcome,
};
use crate::pipeline::findings::StructuredExtractor;
use crate::pipeline::query::{PriorQuestion, QueryAnswer, QueryEngine, QueryRequest};
use crate::pipeline::redaction::{RedactionOutcome, Redactor};

/// Classifications below this confidence carry a warning.
const LOW_CONFIDENCE_THRESHOLD: f32 = 0.5;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during document processing.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Persistence failed: {0}")]
    Persistence(#[from] DatabaseError),

    #[error("Invalid job state: {0}")]
    Job(#[from] JobError),

    #[error("Job not found: {0}")]
    JobNotFound(Uuid),

    #[error("Job {0} has not finished processing")]
    NotReady(Uuid),

    #[error("File too large: {size} bytes (limit {limit})")]
    FileTooLarge { size: u64, limit: u64 },
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Orchestrates analysis jobs against a shared store.
pub struct DocumentProcessor {
    store: Arc<dyn JobStore>,
    config: AnalysisConfig,
    extractor: ExtractionCoordinator,
    detector: CorruptionDetector,
    redactor: Redactor,
    classifier: DocumentClassifier,
    findings: StructuredExtractor,
    query: QueryEngine,
}

impl DocumentProcessor {
    pub fn new(store: Arc<dyn JobStore>, config: AnalysisConfig) -> Self {
        Self {
            extractor: ExtractionCoordinator::new(&config),
            detector: CorruptionDetector::new(),
            redactor: Redactor::new(),
            classifier: DocumentClassifier::new(),
            findings: StructuredExtractor::new(&config),
            query: QueryEngine::new(&config),
            store,
            config,
        }
    }

    /// Swap the extraction stage (custom strategy chains).
    pub fn with_extractor(mut self, extractor: ExtractionCoordinator) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    /// Create a `PENDING` job for an upload. Oversized inputs are rejected
    /// before anything is stored.
    pub fn submit(&self, input: &ExtractionInput) -> Result<Job, ProcessingError> {
        let limit = self.config.max_file_size_bytes;
        if input.file_size_bytes > limit {
            tracing::warn!(size = input.file_size_bytes, limit, "Upload rejected: file too large");
            return Err(ProcessingError::FileTooLarge {
                size: input.file_size_bytes,
                limit,
            });
        }

        let job = Job::new(
            input.file_name.clone(),
            input.file_size_bytes,
            effective_media_type(input.declared_media_type.as_deref(), &input.file_name),
            content_hash(&input.bytes),
        );
        self.store.insert(&job)?;

        tracing::info!(
            job_id = %job.id,
            media_type = %job.media_type,
            file_size = job.file_size_bytes,
            "Job submitted"
        );
        Ok(job)
    }

    /// Submit and process in one call.
    pub async fn analyze(&self, input: ExtractionInput) -> Result<JobReport, ProcessingError> {
        let job = self.submit(&input)?;
        self.process(job.id, input).await
    }

    /// Launch `process` on the tokio runtime.
    pub fn spawn(
        self: &Arc<Self>,
        job_id: Uuid,
        input: ExtractionInput,
    ) -> tokio::task::JoinHandle<Result<JobReport, ProcessingError>> {
        let processor = Arc::clone(self);
        tokio::spawn(async move { processor.process(job_id, input).await })
    }

    /// Run the full pipeline for a submitted job.
    ///
    /// Degraded input (no text, garbled text, weak classification) still
    /// completes with warnings. Only persistence and lifecycle errors fail
    /// the job; it is then marked `ERROR` on a best-effort basis.
    pub async fn process(
        &self,
        job_id: Uuid,
        input: ExtractionInput,
    ) -> Result<JobReport, ProcessingError> {
        let mut job = self
            .store
            .get(&job_id)?
            .ok_or(ProcessingError::JobNotFound(job_id))?;

        match self.run_stages(&mut job, &input).await {
            Ok(()) => Ok(job.report()),
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Processing failed");
                self.mark_failed(&job_id, &e);
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        job: &mut Job,
        input: &ExtractionInput,
    ) -> Result<(), ProcessingError> {
        job.begin_processing()?;
        job.record_progress(10);
        self.store.update(job)?;
        tokio::task::yield_now().await;

        // Stage 1: extraction
        tracing::info!(job_id = %job.id, "Processing: starting extraction");
        let ExtractionOutcome {
            text,
            method,
            success,
            page_count,
            attempts,
            corruption_signals,
        } = self.extractor.extract(input);
        self.advance(job, 30)?;
        tokio::task::yield_now().await;

        // Stage 2: redaction. The raw text is dropped here.
        let RedactionOutcome {
            text: redacted,
            items_count,
            summary,
            ..
        } = self.redactor.redact(text.as_str(), &job.file_name);
        let text = text.map(|_| redacted);
        self.advance(job, 50)?;
        tokio::task::yield_now().await;

        // Stage 3: classification
        let classification = self.classifier.classify(&job.file_name, &text);
        self.advance(job, 70)?;
        tokio::task::yield_now().await;

        // Stage 4: structured findings
        // Synthetic text is the pipeline's own summary, never judged.
        let corruption = match text {
            DocumentText::Synthetic(_) => CorruptionReport::default(),
            _ => self
                .detector
                .assess(text.as_str(), &job.file_name, classification.verdict),
        };
        let findings = self
            .findings
            .extract(&text, &job.file_name, classification.verdict, &corruption);
        self.advance(job, 90)?;
        tokio::task::yield_now().await;

        let mut warnings = Vec::new();
        if !success {
            warnings.push(PipelineWarning::ExtractionFailure {
                attempts: attempts.iter().map(ToString::to_string).collect(),
            });
        }
        if corruption.corrupted {
            let signals = if corruption_signals.is_empty() {
                corruption.signals.clone()
            } else {
                corruption_signals
            };
            warnings.push(PipelineWarning::CorruptionDetected { signals });
        }
        if classification.confidence < LOW_CONFIDENCE_THRESHOLD {
            warnings.push(PipelineWarning::LowConfidenceClassification {
                confidence: classification.confidence,
            });
        }

        tracing::info!(
            job_id = %job.id,
            method = method.as_str(),
            text_origin = text.origin().as_str(),
            verdict = classification.verdict.as_str(),
            findings = findings.len(),
            warnings = warnings.len(),
            "Processing complete"
        );

        job.complete(JobAnalysis {
            text_origin: text.origin(),
            redacted_text: text.as_str().to_string(),
            extraction: ExtractionMetadata {
                method,
                success,
                page_count,
            },
            redaction: RedactionSummary {
                items_count,
                summary,
            },
            classification,
            findings,
            warnings,
        })?;
        self.store.update(job)?;
        Ok(())
    }

    fn advance(&self, job: &mut Job, pct: u8) -> Result<(), ProcessingError> {
        job.record_progress(pct);
        self.store.update(job)?;
        Ok(())
    }

    /// Mark the stored job `ERROR`. Failures here are logged, not returned:
    /// the caller already has the original error.
    fn mark_failed(&self, job_id: &Uuid, error: &ProcessingError) {
        let mut stored = match self.store.get(job_id) {
            Ok(Some(job)) => job,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(
                    job_id = %job_id,
                    error = %e,
                    "Could not load job to mark it failed"
                );
                return;
            }
        };
        if stored.status.is_terminal() {
            return;
        }
        if let Err(e) = stored.fail(error.to_string()) {
            tracing::warn!(job_id = %job_id, error = %e, "Could not mark job failed");
            return;
        }
        if let Err(e) = self.store.update(&stored) {
            tracing::warn!(job_id = %job_id, error = %e, "Could not persist failed job");
        }
    }

    /// Current state of a job, for status polling.
    pub fn report(&self, job_id: &Uuid) -> Result<JobReport, ProcessingError> {
        self.store
            .get(job_id)?
            .map(|job| job.report())
            .ok_or(ProcessingError::JobNotFound(*job_id))
    }

    /// Answer a question from a finished job's redacted text and record it
    /// in the job's history.
    pub fn ask(&self, job_id: &Uuid, question: &str) -> Result<QueryAnswer, ProcessingError> {
        let job = self
            .store
            .get(job_id)?
            .ok_or(ProcessingError::JobNotFound(*job_id))?;

        let (Some(origin), Some(text), Some(classification)) =
            (job.text_origin, job.redacted_text, job.classification)
        else {
            return Err(ProcessingError::NotReady(*job_id));
        };

        let prior_questions = self
            .store
            .query_history(job_id)?
            .into_iter()
            .map(|record| PriorQuestion {
                question: record.question,
                answer: record.answer,
            })
            .collect();

        let request = QueryRequest {
            question: question.to_string(),
            document_text: DocumentText::from_stored(origin, text).as_str().to_string(),
            document_type: classification.verdict,
            prior_questions,
        };
        let answer = self.query.answer(&request);

        self.store.append_query(
            job_id,
            &QueryRecord::new(question, answer.answer.clone(), answer.cannot_answer),
        )?;

        tracing::info!(
            job_id = %job_id,
            cannot_answer = answer.cannot_answer,
            excerpts = answer.source_excerpts.len(),
            "Question answered"
        );
        Ok(answer)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Base64 SHA-256 of the uploaded bytes.
fn content_hash(bytes: &[u8]) -> String {
    let hash = Sha256::digest(bytes);
    base64::engine::general_purpose::STANDARD.encode(hash)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::db::{MemoryJobStore, SqliteJobStore};
    use crate::models::{DocumentCategory, ExtractionMethod, JobStatus, QueryRecord};

    const SCENARIO: &str = "Grant funding of $240,000 for the period January 1, 2025 through \
                            December 31, 2025, pursuant to 2 CFR 200.";

    fn processor() -> DocumentProcessor {
        DocumentProcessor::new(Arc::new(MemoryJobStore::new()), AnalysisConfig::default())
    }

    fn text_input(name: &str, text: &str) -> ExtractionInput {
        ExtractionInput::new(name, text.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn funding_scenario_end_to_end() {
        let report = processor()
            .analyze(text_input("document.txt", SCENARIO))
            .await
            .unwrap();

        assert_eq!(report.status, JobStatus::Done);
        assert_eq!(report.progress, 100);
        assert!(report.extraction_success);
        assert_eq!(report.financial_terms, vec!["Grant funding: $240,000"]);
        assert_eq!(report.critical_dates.len(), 2);
        assert_eq!(report.compliance_requirements.len(), 1);
        assert!(report.compliance_requirements[0].contains("2 CFR 200"));

        let classification = report.classification.unwrap();
        assert_eq!(classification.verdict, DocumentCategory::Proposal);
        assert!(classification.confidence >= 0.85);
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn identifiers_never_reach_the_report() {
        let text = format!("{SCENARIO} Contact the applicant at 555-867-5309, SSN 123-45-6789.");
        let report = processor().analyze(text_input("document.txt", &text)).await.unwrap();

        let redacted = report.redacted_text.unwrap();
        assert!(!redacted.contains("123-45-6789"));
        assert!(!redacted.contains("555-867-5309"));
        assert!(redacted.contains("[REDACTED-SSN]"));
        assert_eq!(report.redacted_items_count, 2);
    }

    #[tokio::test]
    async fn failed_extraction_has_no_findings() {
        let bytes: Vec<u8> = [0u8, 159, 146, 150, 255, 1, 2, 3].repeat(100);
        let input = ExtractionInput::new("scan.pdf", bytes).with_media_type("application/pdf");
        let report = processor().analyze(input).await.unwrap();

        assert_eq!(report.status, JobStatus::Done);
        assert!(!report.extraction_success);
        assert!(report.critical_dates.is_empty());
        assert!(report.financial_terms.is_empty());
        assert!(report.compliance_requirements.is_empty());
        assert!(report.warnings.iter().any(|w| matches!(
            w,
            PipelineWarning::ExtractionFailure { attempts } if !attempts.is_empty()
        )));
        assert!(report
            .warnings
            .iter()
            .any(|w| matches!(w, PipelineWarning::LowConfidenceClassification { .. })));
    }

    #[tokio::test]
    async fn scanned_pdf_falls_back_to_synthetic_text() {
        use crate::pipeline::extraction::pdf::test_support::make_blank_pdf;

        let processor = processor();
        let input = ExtractionInput::new("scanned_notice.pdf", make_blank_pdf());
        let report = processor.analyze(input).await.unwrap();

        assert_eq!(report.status, JobStatus::Done);
        assert!(!report.extraction_success);
        assert_eq!(report.extraction_method, Some(ExtractionMethod::SyntheticFallback));
        assert!(report.critical_dates.is_empty());
        assert!(report.financial_terms.is_empty());
        assert!(report.compliance_requirements.is_empty());
        assert!(!report.redacted_text.unwrap_or_default().contains("obj"));

        let answer = processor
            .ask(&report.id, "What type of page catalog is this?")
            .unwrap();
        assert!(answer.cannot_answer);
        assert!(answer.source_excerpts.is_empty());
    }

    #[tokio::test]
    async fn corrupted_text_gets_canned_findings() {
        let garbled = "0918 2736 ".repeat(20);
        let report = processor()
            .analyze(text_input("NTA - Notice to Appear.txt", &garbled))
            .await
            .unwrap();

        assert_eq!(report.status, JobStatus::Done);
        assert_eq!(
            report.classification.as_ref().map(|c| c.verdict),
            Some(DocumentCategory::NoticeToAppear)
        );
        assert!(report.critical_dates[0].starts_with("Hearing date:"));
        assert!(report
            .warnings
            .iter()
            .any(|w| matches!(w, PipelineWarning::CorruptionDetected { .. })));
        assert!(!report.redacted_text.unwrap().contains("0918"));
    }

    #[tokio::test]
    async fn oversized_upload_rejected_before_job_exists() {
        let store = Arc::new(MemoryJobStore::new());
        let config = AnalysisConfig {
            max_file_size_bytes: 10,
            ..AnalysisConfig::default()
        };
        let processor = DocumentProcessor::new(store.clone(), config);

        let err = processor
            .analyze(text_input("document.txt", SCENARIO))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessingError::FileTooLarge { limit: 10, .. }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn questions_are_answered_and_recorded() {
        let processor = processor();
        let report = processor.analyze(text_input("document.txt", SCENARIO)).await.unwrap();

        let answer = processor.ask(&report.id, "What is the grant amount?").unwrap();
        assert!(!answer.cannot_answer);
        assert_eq!(answer.source_excerpts.len(), 1);

        let refused = processor.ask(&report.id, "Who is the landlord?").unwrap();
        assert!(refused.cannot_answer);

        let history: Vec<QueryRecord> = processor.store().query_history(&report.id).unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[1].cannot_answer);
    }

    #[tokio::test]
    async fn asking_before_completion_is_not_ready() {
        let processor = processor();
        let job = processor.submit(&text_input("document.txt", SCENARIO)).unwrap();

        let err = processor.ask(&job.id, "What is the grant amount?").unwrap_err();
        assert!(matches!(err, ProcessingError::NotReady(id) if id == job.id));

        let err = processor.ask(&Uuid::new_v4(), "anything").unwrap_err();
        assert!(matches!(err, ProcessingError::JobNotFound(_)));
    }

    #[tokio::test]
    async fn jobs_run_concurrently() {
        let processor = Arc::new(processor());
        let mut handles = Vec::new();
        for i in 0..4 {
            let input = text_input(&format!("doc-{i}.txt"), SCENARIO);
            let job = processor.submit(&input).unwrap();
            handles.push(processor.spawn(job.id, input));
        }
        for handle in handles {
            let report = handle.await.unwrap().unwrap();
            assert_eq!(report.status, JobStatus::Done);
        }
    }

    #[tokio::test]
    async fn sqlite_store_persists_reports() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.db");

        let job_id = {
            let store = Arc::new(SqliteJobStore::open(&path).unwrap());
            let processor = DocumentProcessor::new(store, AnalysisConfig::default());
            let report = processor.analyze(text_input("document.txt", SCENARIO)).await.unwrap();
            processor.ask(&report.id, "What is the grant amount?").unwrap();
            report.id
        };

        let store = Arc::new(SqliteJobStore::open(&path).unwrap());
        let processor = DocumentProcessor::new(store, AnalysisConfig::default());
        let report = processor.report(&job_id).unwrap();
        assert_eq!(report.status, JobStatus::Done);
        assert_eq!(report.financial_terms, vec!["Grant funding: $240,000"]);
        assert_eq!(processor.store().query_history(&job_id).unwrap().len(), 1);
    }

    /// Fails exactly one `update` call, by position.
    struct FlakyStore {
        inner: MemoryJobStore,
        updates: AtomicUsize,
        fail_at: usize,
    }

    impl JobStore for FlakyStore {
        fn insert(&self, job: &Job) -> Result<(), DatabaseError> {
            self.inner.insert(job)
        }
        fn update(&self, job: &Job) -> Result<(), DatabaseError> {
            let n = self.updates.fetch_add(1, Ordering::SeqCst) + 1;
            if n == self.fail_at {
                return Err(DatabaseError::ConstraintViolation("injected failure".into()));
            }
            self.inner.update(job)
        }
        fn get(&self, id: &Uuid) -> Result<Option<Job>, DatabaseError> {
            self.inner.get(id)
        }
        fn delete(&self, id: &Uuid) -> Result<(), DatabaseError> {
            self.inner.delete(id)
        }
        fn append_query(&self, id: &Uuid, record: &QueryRecord) -> Result<(), DatabaseError> {
            self.inner.append_query(id, record)
        }
        fn query_history(&self, id: &Uuid) -> Result<Vec<QueryRecord>, DatabaseError> {
            self.inner.query_history(id)
        }
    }

    #[tokio::test]
    async fn persistence_failure_marks_job_error() {
        let store = Arc::new(FlakyStore {
            inner: MemoryJobStore::new(),
            updates: AtomicUsize::new(0),
            fail_at: 3,
        });
        let processor = DocumentProcessor::new(store.clone(), AnalysisConfig::default());

        let input = text_input("document.txt", SCENARIO);
        let job = processor.submit(&input).unwrap();
        let err = processor.process(job.id, input).await.unwrap_err();
        assert!(matches!(err, ProcessingError::Persistence(_)));

        let stored = store.get(&job.id).unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Error);
        assert!(stored.classification.is_none());
        assert!(stored.findings.is_none());
        assert!(stored.error.is_some());
    }
}
