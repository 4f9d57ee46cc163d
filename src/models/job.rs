use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::analysis::{Classification, Finding, StructuredFindings};
use super::enums::{CorruptionSignal, ExtractionMethod, JobStatus, TextOrigin};

#[derive(Error, Debug, PartialEq)]
pub enum JobError {
    #[error("Invalid job transition from {from} to {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("Job {0} has already been analyzed")]
    AlreadyAnalyzed(Uuid),
}

/// How the text was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    pub method: ExtractionMethod,
    pub success: bool,
    pub page_count: usize,
}

/// What the redactor removed, without the removed values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionSummary {
    pub items_count: usize,
    pub summary: String,
}

/// Degradations the pipeline recovered from. None of these are fatal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineWarning {
    /// No strategy produced usable text; synthetic text was substituted.
    ExtractionFailure { attempts: Vec<String> },
    /// Text was long enough but garbled; canned findings were used.
    CorruptionDetected { signals: Vec<CorruptionSignal> },
    /// No category cleared the evidence floor with conviction.
    LowConfidenceClassification { confidence: f32 },
}

/// Everything the pipeline computes for a job, applied in one step.
#[derive(Debug, Clone)]
pub struct JobAnalysis {
    pub text_origin: TextOrigin,
    pub redacted_text: String,
    pub extraction: ExtractionMetadata,
    pub redaction: RedactionSummary,
    pub classification: Classification,
    pub findings: StructuredFindings,
    pub warnings: Vec<PipelineWarning>,
}

/// One unit of work per uploaded document.
///
/// The raw (pre-redaction) text is deliberately not a field: it lives only
/// inside a running pipeline and is never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub file_name: String,
    pub file_size_bytes: u64,
    pub media_type: String,
    /// Base64 SHA-256 of the uploaded bytes.
    pub content_hash: String,
    pub status: JobStatus,
    pub progress: u8,
    pub text_origin: Option<TextOrigin>,
    pub redacted_text: Option<String>,
    pub extraction: Option<ExtractionMetadata>,
    pub redaction: Option<RedactionSummary>,
    pub classification: Option<Classification>,
    pub findings: Option<StructuredFindings>,
    pub warnings: Vec<PipelineWarning>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(
        file_name: impl Into<String>,
        file_size_bytes: u64,
        media_type: impl Into<String>,
        content_hash: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            file_name: file_name.into(),
            file_size_bytes,
            media_type: media_type.into(),
            content_hash: content_hash.into(),
            status: JobStatus::Pending,
            progress: 0,
            text_origin: None,
            redacted_text: None,
            extraction: None,
            redaction: None,
            classification: None,
            findings: None,
            warnings: Vec::new(),
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn transition(&mut self, next: JobStatus) -> Result<(), JobError> {
        if !self.status.can_transition_to(next) {
            return Err(JobError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn begin_processing(&mut self) -> Result<(), JobError> {
        self.transition(JobStatus::Processing)
    }

    /// Raise progress. Regressions and updates outside `PROCESSING` are ignored.
    pub fn record_progress(&mut self, pct: u8) {
        if self.status != JobStatus::Processing {
            return;
        }
        let pct = pct.min(100);
        if pct > self.progress {
            self.progress = pct;
            self.updated_at = Utc::now();
        }
    }

    /// Attach the analysis and move to `DONE`.
    pub fn complete(&mut self, analysis: JobAnalysis) -> Result<(), JobError> {
        if self.classification.is_some() || self.findings.is_some() {
            return Err(JobError::AlreadyAnalyzed(self.id));
        }
        self.transition(JobStatus::Done)?;
        self.text_origin = Some(analysis.text_origin);
        self.redacted_text = Some(analysis.redacted_text);
        self.extraction = Some(analysis.extraction);
        self.redaction = Some(analysis.redaction);
        self.classification = Some(analysis.classification);
        self.findings = Some(analysis.findings);
        self.warnings = analysis.warnings;
        self.progress = 100;
        Ok(())
    }

    /// Move to `ERROR`. Content and analysis are dropped.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), JobError> {
        self.transition(JobStatus::Error)?;
        self.error = Some(reason.into());
        self.text_origin = None;
        self.redacted_text = None;
        self.classification = None;
        self.findings = None;
        Ok(())
    }

    /// The camelCase output shape handed to collaborators.
    pub fn report(&self) -> JobReport {
        let findings = self.findings.as_ref();

        JobReport {
            id: self.id,
            file_name: self.file_name.clone(),
            status: self.status,
            progress: self.progress,
            redacted_text: self.redacted_text.clone(),
            extraction_method: self.extraction.as_ref().map(|e| e.method),
            extraction_success: self.extraction.as_ref().is_some_and(|e| e.success),
            page_count: self.extraction.as_ref().map_or(0, |e| e.page_count),
            redaction_summary: self.redaction.as_ref().map(|r| r.summary.clone()),
            redacted_items_count: self.redaction.as_ref().map_or(0, |r| r.items_count),
            classification: self.classification.clone(),
            critical_dates: render_findings(findings.map(|f| f.dates.as_slice())),
            financial_terms: render_findings(findings.map(|f| f.financial.as_slice())),
            compliance_requirements: render_findings(findings.map(|f| f.compliance.as_slice())),
            warnings: self.warnings.clone(),
            error: self.error.clone(),
        }
    }
}

fn render_findings(findings: Option<&[Finding]>) -> Vec<String> {
    findings
        .map(|list| list.iter().map(|f| f.to_string()).collect())
        .unwrap_or_default()
}

/// Serialized job output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReport {
    pub id: Uuid,
    pub file_name: String,
    pub status: JobStatus,
    pub progress: u8,
    pub redacted_text: Option<String>,
    pub extraction_method: Option<ExtractionMethod>,
    pub extraction_success: bool,
    pub page_count: usize,
    pub redaction_summary: Option<String>,
    pub redacted_items_count: usize,
    pub classification: Option<Classification>,
    pub critical_dates: Vec<String>,
    pub financial_terms: Vec<String>,
    pub compliance_requirements: Vec<String>,
    pub warnings: Vec<PipelineWarning>,
    pub error: Option<String>,
}

/// One asked question and what was answered. Append-only per job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    pub question: String,
    pub answer: String,
    pub cannot_answer: bool,
    pub asked_at: DateTime<Utc>,
}

impl QueryRecord {
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        cannot_answer: bool,
    ) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            cannot_answer,
            asked_at: Utc::now(),
        }
    }
}
