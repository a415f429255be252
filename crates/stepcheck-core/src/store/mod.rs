//! Storage abstraction for grading reports.
//!
//! The [`ReportStore`] trait is the repository the service writes finished
//! reports to, enabling pluggable backends (SQLite in the service crate,
//! [`memory::InMemoryReportStore`] here for tests and embedding).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::GradingReport;

/// A persisted report with its storage metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReport {
    /// UUID v4.
    pub id: String,
    /// [`fingerprint`] of the submission.
    pub fingerprint: String,
    /// Unix seconds.
    pub created_at: i64,
    pub report: GradingReport,
}

impl StoredReport {
    /// Wrap a fresh report with a new id and the current time.
    pub fn new(report: GradingReport, steps: &[String]) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            fingerprint: fingerprint(&report.question, &report.correct_answer, steps),
            created_at: chrono::Utc::now().timestamp(),
            report,
        }
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            id: self.id.clone(),
            fingerprint: self.fingerprint.clone(),
            created_at: self.created_at,
            variable: self.report.variable.clone(),
            score: self.report.score,
            final_correct: self.report.final_correct,
        }
    }
}

/// Lightweight listing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub id: String,
    pub fingerprint: String,
    pub created_at: i64,
    pub variable: String,
    pub score: f64,
    pub final_correct: bool,
}

/// Abstract repository for grading reports.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`put`](ReportStore::put) | Insert or replace a report by id |
/// | [`get`](ReportStore::get) | Fetch a report by id |
/// | [`delete`](ReportStore::delete) | Remove a report, reporting whether it existed |
/// | [`recent`](ReportStore::recent) | Newest reports first |
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Store a report, returning its id.
    async fn put(&self, record: &StoredReport) -> Result<String>;

    async fn get(&self, id: &str) -> Result<Option<StoredReport>>;

    /// Returns `true` when a report was removed.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Up to `limit` summaries, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<ReportSummary>>;
}

/// SHA-256 hex digest identifying a submission.
///
/// Fields are length-prefixed so that moving text between them changes the
/// digest.
pub fn fingerprint(question: &str, correct_answer: &str, steps: &[String]) -> String {
    let mut hasher = Sha256::new();
    for part in [question, correct_answer]
        .into_iter()
        .chain(steps.iter().map(String::as_str))
    {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
