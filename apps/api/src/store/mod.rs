//! Document store contract.
//!
//! Every method is a single-document operation; no method spans documents
//! transactionally. The one method with a concurrency guarantee is
//! [`Store::claim_next_pending_resume`], which must be an atomic
//! compare-and-set so two workers never receive the same resume.
//!
//! `AppState` holds an `Arc<dyn Store>`: `PgStore` in production,
//! `MemoryStore` in tests.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::applicant::Applicant;
use crate::models::folder::Folder;
use crate::models::job::Job;
use crate::models::report::Report;
use crate::models::resume::Resume;

#[cfg(test)]
pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Corrupt document: {0}")]
    Corrupt(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Lookup key that makes a report unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReportKey {
    pub job_id: Uuid,
    pub folder_id: Uuid,
    pub user_id: Uuid,
    pub priority_hash: String,
}

#[async_trait]
pub trait Store: Send + Sync {
    // ── Resumes ─────────────────────────────────────────────────────────────

    async fn insert_resume(&self, resume: &Resume) -> StoreResult<()>;

    async fn get_resume(&self, id: Uuid) -> StoreResult<Option<Resume>>;

    async fn get_resumes(&self, ids: &[Uuid]) -> StoreResult<Vec<Resume>>;

    async fn resumes_in_folder(&self, folder_id: Uuid) -> StoreResult<Vec<Resume>>;

    /// Atomically flips one PENDING resume to PROCESSING and returns it
    /// post-update, or `None` when nothing is pending.
    async fn claim_next_pending_resume(&self) -> StoreResult<Option<Resume>>;

    /// Overwrites the mutable fields (status, retries, error, artifact, extracted).
    async fn save_resume(&self, resume: &Resume) -> StoreResult<()>;

    async fn delete_resume(&self, id: Uuid) -> StoreResult<()>;

    /// Returns the number of resumes removed.
    async fn delete_resumes_in_folder(&self, folder_id: Uuid) -> StoreResult<u64>;

    // ── Folders ─────────────────────────────────────────────────────────────

    async fn insert_folder(&self, folder: &Folder) -> StoreResult<()>;

    async fn get_folder(&self, id: Uuid) -> StoreResult<Option<Folder>>;

    async fn folders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Folder>>;

    async fn rename_folder(&self, id: Uuid, title: &str) -> StoreResult<()>;

    async fn push_total_file(&self, folder_id: Uuid, resume_id: Uuid) -> StoreResult<()>;

    /// Set-union append: repeated calls leave a single entry.
    async fn add_processed_file(&self, folder_id: Uuid, resume_id: Uuid) -> StoreResult<()>;

    /// Pulls the resume id from both `total_files` and `processed_files`.
    async fn pull_resume_from_folder(&self, folder_id: Uuid, resume_id: Uuid) -> StoreResult<()>;

    async fn delete_folder(&self, id: Uuid) -> StoreResult<()>;

    // ── Jobs ────────────────────────────────────────────────────────────────

    async fn insert_job(&self, job: &Job) -> StoreResult<()>;

    async fn get_job(&self, id: Uuid) -> StoreResult<Option<Job>>;

    async fn jobs_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Job>>;

    /// Overwrites the descriptive fields. `reports` is managed separately.
    async fn save_job(&self, job: &Job) -> StoreResult<()>;

    async fn push_job_report(&self, job_id: Uuid, report_id: Uuid) -> StoreResult<()>;

    async fn pull_job_report(&self, job_id: Uuid, report_id: Uuid) -> StoreResult<()>;

    async fn delete_job(&self, id: Uuid) -> StoreResult<()>;

    // ── Reports ─────────────────────────────────────────────────────────────

    async fn find_report(&self, key: &ReportKey) -> StoreResult<Option<Report>>;

    /// Fails with [`StoreError::Conflict`] when a report with the same
    /// [`ReportKey`] already exists.
    async fn insert_report(&self, report: &Report) -> StoreResult<()>;

    async fn get_report(&self, id: Uuid) -> StoreResult<Option<Report>>;

    /// Overwrites `status` and `results`.
    async fn save_report(&self, report: &Report) -> StoreResult<()>;

    async fn reports_for_job(&self, job_id: Uuid) -> StoreResult<Vec<Report>>;

    async fn reports_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Report>>;

    async fn delete_report(&self, id: Uuid) -> StoreResult<()>;

    // ── Applicants ──────────────────────────────────────────────────────────

    async fn insert_applicants(&self, applicants: &[Applicant]) -> StoreResult<()>;

    async fn get_applicant(&self, id: Uuid) -> StoreResult<Option<Applicant>>;

    async fn applicants_for_report(&self, report_id: Uuid) -> StoreResult<Vec<Applicant>>;

    /// Overwrites status, social, authentication, verdict, score, failure reason.
    async fn save_applicant(&self, applicant: &Applicant) -> StoreResult<()>;

    async fn delete_applicants_for_report(&self, report_id: Uuid) -> StoreResult<u64>;
}
