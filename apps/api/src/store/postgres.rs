//! PostgreSQL-backed [`Store`].
//!
//! Documents map to one table each (see `migrations/`). Array columns stand in
//! for the reference lists (`total_files`, `processed_files`, `reports`,
//! `results`) and are mutated with single-statement updates so concurrent
//! writers never lose each other's entries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::enrichment::PlatformResult;
use crate::models::applicant::{Applicant, SocialLinks};
use crate::models::folder::Folder;
use crate::models::job::Job;
use crate::models::report::{Priority, Report};
use crate::models::resume::{ArtifactRef, Extracted, Resume};
use crate::store::{ReportKey, Store, StoreError, StoreResult};

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Row types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, FromRow)]
struct ResumeRow {
    id: Uuid,
    folder_id: Uuid,
    original_name: String,
    local_path: String,
    status: String,
    retries: i32,
    max_retries: i32,
    error_reason: Option<String>,
    artifact_url: Option<String>,
    artifact_public_id: Option<String>,
    extracted_text: Option<String>,
    extracted_links: Option<Vec<String>>,
    extracted_metadata: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ResumeRow> for Resume {
    type Error = StoreError;

    fn try_from(row: ResumeRow) -> Result<Self, Self::Error> {
        let artifact = match (row.artifact_url, row.artifact_public_id) {
            (Some(url), Some(public_id)) => Some(ArtifactRef { url, public_id }),
            _ => None,
        };
        let extracted = row.extracted_text.map(|text| Extracted {
            text,
            links: row.extracted_links.unwrap_or_default(),
            metadata: row.extracted_metadata.unwrap_or(serde_json::Value::Null),
        });
        Ok(Resume {
            id: row.id,
            folder_id: row.folder_id,
            original_name: row.original_name,
            local_path: row.local_path,
            status: row.status.parse().map_err(corrupt)?,
            retries: row.retries,
            max_retries: row.max_retries,
            error_reason: row.error_reason,
            artifact,
            extracted,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct FolderRow {
    id: Uuid,
    title: String,
    user_id: Uuid,
    total_files: Vec<Uuid>,
    processed_files: Vec<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<FolderRow> for Folder {
    fn from(row: FolderRow) -> Self {
        Folder {
            id: row.id,
            title: row.title,
            user_id: row.user_id,
            total_files: row.total_files,
            processed_files: row.processed_files,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct JobRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    location: String,
    vacancies: i32,
    skill_required: Vec<String>,
    experience_required: Option<f64>,
    reports: Vec<Uuid>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl From<JobRow> for Job {
    fn from(row: JobRow) -> Self {
        Job {
            id: row.id,
            title: row.title,
            description: row.description,
            location: row.location,
            vacancies: row.vacancies,
            skill_required: row.skill_required,
            experience_required: row.experience_required,
            reports: row.reports,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ReportRow {
    id: Uuid,
    folder_id: Uuid,
    user_id: Uuid,
    job_id: Uuid,
    priority: Json<Priority>,
    priority_hash: String,
    status: String,
    results: Vec<Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReportRow> for Report {
    type Error = StoreError;

    fn try_from(row: ReportRow) -> Result<Self, Self::Error> {
        Ok(Report {
            id: row.id,
            folder_id: row.folder_id,
            user_id: row.user_id,
            job_id: row.job_id,
            priority: row.priority.0,
            priority_hash: row.priority_hash,
            status: row.status.parse().map_err(corrupt)?,
            results: row.results,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ApplicantRow {
    id: Uuid,
    resume_id: Uuid,
    job_id: Uuid,
    report_id: Uuid,
    created_by: Uuid,
    name: String,
    status: String,
    social: Json<SocialLinks>,
    authentication: Json<Vec<PlatformResult>>,
    verdict: Option<String>,
    score: Option<f64>,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ApplicantRow> for Applicant {
    type Error = StoreError;

    fn try_from(row: ApplicantRow) -> Result<Self, Self::Error> {
        Ok(Applicant {
            id: row.id,
            resume_id: row.resume_id,
            job_id: row.job_id,
            report_id: row.report_id,
            created_by: row.created_by,
            name: row.name,
            status: row.status.parse().map_err(corrupt)?,
            social: row.social.0,
            authentication: row.authentication.0,
            verdict: row.verdict.map(|v| v.parse()).transpose().map_err(corrupt)?,
            score: row.score,
            failure_reason: row.failure_reason,
            created_at: row.created_at,
        })
    }
}

fn corrupt(e: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(e.to_string())
}

fn convert_all<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Store implementation
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl Store for PgStore {
    async fn insert_resume(&self, resume: &Resume) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO resumes
                (id, folder_id, original_name, local_path, status, retries, max_retries, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(resume.id)
        .bind(resume.folder_id)
        .bind(&resume.original_name)
        .bind(&resume.local_path)
        .bind(resume.status.as_str())
        .bind(resume.retries)
        .bind(resume.max_retries)
        .bind(resume.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_resume(&self, id: Uuid) -> StoreResult<Option<Resume>> {
        sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Resume::try_from)
            .transpose()
    }

    async fn get_resumes(&self, ids: &[Uuid]) -> StoreResult<Vec<Resume>> {
        let rows = sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn resumes_in_folder(&self, folder_id: Uuid) -> StoreResult<Vec<Resume>> {
        let rows = sqlx::query_as::<_, ResumeRow>(
            "SELECT * FROM resumes WHERE folder_id = $1 ORDER BY created_at",
        )
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn claim_next_pending_resume(&self) -> StoreResult<Option<Resume>> {
        // One statement: the row lock taken by the subquery is held until the
        // UPDATE commits, and SKIP LOCKED sends racing workers to other rows.
        sqlx::query_as::<_, ResumeRow>(
            r#"
            UPDATE resumes
            SET status = 'PROCESSING'
            WHERE id = (
                SELECT id FROM resumes
                WHERE status = 'PENDING'
                ORDER BY created_at
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            AND status = 'PENDING'
            RETURNING *
            "#,
        )
        .fetch_optional(&self.pool)
        .await?
        .map(Resume::try_from)
        .transpose()
    }

    async fn save_resume(&self, resume: &Resume) -> StoreResult<()> {
        let (artifact_url, artifact_public_id) = match &resume.artifact {
            Some(a) => (Some(a.url.as_str()), Some(a.public_id.as_str())),
            None => (None, None),
        };
        let extracted = resume.extracted.as_ref();
        let result = sqlx::query(
            r#"
            UPDATE resumes
            SET status = $2, retries = $3, error_reason = $4,
                artifact_url = $5, artifact_public_id = $6,
                extracted_text = $7, extracted_links = $8, extracted_metadata = $9
            WHERE id = $1
            "#,
        )
        .bind(resume.id)
        .bind(resume.status.as_str())
        .bind(resume.retries)
        .bind(&resume.error_reason)
        .bind(artifact_url)
        .bind(artifact_public_id)
        .bind(extracted.map(|e| e.text.as_str()))
        .bind(extracted.map(|e| e.links.clone()))
        .bind(extracted.map(|e| e.metadata.clone()))
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Resume {}", resume.id)));
        }
        Ok(())
    }

    async fn delete_resume(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM resumes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_resumes_in_folder(&self, folder_id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM resumes WHERE folder_id = $1")
            .bind(folder_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_folder(&self, folder: &Folder) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO folders (id, title, user_id, total_files, processed_files, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(folder.id)
        .bind(&folder.title)
        .bind(folder.user_id)
        .bind(&folder.total_files)
        .bind(&folder.processed_files)
        .bind(folder.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_folder(&self, id: Uuid) -> StoreResult<Option<Folder>> {
        Ok(
            sqlx::query_as::<_, FolderRow>("SELECT * FROM folders WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .map(Folder::from),
        )
    }

    async fn folders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Folder>> {
        let rows = sqlx::query_as::<_, FolderRow>(
            "SELECT * FROM folders WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Folder::from).collect())
    }

    async fn rename_folder(&self, id: Uuid, title: &str) -> StoreResult<()> {
        let result = sqlx::query("UPDATE folders SET title = $2 WHERE id = $1")
            .bind(id)
            .bind(title)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Folder {id}")));
        }
        Ok(())
    }

    async fn push_total_file(&self, folder_id: Uuid, resume_id: Uuid) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE folders SET total_files = array_append(total_files, $2) WHERE id = $1",
        )
        .bind(folder_id)
        .bind(resume_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Folder {folder_id}")));
        }
        Ok(())
    }

    async fn add_processed_file(&self, folder_id: Uuid, resume_id: Uuid) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE folders
            SET processed_files = array_append(processed_files, $2)
            WHERE id = $1 AND NOT ($2 = ANY(processed_files))
            "#,
        )
        .bind(folder_id)
        .bind(resume_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn pull_resume_from_folder(&self, folder_id: Uuid, resume_id: Uuid) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE folders
            SET total_files = array_remove(total_files, $2),
                processed_files = array_remove(processed_files, $2)
            WHERE id = $1
            "#,
        )
        .bind(folder_id)
        .bind(resume_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_folder(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM folders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_job(&self, job: &Job) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO jobs
                (id, title, description, location, vacancies, skill_required,
                 experience_required, reports, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(job.id)
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.location)
        .bind(job.vacancies)
        .bind(&job.skill_required)
        .bind(job.experience_required)
        .bind(&job.reports)
        .bind(job.created_by)
        .bind(job.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_job(&self, id: Uuid) -> StoreResult<Option<Job>> {
        Ok(sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Job::from))
    }

    async fn jobs_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Job>> {
        let rows = sqlx::query_as::<_, JobRow>(
            "SELECT * FROM jobs WHERE created_by = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Job::from).collect())
    }

    async fn save_job(&self, job: &Job) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET title = $2, description = $3, location = $4, vacancies = $5,
                skill_required = $6, experience_required = $7
            WHERE id = $1
            "#,
        )
        .bind(job.id)
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.location)
        .bind(job.vacancies)
        .bind(&job.skill_required)
        .bind(job.experience_required)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Job {}", job.id)));
        }
        Ok(())
    }

    async fn push_job_report(&self, job_id: Uuid, report_id: Uuid) -> StoreResult<()> {
        let result =
            sqlx::query("UPDATE jobs SET reports = array_append(reports, $2) WHERE id = $1")
                .bind(job_id)
                .bind(report_id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Job {job_id}")));
        }
        Ok(())
    }

    async fn pull_job_report(&self, job_id: Uuid, report_id: Uuid) -> StoreResult<()> {
        sqlx::query("UPDATE jobs SET reports = array_remove(reports, $2) WHERE id = $1")
            .bind(job_id)
            .bind(report_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_job(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_report(&self, key: &ReportKey) -> StoreResult<Option<Report>> {
        sqlx::query_as::<_, ReportRow>(
            r#"
            SELECT * FROM reports
            WHERE job_id = $1 AND folder_id = $2 AND user_id = $3 AND priority_hash = $4
            "#,
        )
        .bind(key.job_id)
        .bind(key.folder_id)
        .bind(key.user_id)
        .bind(&key.priority_hash)
        .fetch_optional(&self.pool)
        .await?
        .map(Report::try_from)
        .transpose()
    }

    async fn insert_report(&self, report: &Report) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO reports
                (id, folder_id, user_id, job_id, priority, priority_hash, status, results, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(report.id)
        .bind(report.folder_id)
        .bind(report.user_id)
        .bind(report.job_id)
        .bind(Json(&report.priority))
        .bind(&report.priority_hash)
        .bind(report.status.as_str())
        .bind(&report.results)
        .bind(report.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                Err(StoreError::Conflict(
                    "Report already exists for this job, folder and priority".to_string(),
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_report(&self, id: Uuid) -> StoreResult<Option<Report>> {
        sqlx::query_as::<_, ReportRow>("SELECT * FROM reports WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Report::try_from)
            .transpose()
    }

    async fn save_report(&self, report: &Report) -> StoreResult<()> {
        let result = sqlx::query("UPDATE reports SET status = $2, results = $3 WHERE id = $1")
            .bind(report.id)
            .bind(report.status.as_str())
            .bind(&report.results)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Report {}", report.id)));
        }
        Ok(())
    }

    async fn reports_for_job(&self, job_id: Uuid) -> StoreResult<Vec<Report>> {
        let rows = sqlx::query_as::<_, ReportRow>(
            "SELECT * FROM reports WHERE job_id = $1 ORDER BY created_at DESC",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn reports_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Report>> {
        let rows = sqlx::query_as::<_, ReportRow>(
            "SELECT * FROM reports WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn delete_report(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM reports WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_applicants(&self, applicants: &[Applicant]) -> StoreResult<()> {
        if applicants.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO applicants \
             (id, resume_id, job_id, report_id, created_by, name, status, social, authentication, created_at) ",
        );
        builder.push_values(applicants, |mut row, a| {
            row.push_bind(a.id)
                .push_bind(a.resume_id)
                .push_bind(a.job_id)
                .push_bind(a.report_id)
                .push_bind(a.created_by)
                .push_bind(a.name.clone())
                .push_bind(a.status.as_str())
                .push_bind(Json(a.social.clone()))
                .push_bind(Json(a.authentication.clone()))
                .push_bind(a.created_at);
        });
        builder.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn get_applicant(&self, id: Uuid) -> StoreResult<Option<Applicant>> {
        sqlx::query_as::<_, ApplicantRow>("SELECT * FROM applicants WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Applicant::try_from)
            .transpose()
    }

    async fn applicants_for_report(&self, report_id: Uuid) -> StoreResult<Vec<Applicant>> {
        let rows = sqlx::query_as::<_, ApplicantRow>(
            "SELECT * FROM applicants WHERE report_id = $1 ORDER BY created_at, id",
        )
        .bind(report_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn save_applicant(&self, applicant: &Applicant) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE applicants
            SET status = $2, social = $3, authentication = $4,
                verdict = $5, score = $6, failure_reason = $7
            WHERE id = $1
            "#,
        )
        .bind(applicant.id)
        .bind(applicant.status.as_str())
        .bind(Json(&applicant.social))
        .bind(Json(&applicant.authentication))
        .bind(applicant.verdict.map(|v| v.as_str()))
        .bind(applicant.score)
        .bind(&applicant.failure_reason)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Applicant {}", applicant.id)));
        }
        Ok(())
    }

    async fn delete_applicants_for_report(&self, report_id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM applicants WHERE report_id = $1")
            .bind(report_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
