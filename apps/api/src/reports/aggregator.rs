//! Report aggregation — validates a weighting, deduplicates by
//! (job, folder, user, priority hash), and fans out one applicant per
//! processed resume in the folder.
//!
//! None of the multi-document writes here are transactional. A failed bulk
//! applicant insert leaves the report PENDING with empty `results`.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::applicants::social::classify_links;
use crate::errors::AppError;
use crate::models::applicant::{Applicant, ApplicantStatus, SocialLinks};
use crate::models::job::Job;
use crate::models::report::{Report, ReportStatus};
use crate::models::resume::Resume;
use crate::reports::priority::{priority_hash, validate_priority};
use crate::reports::scoring::ApplicantScorer;
use crate::store::{ReportKey, Store};

#[derive(Debug, Deserialize)]
pub struct CreateReportRequest {
    pub job_id: Uuid,
    pub folder_id: Uuid,
    /// Kept raw so validation can tell a missing field from a non-numeric one.
    #[serde(default)]
    pub priority: Value,
}

/// A report with its applicants resolved.
#[derive(Debug, Serialize)]
pub struct ReportDetail {
    #[serde(flatten)]
    pub report: Report,
    pub applicants: Vec<Applicant>,
}

// ────────────────────────────────────────────────────────────────────────────
// Create / delete
// ────────────────────────────────────────────────────────────────────────────

pub async fn create_report(
    store: &dyn Store,
    user_id: Uuid,
    req: &CreateReportRequest,
) -> Result<Report, AppError> {
    let job = store
        .get_job(req.job_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;

    let folder = store
        .get_folder(req.folder_id)
        .await?
        .filter(|f| f.is_owned_by(user_id))
        .ok_or_else(|| AppError::Forbidden("Folder not found or access denied".to_string()))?;

    let priority = validate_priority(&req.priority)?;
    let hash = priority_hash(&priority);

    let key = ReportKey {
        job_id: job.id,
        folder_id: folder.id,
        user_id,
        priority_hash: hash.clone(),
    };
    if store.find_report(&key).await?.is_some() {
        return Err(AppError::Conflict(
            "Report already exists for this job, folder and priority".to_string(),
        ));
    }

    let mut report = Report {
        id: Uuid::new_v4(),
        folder_id: folder.id,
        user_id,
        job_id: job.id,
        priority,
        priority_hash: hash,
        status: ReportStatus::Pending,
        results: Vec::new(),
        created_at: Utc::now(),
    };
    // The unique index catches a concurrent twin that slipped past find_report.
    store.insert_report(&report).await?;
    store.push_job_report(job.id, report.id).await?;

    let resumes: HashMap<Uuid, Resume> = store
        .get_resumes(&folder.processed_files)
        .await?
        .into_iter()
        .map(|r| (r.id, r))
        .collect();

    let applicants: Vec<Applicant> = folder
        .processed_files
        .iter()
        .map(|resume_id| new_applicant(*resume_id, resumes.get(resume_id), &report))
        .collect();

    if !applicants.is_empty() {
        store.insert_applicants(&applicants).await?;
    }

    report.results = applicants.iter().map(|a| a.id).collect();
    store.save_report(&report).await?;

    info!(
        "Report {} created for job {} / folder {} with {} applicants",
        report.id,
        job.id,
        folder.id,
        report.results.len()
    );
    Ok(report)
}

fn new_applicant(resume_id: Uuid, resume: Option<&Resume>, report: &Report) -> Applicant {
    let (name, social) = match resume {
        Some(resume) => (
            resume.display_name(),
            resume
                .extracted
                .as_ref()
                .map(|e| classify_links(&e.links))
                .unwrap_or_default(),
        ),
        None => {
            warn!("Processed resume {resume_id} is missing; applicant gets no profile data");
            ("Unnamed applicant".to_string(), SocialLinks::default())
        }
    };

    Applicant {
        id: Uuid::new_v4(),
        resume_id,
        job_id: report.job_id,
        report_id: report.id,
        created_by: report.user_id,
        name,
        status: ApplicantStatus::Pending,
        social,
        authentication: Vec::new(),
        verdict: None,
        score: None,
        failure_reason: None,
        created_at: Utc::now(),
    }
}

/// Allowed for the report's creator or the job's creator. The id leaves the
/// job's `reports` list before the report document goes.
pub async fn delete_report(store: &dyn Store, user_id: Uuid, report_id: Uuid) -> Result<(), AppError> {
    let report = store
        .get_report(report_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Report not found".to_string()))?;
    let job = store
        .get_job(report.job_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Associated job not found".to_string()))?;

    if job.created_by != user_id && report.user_id != user_id {
        return Err(AppError::Forbidden(
            "You are not allowed to delete this report".to_string(),
        ));
    }

    store.pull_job_report(job.id, report.id).await?;
    let removed = store.delete_applicants_for_report(report.id).await?;
    store.delete_report(report.id).await?;

    info!("Report {} deleted with {removed} applicants", report.id);
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Queries
// ────────────────────────────────────────────────────────────────────────────

pub async fn list_reports(store: &dyn Store, user_id: Uuid) -> Result<Vec<Report>, AppError> {
    Ok(store.reports_for_user(user_id).await?)
}

async fn load_visible_report(
    store: &dyn Store,
    user_id: Uuid,
    report_id: Uuid,
) -> Result<(Report, Option<Job>), AppError> {
    let report = store
        .get_report(report_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Report not found".to_string()))?;
    let job = store.get_job(report.job_id).await?;

    let is_job_owner = job.as_ref().is_some_and(|j| j.created_by == user_id);
    if report.user_id != user_id && !is_job_owner {
        return Err(AppError::Forbidden(
            "You are not allowed to view this report".to_string(),
        ));
    }
    Ok((report, job))
}

pub async fn get_report(
    store: &dyn Store,
    user_id: Uuid,
    report_id: Uuid,
) -> Result<ReportDetail, AppError> {
    let (report, _) = load_visible_report(store, user_id, report_id).await?;
    let applicants = store.applicants_for_report(report.id).await?;
    Ok(ReportDetail { report, applicants })
}

/// Job creator only.
pub async fn reports_for_job(
    store: &dyn Store,
    user_id: Uuid,
    job_id: Uuid,
) -> Result<Vec<Report>, AppError> {
    store
        .get_job(job_id)
        .await?
        .filter(|j| j.created_by == user_id)
        .ok_or_else(|| AppError::Forbidden("Access denied or job not found".to_string()))?;
    Ok(store.reports_for_job(job_id).await?)
}

// ────────────────────────────────────────────────────────────────────────────
// Evaluation
// ────────────────────────────────────────────────────────────────────────────

/// Scores every applicant of the report against its job and priority vector.
/// The report moves PROCESSING → DONE, or FAILED when its data cannot be
/// loaded. Applicants come back ranked by score, best first.
pub async fn evaluate_report(
    store: &dyn Store,
    scorer: &dyn ApplicantScorer,
    user_id: Uuid,
    report_id: Uuid,
) -> Result<ReportDetail, AppError> {
    let mut report = store
        .get_report(report_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Report not found".to_string()))?;
    if report.user_id != user_id {
        return Err(AppError::Forbidden(
            "Only the report's creator can evaluate it".to_string(),
        ));
    }

    report.status = ReportStatus::Processing;
    store.save_report(&report).await?;

    let scored = score_applicants(store, scorer, &report).await;
    report.status = if scored.is_ok() {
        ReportStatus::Done
    } else {
        ReportStatus::Failed
    };
    store.save_report(&report).await?;

    let mut applicants = scored.inspect_err(|e| {
        warn!("Evaluation of report {} failed: {e}", report.id);
    })?;
    applicants.sort_by(|a, b| {
        b.score
            .unwrap_or(0.0)
            .total_cmp(&a.score.unwrap_or(0.0))
    });

    info!(
        "Report {} evaluated: {} applicants scored",
        report.id,
        applicants.len()
    );
    Ok(ReportDetail { report, applicants })
}

async fn score_applicants(
    store: &dyn Store,
    scorer: &dyn ApplicantScorer,
    report: &Report,
) -> Result<Vec<Applicant>, AppError> {
    let job = store
        .get_job(report.job_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;
    let mut applicants = store.applicants_for_report(report.id).await?;

    let resume_ids: Vec<Uuid> = applicants.iter().map(|a| a.resume_id).collect();
    let resumes: HashMap<Uuid, Resume> = store
        .get_resumes(&resume_ids)
        .await?
        .into_iter()
        .map(|r| (r.id, r))
        .collect();

    for applicant in &mut applicants {
        let Some(resume) = resumes.get(&applicant.resume_id) else {
            warn!(
                "Applicant {} has no resume {}; left unscored",
                applicant.id, applicant.resume_id
            );
            continue;
        };
        let evaluation = scorer.score(resume, &job, &report.priority).await?;
        applicant.score = Some(evaluation.score);
        applicant.verdict = Some(evaluation.verdict);
        store.save_applicant(applicant).await?;
    }

    Ok(applicants)
}
