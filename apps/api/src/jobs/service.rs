//! Job postings: the target every report is scored against.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::Job;
use crate::store::Store;

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub vacancies: i32,
    #[serde(default)]
    pub skill_required: Vec<String>,
    pub experience_required: Option<f64>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateJobRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub vacancies: Option<i32>,
    pub skill_required: Option<Vec<String>>,
    pub experience_required: Option<f64>,
}

fn validate(job: &Job) -> Result<(), AppError> {
    if job.title.trim().is_empty() || job.location.trim().is_empty() {
        return Err(AppError::Validation("Missing required fields".to_string()));
    }
    if job.vacancies <= 0 {
        return Err(AppError::Validation(
            "Vacancies must be greater than zero".to_string(),
        ));
    }
    if job.experience_required.is_some_and(|y| !y.is_finite() || y < 0.0) {
        return Err(AppError::Validation(
            "Experience required cannot be negative".to_string(),
        ));
    }
    Ok(())
}

fn normalize_skills(skills: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(skills.len());
    for skill in skills {
        let skill = skill.trim().to_string();
        if !skill.is_empty() && !out.iter().any(|s| s.eq_ignore_ascii_case(&skill)) {
            out.push(skill);
        }
    }
    out
}

async fn owned_job(store: &dyn Store, user_id: Uuid, job_id: Uuid) -> Result<Job, AppError> {
    store
        .get_job(job_id)
        .await?
        .filter(|job| job.created_by == user_id)
        .ok_or_else(|| AppError::Forbidden("Job not found or access denied".to_string()))
}

pub async fn create_job(store: &dyn Store, user_id: Uuid, req: CreateJobRequest) -> Result<Job, AppError> {
    let job = Job {
        id: Uuid::new_v4(),
        title: req.title.trim().to_string(),
        description: req.description.filter(|d| !d.trim().is_empty()),
        location: req.location.trim().to_string(),
        vacancies: req.vacancies,
        skill_required: normalize_skills(req.skill_required),
        experience_required: req.experience_required,
        reports: Vec::new(),
        created_by: user_id,
        created_at: Utc::now(),
    };
    validate(&job)?;
    store.insert_job(&job).await?;
    info!("Job {} ({}) created by {user_id}", job.id, job.title);
    Ok(job)
}

pub async fn update_job(
    store: &dyn Store,
    user_id: Uuid,
    job_id: Uuid,
    patch: UpdateJobRequest,
) -> Result<Job, AppError> {
    let mut job = owned_job(store, user_id, job_id).await?;

    if let Some(title) = patch.title {
        job.title = title.trim().to_string();
    }
    if let Some(description) = patch.description {
        job.description = Some(description).filter(|d| !d.trim().is_empty());
    }
    if let Some(location) = patch.location {
        job.location = location.trim().to_string();
    }
    if let Some(vacancies) = patch.vacancies {
        job.vacancies = vacancies;
    }
    if let Some(skills) = patch.skill_required {
        job.skill_required = normalize_skills(skills);
    }
    if let Some(years) = patch.experience_required {
        job.experience_required = Some(years);
    }

    validate(&job)?;
    store.save_job(&job).await?;
    Ok(job)
}

/// Newest first.
pub async fn list_jobs(store: &dyn Store, user_id: Uuid) -> Result<Vec<Job>, AppError> {
    Ok(store.jobs_for_user(user_id).await?)
}

/// Deletes the job together with its reports and their applicants.
pub async fn delete_job(store: &dyn Store, user_id: Uuid, job_id: Uuid) -> Result<usize, AppError> {
    let job = owned_job(store, user_id, job_id).await?;
    let reports = store.reports_for_job(job.id).await?;

    for report in &reports {
        let removed = store.delete_applicants_for_report(report.id).await?;
        store.delete_report(report.id).await?;
        info!("Report {} removed with job {} ({removed} applicants)", report.id, job.id);
    }
    store.delete_job(job.id).await?;

    info!("Job {} deleted by {user_id}", job.id);
    Ok(reports.len())
}
