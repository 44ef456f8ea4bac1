pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::applicants::handlers as applicants;
use crate::folders::handlers as folders;
use crate::jobs::handlers as jobs;
use crate::reports::handlers as reports;
use crate::state::AppState;

/// Upper bound for a single resume upload.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Caller identity for read and delete routes.
#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Folders & resumes
        .route(
            "/api/v1/folders",
            get(folders::handle_list_folders).post(folders::handle_create_folder),
        )
        .route(
            "/api/v1/folders/:id",
            get(folders::handle_get_folder)
                .patch(folders::handle_rename_folder)
                .delete(folders::handle_delete_folder),
        )
        .route(
            "/api/v1/folders/:id/resumes",
            post(folders::handle_upload_resume).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/api/v1/resumes/:id",
            delete(folders::handle_delete_resume),
        )
        // Jobs
        .route(
            "/api/v1/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        .route(
            "/api/v1/jobs/:id",
            patch(jobs::handle_update_job).delete(jobs::handle_delete_job),
        )
        .route(
            "/api/v1/jobs/:id/reports",
            get(reports::handle_reports_for_job),
        )
        // Reports
        .route(
            "/api/v1/reports",
            get(reports::handle_list_reports).post(reports::handle_create_report),
        )
        .route(
            "/api/v1/reports/:id",
            get(reports::handle_get_report).delete(reports::handle_delete_report),
        )
        .route(
            "/api/v1/reports/:id/evaluate",
            post(reports::handle_evaluate_report),
        )
        // Applicants
        .route(
            "/api/v1/applicants/:id",
            get(applicants::handle_get_applicant),
        )
        .route(
            "/api/v1/applicants/:id/verify",
            post(applicants::handle_verify_applicant),
        )
        .with_state(state)
}
