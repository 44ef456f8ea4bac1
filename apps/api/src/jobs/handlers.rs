use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::{ApiResponse, AppError};
use crate::jobs::service::{self, CreateJobRequest, UpdateJobRequest};
use crate::models::job::Job;
use crate::routes::UserIdQuery;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateJobBody {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub job: CreateJobRequest,
}

#[derive(Deserialize)]
pub struct UpdateJobBody {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub patch: UpdateJobRequest,
}

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    Json(body): Json<CreateJobBody>,
) -> Result<(StatusCode, Json<ApiResponse<Job>>), AppError> {
    let job = service::create_job(state.store.as_ref(), body.user_id, body.job).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message("Job created successfully", job),
    ))
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ApiResponse<Vec<Job>>>, AppError> {
    let jobs = service::list_jobs(state.store.as_ref(), params.user_id).await?;
    Ok(ApiResponse::ok(jobs))
}

/// PATCH /api/v1/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateJobBody>,
) -> Result<Json<ApiResponse<Job>>, AppError> {
    let job = service::update_job(state.store.as_ref(), body.user_id, id, body.patch).await?;
    Ok(ApiResponse::with_message("Job updated", job))
}

/// DELETE /api/v1/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ApiResponse<Option<()>>>, AppError> {
    service::delete_job(state.store.as_ref(), params.user_id, id).await?;
    Ok(ApiResponse::with_message("Job and related reports deleted", None))
}
