use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::applicants::service;
use crate::errors::{ApiResponse, AppError};
use crate::models::applicant::Applicant;
use crate::routes::UserIdQuery;
use crate::state::AppState;

/// GET /api/v1/applicants/:id
pub async fn handle_get_applicant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ApiResponse<Applicant>>, AppError> {
    let applicant = service::get_applicant(state.store.as_ref(), params.user_id, id).await?;
    Ok(ApiResponse::ok(applicant))
}

/// POST /api/v1/applicants/:id/verify
pub async fn handle_verify_applicant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ApiResponse<Applicant>>, AppError> {
    let applicant = service::verify_applicant(
        state.store.as_ref(),
        state.enrichment.as_ref(),
        params.user_id,
        id,
    )
    .await?;
    Ok(ApiResponse::ok(applicant))
}
