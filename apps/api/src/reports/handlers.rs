use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::{ApiResponse, AppError};
use crate::models::report::Report;
use crate::reports::aggregator::{self, CreateReportRequest, ReportDetail};
use crate::routes::UserIdQuery;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateReportBody {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub report: CreateReportRequest,
}

/// POST /api/v1/reports
pub async fn handle_create_report(
    State(state): State<AppState>,
    Json(body): Json<CreateReportBody>,
) -> Result<(StatusCode, Json<ApiResponse<Report>>), AppError> {
    let report = aggregator::create_report(state.store.as_ref(), body.user_id, &body.report).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message("Report submitted successfully with applicants", report),
    ))
}

/// GET /api/v1/reports
pub async fn handle_list_reports(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ApiResponse<Vec<Report>>>, AppError> {
    let reports = aggregator::list_reports(state.store.as_ref(), params.user_id).await?;
    Ok(ApiResponse::ok(reports))
}

/// GET /api/v1/reports/:id
pub async fn handle_get_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ApiResponse<ReportDetail>>, AppError> {
    let detail = aggregator::get_report(state.store.as_ref(), params.user_id, id).await?;
    Ok(ApiResponse::ok(detail))
}

/// POST /api/v1/reports/:id/evaluate
pub async fn handle_evaluate_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ApiResponse<ReportDetail>>, AppError> {
    let detail = aggregator::evaluate_report(
        state.store.as_ref(),
        state.scorer.as_ref(),
        params.user_id,
        id,
    )
    .await?;
    Ok(ApiResponse::with_message("Report evaluated", detail))
}

/// DELETE /api/v1/reports/:id
pub async fn handle_delete_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ApiResponse<Option<()>>>, AppError> {
    aggregator::delete_report(state.store.as_ref(), params.user_id, id).await?;
    Ok(ApiResponse::with_message("Report deleted successfully", None))
}

/// GET /api/v1/jobs/:id/reports
pub async fn handle_reports_for_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ApiResponse<Vec<Report>>>, AppError> {
    let reports = aggregator::reports_for_job(state.store.as_ref(), params.user_id, job_id).await?;
    Ok(ApiResponse::ok(reports))
}
