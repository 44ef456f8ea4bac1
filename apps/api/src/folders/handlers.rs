use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::{ApiResponse, AppError};
use crate::folders::service::{self, FolderDeletion, FolderDetail};
use crate::models::folder::Folder;
use crate::models::resume::Resume;
use crate::routes::UserIdQuery;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct FolderTitleBody {
    pub user_id: Uuid,
    pub title: String,
}

/// POST /api/v1/folders
pub async fn handle_create_folder(
    State(state): State<AppState>,
    Json(body): Json<FolderTitleBody>,
) -> Result<(StatusCode, Json<ApiResponse<Folder>>), AppError> {
    let folder = service::create_folder(state.store.as_ref(), body.user_id, &body.title).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message("Folder created", folder),
    ))
}

/// GET /api/v1/folders
pub async fn handle_list_folders(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ApiResponse<Vec<Folder>>>, AppError> {
    let folders = service::list_folders(state.store.as_ref(), params.user_id).await?;
    Ok(ApiResponse::ok(folders))
}

/// GET /api/v1/folders/:id
pub async fn handle_get_folder(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ApiResponse<FolderDetail>>, AppError> {
    let detail = service::get_folder(state.store.as_ref(), params.user_id, id).await?;
    Ok(ApiResponse::with_message("Folder fetched successfully", detail))
}

/// PATCH /api/v1/folders/:id
pub async fn handle_rename_folder(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<FolderTitleBody>,
) -> Result<Json<ApiResponse<Folder>>, AppError> {
    let folder =
        service::rename_folder(state.store.as_ref(), body.user_id, id, &body.title).await?;
    Ok(ApiResponse::with_message("Folder updated", folder))
}

/// DELETE /api/v1/folders/:id
pub async fn handle_delete_folder(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ApiResponse<FolderDeletion>>, AppError> {
    let outcome = service::delete_folder(
        state.store.as_ref(),
        state.artifacts.as_ref(),
        params.user_id,
        id,
    )
    .await?;
    Ok(ApiResponse::with_message("Folder deleted successfully", outcome))
}

/// POST /api/v1/folders/:id/resumes  (multipart, field `file`)
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    Path(folder_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<Resume>>), AppError> {
    let mut upload: Option<(String, Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("resume.pdf").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?;
        upload = Some((name, bytes));
        break;
    }

    let (name, bytes) =
        upload.ok_or_else(|| AppError::Validation("No resume file uploaded".to_string()))?;

    let resume = service::upload_resume(
        state.store.as_ref(),
        &state.worker,
        &state.config,
        params.user_id,
        folder_id,
        &name,
        &bytes,
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message("Resume uploaded", resume),
    ))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ApiResponse<Option<()>>>, AppError> {
    service::delete_resume(
        state.store.as_ref(),
        state.artifacts.as_ref(),
        params.user_id,
        id,
    )
    .await?;
    Ok(ApiResponse::with_message("Resume deleted successfully", None))
}
