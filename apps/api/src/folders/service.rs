//! Folder and resume lifecycle outside the worker: create/rename/delete
//! folders, accept uploads, delete single resumes.
//!
//! Remote artifact and local file cleanup is always best-effort; a failed
//! delete is logged and the database records go regardless.

use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::artifact::{delete_best_effort, ArtifactStore};
use crate::config::Config;
use crate::errors::AppError;
use crate::ingestion::WorkerSignal;
use crate::models::folder::Folder;
use crate::models::resume::Resume;
use crate::store::Store;

const PDF_MAGIC: &[u8] = b"%PDF";

#[derive(Debug, Serialize)]
pub struct FolderDetail {
    #[serde(flatten)]
    pub folder: Folder,
    pub resumes: Vec<Resume>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FolderDeletion {
    pub resumes_removed: u64,
    pub artifact_delete_attempts: usize,
    pub artifact_delete_failures: usize,
}

fn require_title(title: &str) -> Result<&str, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Please provide a title".to_string()));
    }
    Ok(title)
}

/// Folder that exists and belongs to `user_id`.
async fn owned_folder(store: &dyn Store, user_id: Uuid, folder_id: Uuid) -> Result<Folder, AppError> {
    let folder = store
        .get_folder(folder_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Folder not found".to_string()))?;
    if !folder.is_owned_by(user_id) {
        return Err(AppError::Forbidden(
            "Folder not found or access denied".to_string(),
        ));
    }
    Ok(folder)
}

async fn remove_local_best_effort(path: &str) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove local file {path}: {e}"),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Folders
// ────────────────────────────────────────────────────────────────────────────

pub async fn create_folder(store: &dyn Store, user_id: Uuid, title: &str) -> Result<Folder, AppError> {
    let folder = Folder::new(user_id, require_title(title)?);
    store.insert_folder(&folder).await?;
    info!("Folder {} created for user {user_id}", folder.id);
    Ok(folder)
}

pub async fn list_folders(store: &dyn Store, user_id: Uuid) -> Result<Vec<Folder>, AppError> {
    Ok(store.folders_for_user(user_id).await?)
}

pub async fn get_folder(store: &dyn Store, user_id: Uuid, folder_id: Uuid) -> Result<FolderDetail, AppError> {
    let folder = owned_folder(store, user_id, folder_id).await?;
    let resumes = store.resumes_in_folder(folder.id).await?;
    Ok(FolderDetail { folder, resumes })
}

pub async fn rename_folder(
    store: &dyn Store,
    user_id: Uuid,
    folder_id: Uuid,
    title: &str,
) -> Result<Folder, AppError> {
    let title = require_title(title)?;
    let mut folder = owned_folder(store, user_id, folder_id).await?;
    store.rename_folder(folder.id, title).await?;
    folder.title = title.to_string();
    Ok(folder)
}

/// Deletes the folder and every resume in it. Remote artifacts are deleted
/// first (only for resumes that have one); their failures never stop the
/// database cleanup.
pub async fn delete_folder(
    store: &dyn Store,
    artifacts: &dyn ArtifactStore,
    user_id: Uuid,
    folder_id: Uuid,
) -> Result<FolderDeletion, AppError> {
    let folder = owned_folder(store, user_id, folder_id).await?;
    let resumes = store.resumes_in_folder(folder.id).await?;

    let mut attempts = 0;
    let mut failures = 0;
    for resume in &resumes {
        if let Some(artifact) = &resume.artifact {
            attempts += 1;
            if !delete_best_effort(artifacts, &artifact.public_id).await {
                failures += 1;
            }
        } else {
            // Never uploaded, so the local copy may still be on disk.
            remove_local_best_effort(&resume.local_path).await;
        }
    }

    let removed = store.delete_resumes_in_folder(folder.id).await?;
    store.delete_folder(folder.id).await?;

    info!(
        "Folder {} deleted: {removed} resumes, {failures}/{attempts} artifact deletes failed",
        folder.id
    );
    Ok(FolderDeletion {
        resumes_removed: removed,
        artifact_delete_attempts: attempts,
        artifact_delete_failures: failures,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Resumes
// ────────────────────────────────────────────────────────────────────────────

/// Stores the upload under `upload_dir`, records a PENDING resume and wakes
/// the ingestion worker.
pub async fn upload_resume(
    store: &dyn Store,
    signal: &WorkerSignal,
    config: &Config,
    user_id: Uuid,
    folder_id: Uuid,
    original_name: &str,
    bytes: &[u8],
) -> Result<Resume, AppError> {
    let folder = owned_folder(store, user_id, folder_id).await?;

    if bytes.is_empty() {
        return Err(AppError::Validation("No resume file uploaded".to_string()));
    }
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(AppError::Validation(
            "Only PDF resumes are accepted".to_string(),
        ));
    }

    let local_path = write_upload(&config.upload_dir, bytes).await?;
    let resume = Resume::new_pending(
        folder.id,
        original_name,
        local_path.display().to_string(),
        config.resume_max_retries,
    );
    store.insert_resume(&resume).await?;
    store.push_total_file(folder.id, resume.id).await?;

    info!(
        "Resume {} ({original_name}) queued in folder {}",
        resume.id, folder.id
    );
    signal.notify();
    Ok(resume)
}

async fn write_upload(upload_dir: &Path, bytes: &[u8]) -> Result<std::path::PathBuf, AppError> {
    tokio::fs::create_dir_all(upload_dir).await.map_err(|e| {
        AppError::Storage(format!("Cannot create {}: {e}", upload_dir.display()))
    })?;
    let path = upload_dir.join(format!("{}.pdf", Uuid::new_v4()));
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| AppError::Storage(format!("Cannot write {}: {e}", path.display())))?;
    Ok(path)
}

/// Owner of the resume's folder only.
pub async fn delete_resume(
    store: &dyn Store,
    artifacts: &dyn ArtifactStore,
    user_id: Uuid,
    resume_id: Uuid,
) -> Result<(), AppError> {
    let resume = store
        .get_resume(resume_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))?;
    let folder = owned_folder(store, user_id, resume.folder_id).await?;

    if let Some(artifact) = &resume.artifact {
        delete_best_effort(artifacts, &artifact.public_id).await;
    }
    store.pull_resume_from_folder(folder.id, resume.id).await?;
    remove_local_best_effort(&resume.local_path).await;
    store.delete_resume(resume.id).await?;

    info!("Resume {} deleted from folder {}", resume.id, folder.id);
    Ok(())
}
