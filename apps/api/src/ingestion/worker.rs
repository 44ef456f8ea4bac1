//! One pass of the resume pipeline: claim → extract → upload → persist.
//!
//! Every failure after a successful claim is converted into a retry bump on
//! the resume. Nothing here returns an error to the caller; the outcome is
//! reported as a [`Tick`] so the scheduler can pick the right pause.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::artifact::{ArtifactError, ArtifactStore};
use crate::extraction::links::union_links;
use crate::extraction::{ExtractError, Extractor};
use crate::models::resume::{Extracted, Resume, ResumeStatus};
use crate::store::{Store, StoreError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Upload(#[from] ArtifactError),

    #[error(transparent)]
    Persist(#[from] StoreError),
}

/// What a single claim attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// No PENDING resume was available.
    Idle,
    /// The claim query itself failed; nothing was mutated.
    ClaimFailed,
    /// A resume was claimed and left in `status`.
    Processed { resume_id: Uuid, status: ResumeStatus },
}

pub struct ResumeWorker {
    store: Arc<dyn Store>,
    extractor: Arc<dyn Extractor>,
    artifacts: Arc<dyn ArtifactStore>,
}

impl ResumeWorker {
    pub fn new(
        store: Arc<dyn Store>,
        extractor: Arc<dyn Extractor>,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            store,
            extractor,
            artifacts,
        }
    }

    pub async fn claim_and_process_next(&self) -> Tick {
        let mut resume = match self.store.claim_next_pending_resume().await {
            Ok(Some(resume)) => resume,
            Ok(None) => return Tick::Idle,
            Err(e) => {
                error!("Resume claim failed: {e}");
                return Tick::ClaimFailed;
            }
        };

        info!(
            "Processing resume {} ({}, attempt {})",
            resume.id,
            resume.original_name,
            resume.retries + 1
        );

        let status = match self.process(&mut resume).await {
            Ok(()) => {
                info!("Resume {} processed", resume.id);
                ResumeStatus::Done
            }
            Err(e) => self.record_failure(&mut resume, e).await,
        };

        Tick::Processed {
            resume_id: resume.id,
            status,
        }
    }

    async fn process(&self, resume: &mut Resume) -> Result<(), PipelineError> {
        let path = PathBuf::from(&resume.local_path);

        let content = self.extractor.extract_text_and_metadata(&path).await?;
        let annotation_links = self.extractor.extract_hyperlinks(&path).await?;

        let artifact = self.artifacts.upload(&path).await?;

        resume.mark_done(
            Extracted {
                text: content.text,
                links: union_links(annotation_links, content.text_links),
                metadata: content.metadata,
            },
            artifact,
        );

        self.store
            .add_processed_file(resume.folder_id, resume.id)
            .await?;
        self.store.save_resume(resume).await?;

        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!("Could not remove local file {}: {e}", path.display());
        }

        Ok(())
    }

    async fn record_failure(&self, resume: &mut Resume, err: PipelineError) -> ResumeStatus {
        let status = resume.record_failure(err.to_string());
        warn!(
            "Resume {} failed (retry {}/{}): {err} -> {}",
            resume.id,
            resume.retries,
            resume.max_retries,
            status.as_str()
        );

        if let Err(save_err) = self.store.save_resume(resume).await {
            error!(
                "Failed to save error state for resume {}: {save_err}",
                resume.id
            );
        }
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::test_support::{seed_folder, seed_pending_resume, FakeArtifacts, FakeExtractor};

    struct Harness {
        store: Arc<MemoryStore>,
        extractor: Arc<FakeExtractor>,
        artifacts: Arc<FakeArtifacts>,
        worker: ResumeWorker,
        dir: tempfile::TempDir,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        let extractor = Arc::new(FakeExtractor::returning(
            "Jane Doe, Rust engineer",
            &["https://x.com"],
            &["https://github.com/janedoe", "https://x.com"],
        ));
        let artifacts = Arc::new(FakeArtifacts::default());
        let worker = ResumeWorker::new(store.clone(), extractor.clone(), artifacts.clone());
        Harness {
            store,
            extractor,
            artifacts,
            worker,
            dir: tempfile::tempdir().unwrap(),
        }
    }

    #[tokio::test]
    async fn test_idle_when_nothing_pending() {
        let h = harness();
        assert_eq!(h.worker.claim_and_process_next().await, Tick::Idle);
        assert_eq!(h.extractor.calls(), 0);
    }

    #[tokio::test]
    async fn test_successful_run_marks_done_and_records_processed_file() {
        let h = harness();
        let folder = seed_folder(h.store.as_ref(), Uuid::new_v4()).await;
        let resume = seed_pending_resume(h.store.as_ref(), folder.id, h.dir.path()).await;

        let tick = h.worker.claim_and_process_next().await;
        assert_eq!(
            tick,
            Tick::Processed {
                resume_id: resume.id,
                status: ResumeStatus::Done
            }
        );

        let saved = h.store.get_resume(resume.id).await.unwrap().unwrap();
        assert_eq!(saved.status, ResumeStatus::Done);
        let extracted = saved.extracted.unwrap();
        assert_eq!(extracted.text, "Jane Doe, Rust engineer");
        assert_eq!(
            extracted.links,
            vec!["https://github.com/janedoe".to_string(), "https://x.com".to_string()]
        );
        assert_eq!(
            saved.artifact.unwrap().public_id,
            format!("resumes/{}.pdf", resume.id)
        );

        let folder = h.store.get_folder(folder.id).await.unwrap().unwrap();
        assert_eq!(folder.processed_files, vec![resume.id]);

        // Local temp file is cleaned up after success.
        assert!(!std::path::Path::new(&resume.local_path).exists());
    }

    #[tokio::test]
    async fn test_extraction_failure_returns_to_pending_then_fails_at_limit() {
        let h = harness();
        let folder = seed_folder(h.store.as_ref(), Uuid::new_v4()).await;
        let resume = seed_pending_resume(h.store.as_ref(), folder.id, h.dir.path()).await;
        h.extractor.fail_next(10);

        for expected in [ResumeStatus::Pending, ResumeStatus::Pending, ResumeStatus::Failed] {
            let tick = h.worker.claim_and_process_next().await;
            assert_eq!(
                tick,
                Tick::Processed {
                    resume_id: resume.id,
                    status: expected
                }
            );
        }

        let saved = h.store.get_resume(resume.id).await.unwrap().unwrap();
        assert_eq!(saved.status, ResumeStatus::Failed);
        assert_eq!(saved.retries, 3);
        assert_eq!(
            saved.error_reason.as_deref(),
            Some("PDF text extraction failed: corrupt xref table")
        );

        // FAILED is terminal: nothing left to claim.
        assert_eq!(h.worker.claim_and_process_next().await, Tick::Idle);
        let folder = h.store.get_folder(folder.id).await.unwrap().unwrap();
        assert!(folder.processed_files.is_empty());
    }

    #[tokio::test]
    async fn test_upload_failure_records_store_reason_and_skips_persist() {
        let h = harness();
        let folder = seed_folder(h.store.as_ref(), Uuid::new_v4()).await;
        let resume = seed_pending_resume(h.store.as_ref(), folder.id, h.dir.path()).await;
        h.artifacts.fail_uploads_with("quota exceeded");

        h.worker.claim_and_process_next().await;

        let saved = h.store.get_resume(resume.id).await.unwrap().unwrap();
        assert_eq!(saved.status, ResumeStatus::Pending);
        assert_eq!(saved.error_reason.as_deref(), Some("Upload failed: quota exceeded"));
        assert!(saved.artifact.is_none());
        assert!(saved.extracted.is_none());

        // File stays on disk for the retry.
        assert!(std::path::Path::new(&resume.local_path).exists());
        let folder = h.store.get_folder(folder.id).await.unwrap().unwrap();
        assert!(folder.processed_files.is_empty());
    }

    #[tokio::test]
    async fn test_claim_error_is_reported_without_mutation() {
        let h = harness();
        let folder = seed_folder(h.store.as_ref(), Uuid::new_v4()).await;
        let resume = seed_pending_resume(h.store.as_ref(), folder.id, h.dir.path()).await;
        h.store.fail_next_claims(1);

        assert_eq!(h.worker.claim_and_process_next().await, Tick::ClaimFailed);

        let untouched = h.store.get_resume(resume.id).await.unwrap().unwrap();
        assert_eq!(untouched.status, ResumeStatus::Pending);
        assert_eq!(untouched.retries, 0);
    }

    #[tokio::test]
    async fn test_save_failure_on_error_path_does_not_escalate() {
        let h = harness();
        let folder = seed_folder(h.store.as_ref(), Uuid::new_v4()).await;
        let resume = seed_pending_resume(h.store.as_ref(), folder.id, h.dir.path()).await;
        h.extractor.fail_next(1);
        h.store.fail_next_resume_saves(1);

        let tick = h.worker.claim_and_process_next().await;
        assert_eq!(
            tick,
            Tick::Processed {
                resume_id: resume.id,
                status: ResumeStatus::Pending
            }
        );

        // The save was lost, so the store still shows the claim.
        let stuck = h.store.get_resume(resume.id).await.unwrap().unwrap();
        assert_eq!(stuck.status, ResumeStatus::Processing);
    }

    #[tokio::test]
    async fn test_persist_failure_goes_through_retry_path() {
        let h = harness();
        let folder = seed_folder(h.store.as_ref(), Uuid::new_v4()).await;
        let resume = seed_pending_resume(h.store.as_ref(), folder.id, h.dir.path()).await;
        h.store.fail_next_processed_appends(1);

        h.worker.claim_and_process_next().await;
        let saved = h.store.get_resume(resume.id).await.unwrap().unwrap();
        assert_eq!(saved.status, ResumeStatus::Pending);
        assert_eq!(saved.retries, 1);

        // The retry succeeds and the folder lists the resume once.
        h.worker.claim_and_process_next().await;
        let saved = h.store.get_resume(resume.id).await.unwrap().unwrap();
        assert_eq!(saved.status, ResumeStatus::Done);
        let folder = h.store.get_folder(folder.id).await.unwrap().unwrap();
        assert_eq!(folder.processed_files, vec![resume.id]);
    }

    #[tokio::test]
    async fn test_completing_same_resume_twice_keeps_single_processed_entry() {
        let h = harness();
        let folder = seed_folder(h.store.as_ref(), Uuid::new_v4()).await;
        let resume = seed_pending_resume(h.store.as_ref(), folder.id, h.dir.path()).await;

        h.worker.claim_and_process_next().await;

        // Simulate a re-run after a crash between the save and the cleanup.
        let mut again = h.store.get_resume(resume.id).await.unwrap().unwrap();
        again.status = ResumeStatus::Pending;
        h.store.save_resume(&again).await.unwrap();
        tokio::fs::write(&resume.local_path, b"%PDF-1.5 fake").await.unwrap();
        h.worker.claim_and_process_next().await;

        let folder = h.store.get_folder(folder.id).await.unwrap().unwrap();
        assert_eq!(folder.processed_files, vec![resume.id]);
        assert_eq!(h.artifacts.uploads(), 2);
    }
}
