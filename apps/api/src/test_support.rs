//! Fakes and seed helpers shared by the test modules.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use crate::artifact::{object_key_for, ArtifactError, ArtifactStore};
use crate::config::{Config, WorkerConfig};
use crate::enrichment::{EnrichmentService, PlatformResult};
use crate::extraction::{ExtractError, Extractor, TextAndMetadata};
use crate::ingestion::WorkerSignal;
use crate::models::applicant::SocialLinks;
use crate::models::folder::Folder;
use crate::models::job::Job;
use crate::models::resume::{ArtifactRef, Extracted, Resume, ResumeStatus};
use crate::reports::scoring::KeywordScorer;
use crate::state::AppState;
use crate::store::memory::MemoryStore;
use crate::store::Store;

// ────────────────────────────────────────────────────────────────────────────
// Extractor
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct ExtractorState {
    text: String,
    text_links: Vec<String>,
    annotation_links: Vec<String>,
    failures: u32,
    calls: u32,
}

#[derive(Default)]
pub struct FakeExtractor {
    state: Mutex<ExtractorState>,
}

impl FakeExtractor {
    pub fn returning(text: &str, text_links: &[&str], annotation_links: &[&str]) -> Self {
        Self {
            state: Mutex::new(ExtractorState {
                text: text.to_string(),
                text_links: text_links.iter().map(|s| s.to_string()).collect(),
                annotation_links: annotation_links.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }),
        }
    }

    pub fn fail_next(&self, n: u32) {
        self.state.lock().unwrap().failures = n;
    }

    pub fn calls(&self) -> u32 {
        self.state.lock().unwrap().calls
    }
}

#[async_trait]
impl Extractor for FakeExtractor {
    async fn extract_text_and_metadata(
        &self,
        _local_path: &Path,
    ) -> Result<TextAndMetadata, ExtractError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        if state.failures > 0 {
            state.failures -= 1;
            return Err(ExtractError::Text("corrupt xref table".to_string()));
        }
        Ok(TextAndMetadata {
            text: state.text.clone(),
            metadata: serde_json::json!({ "page_count": 1 }),
            text_links: state.text_links.clone(),
        })
    }

    async fn extract_hyperlinks(&self, _local_path: &Path) -> Result<Vec<String>, ExtractError> {
        Ok(self.state.lock().unwrap().annotation_links.clone())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Artifact store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct ArtifactsState {
    upload_failure: Option<String>,
    uploads: u32,
    failing_deletes: HashSet<String>,
    delete_attempts: Vec<String>,
}

#[derive(Default)]
pub struct FakeArtifacts {
    state: Mutex<ArtifactsState>,
}

impl FakeArtifacts {
    pub fn fail_uploads_with(&self, reason: &str) {
        self.state.lock().unwrap().upload_failure = Some(reason.to_string());
    }

    pub fn fail_deletes_for(&self, public_id: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_deletes
            .insert(public_id.to_string());
    }

    pub fn uploads(&self) -> u32 {
        self.state.lock().unwrap().uploads
    }

    pub fn delete_attempts(&self) -> usize {
        self.state.lock().unwrap().delete_attempts.len()
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.state.lock().unwrap().delete_attempts.clone()
    }
}

#[async_trait]
impl ArtifactStore for FakeArtifacts {
    async fn upload(&self, local_path: &Path) -> Result<ArtifactRef, ArtifactError> {
        let mut state = self.state.lock().unwrap();
        if let Some(reason) = &state.upload_failure {
            return Err(ArtifactError::Upload(reason.clone()));
        }
        state.uploads += 1;
        let key = object_key_for(local_path);
        Ok(ArtifactRef {
            url: format!("https://artifacts.test/{key}"),
            public_id: key,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), ArtifactError> {
        let mut state = self.state.lock().unwrap();
        state.delete_attempts.push(public_id.to_string());
        if state.failing_deletes.contains(public_id) {
            return Err(ArtifactError::Delete("bucket unreachable".to_string()));
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Enrichment
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeEnrichment {
    results: Mutex<Vec<PlatformResult>>,
    calls: Mutex<u32>,
}

impl FakeEnrichment {
    pub fn respond_with(&self, results: Vec<PlatformResult>) {
        *self.results.lock().unwrap() = results;
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl EnrichmentService for FakeEnrichment {
    async fn fetch_all_profiles(&self, _social: &SocialLinks) -> Vec<PlatformResult> {
        *self.calls.lock().unwrap() += 1;
        self.results.lock().unwrap().clone()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// App state
// ────────────────────────────────────────────────────────────────────────────

pub fn test_config(upload_dir: &Path) -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        s3_bucket: "resumes-test".to_string(),
        s3_endpoint: "http://localhost:9000".to_string(),
        aws_access_key_id: "test".to_string(),
        aws_secret_access_key: "test".to_string(),
        github_token: None,
        upload_dir: upload_dir.to_path_buf(),
        port: 0,
        rust_log: "debug".to_string(),
        worker: WorkerConfig::default(),
        resume_max_retries: 3,
        enrichment_timeout: Duration::from_secs(5),
    }
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub artifacts: Arc<FakeArtifacts>,
    pub enrichment: Arc<FakeEnrichment>,
    pub signal: WorkerSignal,
    // Held so the upload directory outlives the test.
    pub upload_dir: TempDir,
}

pub fn test_app() -> TestApp {
    let upload_dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new());
    let artifacts = Arc::new(FakeArtifacts::default());
    let enrichment = Arc::new(FakeEnrichment::default());
    let signal = WorkerSignal::default();

    let state = AppState {
        store: store.clone(),
        artifacts: artifacts.clone(),
        enrichment: enrichment.clone(),
        scorer: Arc::new(KeywordScorer),
        worker: signal.clone(),
        config: test_config(upload_dir.path()),
    };

    TestApp {
        state,
        store,
        artifacts,
        enrichment,
        signal,
        upload_dir,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Seeds
// ────────────────────────────────────────────────────────────────────────────

pub async fn seed_folder(store: &dyn Store, user_id: Uuid) -> Folder {
    let folder = Folder::new(user_id, "Backend hiring");
    store.insert_folder(&folder).await.unwrap();
    folder
}

pub async fn seed_job(store: &dyn Store, user_id: Uuid) -> Job {
    let job = Job {
        id: Uuid::new_v4(),
        title: "Backend Engineer".to_string(),
        description: Some("Services in Rust".to_string()),
        location: "Berlin".to_string(),
        vacancies: 2,
        skill_required: vec!["rust".to_string(), "postgres".to_string()],
        experience_required: Some(3.0),
        reports: Vec::new(),
        created_by: user_id,
        created_at: chrono::Utc::now(),
    };
    store.insert_job(&job).await.unwrap();
    job
}

/// Inserts a resume already through the pipeline: DONE, with an artifact,
/// and listed in both `total_files` and `processed_files`.
pub async fn seed_done_resume(
    store: &dyn Store,
    folder_id: Uuid,
    original_name: &str,
    text: &str,
    links: &[&str],
) -> Resume {
    let mut resume = Resume::new_pending(folder_id, original_name, "/nonexistent", 3);
    let key = format!("resumes/{}.pdf", resume.id);
    resume.mark_done(
        Extracted {
            text: text.to_string(),
            links: links.iter().map(|s| s.to_string()).collect(),
            metadata: serde_json::json!({}),
        },
        ArtifactRef {
            url: format!("https://artifacts.test/{key}"),
            public_id: key,
        },
    );
    assert_eq!(resume.status, ResumeStatus::Done);
    store.insert_resume(&resume).await.unwrap();
    store.push_total_file(folder_id, resume.id).await.unwrap();
    store.add_processed_file(folder_id, resume.id).await.unwrap();
    resume
}

/// Inserts a PENDING resume backed by a real file in `dir`, named
/// `{resume.id}.pdf` so the artifact key is `resumes/{resume.id}.pdf`.
pub async fn seed_pending_resume(store: &dyn Store, folder_id: Uuid, dir: &Path) -> Resume {
    let mut resume = Resume::new_pending(folder_id, "candidate.pdf", String::new(), 3);
    let local_path = dir.join(format!("{}.pdf", resume.id));
    tokio::fs::write(&local_path, b"%PDF-1.5 fake").await.unwrap();
    resume.local_path = local_path.display().to_string();
    store.insert_resume(&resume).await.unwrap();
    store.push_total_file(folder_id, resume.id).await.unwrap();
    resume
}

// ────────────────────────────────────────────────────────────────────────────
// HTTP
// ────────────────────────────────────────────────────────────────────────────

/// Sends one JSON request through the router; returns the status code and
/// the parsed body (`Null` when the body is not JSON).
pub async fn send_json(
    router: Router,
    method: Method,
    uri: String,
    body: Option<Value>,
) -> (u16, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(v) => Body::from(v.to_string()),
            None => Body::empty(),
        })
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    let status = response.status().as_u16();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}
