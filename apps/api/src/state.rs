use std::sync::Arc;

use crate::artifact::ArtifactStore;
use crate::config::Config;
use crate::enrichment::EnrichmentService;
use crate::ingestion::WorkerSignal;
use crate::reports::scoring::ApplicantScorer;
use crate::store::Store;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Remote home of uploaded PDFs. S3 / MinIO in production.
    pub artifacts: Arc<dyn ArtifactStore>,
    pub enrichment: Arc<dyn EnrichmentService>,
    /// Pluggable applicant scorer. Default: KeywordScorer.
    pub scorer: Arc<dyn ApplicantScorer>,
    /// Wakes the ingestion worker after an upload.
    pub worker: WorkerSignal,
    pub config: Config,
}
