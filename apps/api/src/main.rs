mod applicants;
mod artifact;
mod config;
mod db;
mod enrichment;
mod errors;
mod extraction;
mod folders;
mod ingestion;
mod jobs;
mod models;
mod reports;
mod routes;
mod state;
mod store;
#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::artifact::S3ArtifactStore;
use crate::config::Config;
use crate::db::create_pool;
use crate::enrichment::HttpEnrichment;
use crate::extraction::PdfExtractor;
use crate::ingestion::{ResumeWorker, WorkerHandle};
use crate::reports::scoring::KeywordScorer;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::postgres::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Screener API v{}", env!("CARGO_PKG_VERSION"));

    // PostgreSQL (migrations run on connect)
    let pool = create_pool(&config.database_url).await?;
    let store = Arc::new(PgStore::new(pool));

    // S3 / MinIO
    let s3 = build_s3_client(&config).await;
    let artifacts = Arc::new(S3ArtifactStore::new(
        s3,
        config.s3_bucket.clone(),
        &config.s3_endpoint,
    ));
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("Cannot create upload dir {}", config.upload_dir.display()))?;

    // Ingestion worker: one task per process, woken by uploads
    let worker = ResumeWorker::new(store.clone(), Arc::new(PdfExtractor), artifacts.clone());
    let worker = WorkerHandle::spawn(worker, config.worker.clone());

    let enrichment = HttpEnrichment::new(config.enrichment_timeout, config.github_token.clone())?;
    if config.github_token.is_none() {
        info!("GITHUB_TOKEN not set; GitHub lookups are unauthenticated");
    }

    let state = AppState {
        store,
        artifacts,
        enrichment: Arc::new(enrichment),
        scorer: Arc::new(KeywordScorer),
        worker: worker.signal(),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped; waiting for resume worker");
    worker.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "screener-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
