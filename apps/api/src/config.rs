use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub github_token: Option<String>,
    pub upload_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
    pub worker: WorkerConfig,
    pub resume_max_retries: i32,
    pub enrichment_timeout: Duration,
}

/// Timing knobs for the resume ingestion worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Sleep after a claim attempt finds no PENDING resume.
    pub idle: Duration,
    /// Sleep after the claim itself errored.
    pub backoff: Duration,
    /// Pause between two processed resumes.
    pub yield_interval: Duration,
    /// Fallback re-trigger when no upload signal arrives.
    pub poll: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            idle: Duration::from_millis(2000),
            backoff: Duration::from_millis(3000),
            yield_interval: Duration::from_millis(300),
            poll: Duration::from_millis(5000),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = WorkerConfig::default();

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            github_token: std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()),
            upload_dir: std::env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "uploads".to_string())
                .into(),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            worker: WorkerConfig {
                idle: millis_env("WORKER_IDLE_MS", defaults.idle)?,
                backoff: millis_env("WORKER_BACKOFF_MS", defaults.backoff)?,
                yield_interval: millis_env("WORKER_YIELD_MS", defaults.yield_interval)?,
                poll: millis_env("WORKER_POLL_MS", defaults.poll)?,
            },
            resume_max_retries: retries_env("RESUME_MAX_RETRIES", 3)?,
            enrichment_timeout: Duration::from_secs(parse_env("ENRICHMENT_TIMEOUT_SECS", 30)?),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T: FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .ok()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

/// Retry budget: at least one attempt, or every first failure is terminal.
fn retries_env(key: &str, default: i32) -> Result<i32> {
    let retries: i32 = parse_env(key, default)?;
    anyhow::ensure!(retries >= 1, "{key} must be at least 1, got {retries}");
    Ok(retries)
}

fn millis_env(key: &str, default: Duration) -> Result<Duration> {
    let ms = parse_env(key, default.as_millis() as u64)?;
    Ok(Duration::from_millis(ms))
}
