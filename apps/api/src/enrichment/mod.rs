//! Enrichment service — fetches third-party profile stats for an applicant's
//! declared links.
//!
//! Every supplied platform produces exactly one [`PlatformResult`]. A platform
//! that fails (network, non-2xx, unexpected payload, even a panicking task)
//! becomes an `error` entry carrying its own platform name; the batch as a
//! whole never fails.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::models::applicant::SocialLinks;

pub mod platforms;

pub use platforms::HttpEnrichment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Github,
    Leetcode,
    Codeforces,
    Codechef,
    Gfg,
    Linkedin,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Github => "github",
            Platform::Leetcode => "leetcode",
            Platform::Codeforces => "codeforces",
            Platform::Codechef => "codechef",
            Platform::Gfg => "gfg",
            Platform::Linkedin => "linkedin",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one platform lookup, discriminated by `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PlatformOutcome {
    Ok {
        username: String,
        stats: Map<String, Value>,
    },
    Error {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformResult {
    pub platform: Platform,
    pub profile_url: String,
    pub outcome: PlatformOutcome,
}

impl PlatformResult {
    pub fn ok(
        platform: Platform,
        profile_url: impl Into<String>,
        username: impl Into<String>,
        stats: Map<String, Value>,
    ) -> Self {
        Self {
            platform,
            profile_url: profile_url.into(),
            outcome: PlatformOutcome::Ok {
                username: username.into(),
                stats,
            },
        }
    }

    pub fn error(platform: Platform, profile_url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            platform,
            profile_url: profile_url.into(),
            outcome: PlatformOutcome::Error {
                reason: reason.into(),
            },
        }
    }

    /// A lookup that succeeded and returned at least one stat.
    pub fn is_authenticated(&self) -> bool {
        matches!(&self.outcome, PlatformOutcome::Ok { stats, .. } if !stats.is_empty())
    }
}

#[async_trait]
pub trait EnrichmentService: Send + Sync {
    /// One entry per platform present in `social`, in declaration order.
    async fn fetch_all_profiles(&self, social: &SocialLinks) -> Vec<PlatformResult>;
}

/// `(platform, url)` pairs for every profile link present, in a fixed order.
pub fn declared_profiles(social: &SocialLinks) -> Vec<(Platform, String)> {
    [
        (Platform::Github, &social.github),
        (Platform::Leetcode, &social.leetcode),
        (Platform::Codeforces, &social.codeforces),
        (Platform::Codechef, &social.codechef),
        (Platform::Gfg, &social.gfg),
        (Platform::Linkedin, &social.linkedin),
    ]
    .into_iter()
    .filter_map(|(platform, url)| url.clone().map(|url| (platform, url)))
    .collect()
}

/// Awaits every spawned lookup. A task that panicked or was cancelled turns
/// into an error entry for its platform.
pub(crate) async fn settle_all(
    tasks: Vec<(Platform, String, JoinHandle<PlatformResult>)>,
) -> Vec<PlatformResult> {
    let mut results = Vec::with_capacity(tasks.len());
    for (platform, url, handle) in tasks {
        match handle.await {
            Ok(result) => results.push(result),
            Err(e) => {
                warn!("{platform} lookup task aborted: {e}");
                results.push(PlatformResult::error(platform, url, "Failed to fetch"));
            }
        }
    }
    results
}
