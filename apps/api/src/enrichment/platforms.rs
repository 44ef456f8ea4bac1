//! HTTP lookups against each supported platform.
//!
//! Uses one shared `reqwest` client whose timeout bounds every request, so a
//! slow platform turns into an error entry instead of hanging the caller.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, Response, Url};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use super::{declared_profiles, settle_all, EnrichmentService, Platform, PlatformResult};
use crate::models::applicant::SocialLinks;

const CLIENT_USER_AGENT: &str = concat!("screener/", env!("CARGO_PKG_VERSION"));
const GITHUB_REPO_SAMPLE: u32 = 50;

const LEETCODE_SOLVED_QUERY: &str = r#"
query userProblemsSolved($username: String!) {
  matchedUser(username: $username) {
    submitStatsGlobal {
      acSubmissionNum {
        difficulty
        count
      }
    }
  }
}"#;

#[derive(Debug, Error)]
enum FetchError {
    #[error("Invalid {0} URL")]
    InvalidUrl(Platform),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{platform} responded with status {status}")]
    Status { platform: Platform, status: u16 },

    #[error("{0}")]
    Payload(String),

    #[error("LinkedIn scraping disabled (ToS & legal risk)")]
    Disabled,
}

/// Base URLs for each platform. Overridable so tests can point at a local server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub github_api: String,
    pub leetcode_graphql: String,
    pub codeforces_api: String,
    pub codechef_users: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            github_api: "https://api.github.com".to_string(),
            leetcode_graphql: "https://leetcode.com/graphql".to_string(),
            codeforces_api: "https://codeforces.com/api".to_string(),
            codechef_users: "https://www.codechef.com/users".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct HttpEnrichment {
    client: Client,
    github_token: Option<String>,
    endpoints: Arc<Endpoints>,
}

impl HttpEnrichment {
    pub fn new(timeout: Duration, github_token: Option<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(CLIENT_USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            github_token,
            endpoints: Arc::new(Endpoints::default()),
        })
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = Arc::new(endpoints);
        self
    }

    async fn lookup(&self, platform: Platform, url: &str) -> PlatformResult {
        let fetched = match username_from_url(url) {
            _ if platform == Platform::Linkedin => Err(FetchError::Disabled),
            None => Err(FetchError::InvalidUrl(platform)),
            Some(username) => self
                .fetch_stats(platform, &username, url)
                .await
                .map(|stats| (username, stats)),
        };

        match fetched {
            Ok((username, stats)) => {
                debug!("{platform} lookup for {username} returned {} stats", stats.len());
                PlatformResult::ok(platform, url, username, stats)
            }
            Err(e) => {
                warn!("{platform} lookup for {url} failed: {e}");
                PlatformResult::error(platform, url, e.to_string())
            }
        }
    }

    async fn fetch_stats(
        &self,
        platform: Platform,
        username: &str,
        url: &str,
    ) -> Result<Map<String, Value>, FetchError> {
        match platform {
            Platform::Github => self.github(username).await,
            Platform::Leetcode => self.leetcode(username).await,
            Platform::Codeforces => self.codeforces(username).await,
            Platform::Codechef => self.codechef(username).await,
            Platform::Gfg => self.gfg(url).await,
            Platform::Linkedin => Err(FetchError::Disabled),
        }
    }

    // ── GitHub ──────────────────────────────────────────────────────────────

    async fn github_get(&self, url: &str) -> Result<Value, FetchError> {
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, CLIENT_USER_AGENT);
        if let Some(token) = &self.github_token {
            request = request.bearer_auth(token);
        }
        let response = ensure_success(Platform::Github, request.send().await?)?;
        Ok(response.json().await?)
    }

    async fn github(&self, username: &str) -> Result<Map<String, Value>, FetchError> {
        let base = &self.endpoints.github_api;
        let profile = self.github_get(&format!("{base}/users/{username}")).await?;

        let mut stats = Map::new();
        copy_field(&mut stats, "followers", &profile["followers"]);
        copy_field(&mut stats, "publicRepos", &profile["public_repos"]);

        // Language usage is a bonus; a failed repo listing keeps the profile stats.
        let repos_url = format!("{base}/users/{username}/repos?per_page={GITHUB_REPO_SAMPLE}");
        match self.github_get(&repos_url).await {
            Ok(Value::Array(repos)) => {
                stats.insert("languages".to_string(), Value::Object(language_frequency(&repos)));
            }
            Ok(_) => {}
            Err(e) => warn!("GitHub repo listing for {username} failed: {e}"),
        }

        Ok(stats)
    }

    // ── LeetCode ────────────────────────────────────────────────────────────

    async fn leetcode(&self, username: &str) -> Result<Map<String, Value>, FetchError> {
        let body = json!({
            "query": LEETCODE_SOLVED_QUERY,
            "variables": { "username": username },
        });
        let response = self
            .client
            .post(&self.endpoints.leetcode_graphql)
            .json(&body)
            .send()
            .await?;
        let payload: Value = ensure_success(Platform::Leetcode, response)?.json().await?;

        let solved = payload["data"]["matchedUser"]["submitStatsGlobal"]["acSubmissionNum"]
            .as_array()
            .ok_or_else(|| FetchError::Payload(format!("LeetCode user '{username}' not found")))?;

        let mut stats = Map::new();
        for difficulty in ["Easy", "Medium", "Hard", "All"] {
            stats.insert(difficulty.to_string(), json!(0));
        }
        for entry in solved {
            if let (Some(difficulty), Some(count)) =
                (entry["difficulty"].as_str(), entry["count"].as_u64())
            {
                stats.insert(difficulty.to_string(), json!(count));
            }
        }
        Ok(stats)
    }

    // ── Codeforces ──────────────────────────────────────────────────────────

    async fn codeforces(&self, username: &str) -> Result<Map<String, Value>, FetchError> {
        let url = format!("{}/user.info", self.endpoints.codeforces_api);
        let response = self
            .client
            .get(url)
            .query(&[("handles", username)])
            .send()
            .await?;
        let payload: Value = ensure_success(Platform::Codeforces, response)?.json().await?;

        if payload["status"] != "OK" {
            let comment = payload["comment"].as_str().unwrap_or("unknown error");
            return Err(FetchError::Payload(format!("Codeforces: {comment}")));
        }
        let user = &payload["result"][0];
        if user.is_null() {
            return Err(FetchError::Payload(format!(
                "Codeforces user '{username}' not found"
            )));
        }

        let mut stats = Map::new();
        copy_field(&mut stats, "rating", &user["rating"]);
        copy_field(&mut stats, "maxRating", &user["maxRating"]);
        copy_field(&mut stats, "rank", &user["rank"]);
        copy_field(&mut stats, "contribution", &user["contribution"]);
        Ok(stats)
    }

    // ── CodeChef / GFG (profile markup) ─────────────────────────────────────

    async fn fetch_page(&self, platform: Platform, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        Ok(ensure_success(platform, response)?.text().await?)
    }

    async fn codechef(&self, username: &str) -> Result<Map<String, Value>, FetchError> {
        let url = format!("{}/{username}", self.endpoints.codechef_users);
        let page = self.fetch_page(Platform::Codechef, &url).await?;

        let mut stats = Map::new();
        stats.insert("rating".to_string(), json!(first_number(codechef_rating_re(), &page)));
        Ok(stats)
    }

    async fn gfg(&self, profile_url: &str) -> Result<Map<String, Value>, FetchError> {
        let page = self.fetch_page(Platform::Gfg, profile_url).await?;

        let mut stats = Map::new();
        stats.insert("score".to_string(), json!(first_number(gfg_score_re(), &page)));
        Ok(stats)
    }
}

#[async_trait]
impl EnrichmentService for HttpEnrichment {
    async fn fetch_all_profiles(&self, social: &SocialLinks) -> Vec<PlatformResult> {
        let tasks = declared_profiles(social)
            .into_iter()
            .map(|(platform, url)| {
                let this = self.clone();
                let task_url = url.clone();
                let handle = tokio::spawn(async move { this.lookup(platform, &task_url).await });
                (platform, url, handle)
            })
            .collect();
        settle_all(tasks).await
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn ensure_success(platform: Platform, response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(FetchError::Status {
            platform,
            status: status.as_u16(),
        })
    }
}

/// Last non-empty path segment of a profile URL.
fn username_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(str::to_string)
}

fn copy_field(stats: &mut Map<String, Value>, key: &str, value: &Value) {
    if !value.is_null() {
        stats.insert(key.to_string(), value.clone());
    }
}

/// Counts primary languages across non-fork repositories.
fn language_frequency(repos: &[Value]) -> Map<String, Value> {
    let mut counts: Map<String, Value> = Map::new();
    for repo in repos {
        if repo["fork"].as_bool().unwrap_or(false) {
            continue;
        }
        let Some(language) = repo["language"].as_str() else {
            continue;
        };
        let key = language.to_lowercase();
        let next = counts.get(&key).and_then(Value::as_u64).unwrap_or(0) + 1;
        counts.insert(key, json!(next));
    }
    counts
}

fn first_number(re: &Regex, page: &str) -> u64 {
    re.captures(page)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

fn codechef_rating_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"rating-number">(\d+)"#).expect("valid regex"))
}

fn gfg_score_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Overall Coding Score</div>\s*<div[^>]*>(\d+)").expect("valid regex")
    })
}
