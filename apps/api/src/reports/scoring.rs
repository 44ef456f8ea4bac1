//! Applicant scoring — rates a processed resume against a job along the five
//! priority dimensions, then weights the per-dimension matches by the
//! report's priority vector.
//!
//! Default: `KeywordScorer` (deterministic text matching over the extracted
//! resume text). `AppState` holds an `Arc<dyn ApplicantScorer>`.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::applicant::Verdict;
use crate::models::job::Job;
use crate::models::report::Priority;
use crate::models::resume::Resume;

// ────────────────────────────────────────────────────────────────────────────
// Output
// ────────────────────────────────────────────────────────────────────────────

/// Per-dimension match strength, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DimensionMatches {
    pub skills: f64,
    pub experience: f64,
    pub location: f64,
    pub qualifications: f64,
    pub projects: f64,
}

impl DimensionMatches {
    /// `Σ priority_i × match_i`, in `[0, 100]` for a valid priority vector.
    pub fn weighted_by(&self, priority: &Priority) -> f64 {
        priority.skills * self.skills
            + priority.experience * self.experience
            + priority.location * self.location
            + priority.qualifications * self.qualifications
            + priority.projects * self.projects
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: f64,
    pub verdict: Verdict,
    pub matches: DimensionMatches,
}

impl Evaluation {
    pub fn from_matches(matches: DimensionMatches, priority: &Priority) -> Self {
        let score = (matches.weighted_by(priority) * 100.0).round() / 100.0;
        Self {
            score,
            verdict: Verdict::from_score(score),
            matches,
        }
    }
}

#[async_trait]
pub trait ApplicantScorer: Send + Sync {
    async fn score(
        &self,
        resume: &Resume,
        job: &Job,
        priority: &Priority,
    ) -> Result<Evaluation, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// KeywordScorer
// ────────────────────────────────────────────────────────────────────────────

/// Keyword matching over the extracted text:
/// - skills: share of `skill_required` terms present
/// - experience: largest "N years" figure vs `experience_required`
/// - location: job location mentioned
/// - qualifications: degree terms 1.0, institution-only terms 0.5
/// - projects: repository links plus a "project" mention, saturating at 3
pub struct KeywordScorer;

#[async_trait]
impl ApplicantScorer for KeywordScorer {
    async fn score(
        &self,
        resume: &Resume,
        job: &Job,
        priority: &Priority,
    ) -> Result<Evaluation, AppError> {
        Ok(Evaluation::from_matches(keyword_matches(resume, job), priority))
    }
}

const DEGREE_TERMS: &[&str] = &[
    "bachelor", "master", "b.tech", "m.tech", "b.e.", "b.sc", "m.sc", "phd", "ph.d", "mba",
    "bca", "mca",
];
const INSTITUTION_TERMS: &[&str] = &["university", "college", "institute", "diploma"];
const REPOSITORY_HOSTS: &[&str] = &["github.com", "gitlab.com", "bitbucket.org"];
const PROJECT_EVIDENCE_CAP: f64 = 3.0;

pub fn keyword_matches(resume: &Resume, job: &Job) -> DimensionMatches {
    let (text, links) = match &resume.extracted {
        Some(extracted) => (extracted.text.to_lowercase(), extracted.links.as_slice()),
        None => return DimensionMatches::default(),
    };

    DimensionMatches {
        skills: skills_match(&text, &job.skill_required),
        experience: experience_match(&text, job.experience_required),
        location: location_match(&text, &job.location),
        qualifications: qualifications_match(&text),
        projects: projects_match(&text, links),
    }
}

fn skills_match(text: &str, required: &[String]) -> f64 {
    let skills: Vec<String> = required
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    if skills.is_empty() {
        return 1.0;
    }
    let found = skills.iter().filter(|s| contains_term(text, s)).count();
    found as f64 / skills.len() as f64
}

fn years_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{1,2})\+?\s*(?:years?|yrs?)").expect("valid regex"))
}

/// Largest "N years" figure in the text.
pub fn stated_years(text: &str) -> Option<f64> {
    years_re()
        .captures_iter(text)
        .filter_map(|c| c.get(1)?.as_str().parse::<f64>().ok())
        .fold(None, |best, n| Some(best.map_or(n, |b: f64| b.max(n))))
}

fn experience_match(text: &str, required: Option<f64>) -> f64 {
    match required {
        None => 1.0,
        Some(required) if required <= 0.0 => 1.0,
        Some(required) => stated_years(text)
            .map(|years| (years / required).min(1.0))
            .unwrap_or(0.0),
    }
}

fn location_match(text: &str, location: &str) -> f64 {
    let location = location.trim().to_lowercase();
    if location.is_empty() || contains_term(text, &location) {
        return 1.0;
    }
    // "Berlin, Germany" matches a resume that only says "Berlin".
    let any_part = location
        .split(|c: char| c == ',' || c == '/')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .any(|part| contains_term(text, part));
    if any_part {
        1.0
    } else {
        0.0
    }
}

fn qualifications_match(text: &str) -> f64 {
    if DEGREE_TERMS.iter().any(|t| contains_term(text, t)) {
        1.0
    } else if INSTITUTION_TERMS.iter().any(|t| contains_term(text, t)) {
        0.5
    } else {
        0.0
    }
}

fn projects_match(text: &str, links: &[String]) -> f64 {
    let repositories = links.iter().filter(|l| is_repository_link(l)).count() as f64;
    let mention = if text.contains("project") { 1.0 } else { 0.0 };
    ((repositories + mention) / PROJECT_EVIDENCE_CAP).min(1.0)
}

/// `host/owner/repo` on a known code host. A bare profile link does not count.
fn is_repository_link(link: &str) -> bool {
    let Ok(url) = Url::parse(link) else {
        return false;
    };
    let host = url.host_str().unwrap_or_default().trim_start_matches("www.");
    if !REPOSITORY_HOSTS.contains(&host) {
        return false;
    }
    url.path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).count() >= 2)
        .unwrap_or(false)
}

/// `term` occurs in `text` with no alphanumeric character directly on
/// either side, so "java" does not match inside "javascript".
fn contains_term(text: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }
    text.match_indices(term).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + term.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
