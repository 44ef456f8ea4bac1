use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enrichment::PlatformResult;
use crate::models::UnknownStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicantStatus {
    Pending,
    Unverified,
    Processing,
    Verified,
    Failed,
}

impl ApplicantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicantStatus::Pending => "PENDING",
            ApplicantStatus::Unverified => "UNVERIFIED",
            ApplicantStatus::Processing => "PROCESSING",
            ApplicantStatus::Verified => "VERIFIED",
            ApplicantStatus::Failed => "FAILED",
        }
    }
}

impl FromStr for ApplicantStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ApplicantStatus::Pending),
            "UNVERIFIED" => Ok(ApplicantStatus::Unverified),
            "PROCESSING" => Ok(ApplicantStatus::Processing),
            "VERIFIED" => Ok(ApplicantStatus::Verified),
            "FAILED" => Ok(ApplicantStatus::Failed),
            other => Err(UnknownStatus {
                kind: "applicant",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    StrongFit,
    PotentialFit,
    WeakFit,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::StrongFit => "STRONG_FIT",
            Verdict::PotentialFit => "POTENTIAL_FIT",
            Verdict::WeakFit => "WEAK_FIT",
        }
    }

    pub fn from_score(score: f64) -> Self {
        if score >= 70.0 {
            Verdict::StrongFit
        } else if score >= 40.0 {
            Verdict::PotentialFit
        } else {
            Verdict::WeakFit
        }
    }
}

impl FromStr for Verdict {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STRONG_FIT" => Ok(Verdict::StrongFit),
            "POTENTIAL_FIT" => Ok(Verdict::PotentialFit),
            "WEAK_FIT" => Ok(Verdict::WeakFit),
            other => Err(UnknownStatus {
                kind: "verdict",
                value: other.to_string(),
            }),
        }
    }
}

/// Profile links declared on the resume, bucketed by platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    pub github: Option<String>,
    pub leetcode: Option<String>,
    pub codeforces: Option<String>,
    pub codechef: Option<String>,
    pub gfg: Option<String>,
    pub linkedin: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub other_links: Vec<String>,
}

impl SocialLinks {
    /// True when no platform the enrichment service understands is present.
    pub fn has_no_profiles(&self) -> bool {
        self.github.is_none()
            && self.leetcode.is_none()
            && self.codeforces.is_none()
            && self.codechef.is_none()
            && self.gfg.is_none()
            && self.linkedin.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Applicant {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub job_id: Uuid,
    /// The report this applicant was fanned out for.
    pub report_id: Uuid,
    pub created_by: Uuid,
    pub name: String,
    pub status: ApplicantStatus,
    pub social: SocialLinks,
    pub authentication: Vec<PlatformResult>,
    pub verdict: Option<Verdict>,
    pub score: Option<f64>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}
