use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::UnknownStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Pending,
    Processing,
    Done,
    Failed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "PENDING",
            ReportStatus::Processing => "PROCESSING",
            ReportStatus::Done => "DONE",
            ReportStatus::Failed => "FAILED",
        }
    }
}

impl FromStr for ReportStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ReportStatus::Pending),
            "PROCESSING" => Ok(ReportStatus::Processing),
            "DONE" => Ok(ReportStatus::Done),
            "FAILED" => Ok(ReportStatus::Failed),
            other => Err(UnknownStatus {
                kind: "report",
                value: other.to_string(),
            }),
        }
    }
}

/// Validated five-way weighting. Fields are non-negative and sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Priority {
    pub skills: f64,
    pub experience: f64,
    pub location: f64,
    pub qualifications: f64,
    pub projects: f64,
}

impl Priority {
    pub fn total(&self) -> f64 {
        self.skills + self.experience + self.location + self.qualifications + self.projects
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub folder_id: Uuid,
    pub user_id: Uuid,
    pub job_id: Uuid,
    pub priority: Priority,
    pub priority_hash: String,
    pub status: ReportStatus,
    pub results: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}
