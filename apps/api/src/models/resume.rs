use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::UnknownStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResumeStatus {
    Pending,
    Processing,
    Done,
    Failed,
}

impl ResumeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResumeStatus::Pending => "PENDING",
            ResumeStatus::Processing => "PROCESSING",
            ResumeStatus::Done => "DONE",
            ResumeStatus::Failed => "FAILED",
        }
    }
}

impl FromStr for ResumeStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ResumeStatus::Pending),
            "PROCESSING" => Ok(ResumeStatus::Processing),
            "DONE" => Ok(ResumeStatus::Done),
            "FAILED" => Ok(ResumeStatus::Failed),
            other => Err(UnknownStatus {
                kind: "resume",
                value: other.to_string(),
            }),
        }
    }
}

/// Where the uploaded binary lives in the artifact store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub url: String,
    pub public_id: String,
}

/// Content pulled out of the PDF by the extraction step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extracted {
    pub text: String,
    pub links: Vec<String>,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resume {
    pub id: Uuid,
    pub folder_id: Uuid,
    pub original_name: String,
    pub local_path: String,
    pub status: ResumeStatus,
    pub retries: i32,
    pub max_retries: i32,
    pub error_reason: Option<String>,
    pub artifact: Option<ArtifactRef>,
    pub extracted: Option<Extracted>,
    pub created_at: DateTime<Utc>,
}

impl Resume {
    pub fn new_pending(
        folder_id: Uuid,
        original_name: impl Into<String>,
        local_path: impl Into<String>,
        max_retries: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            folder_id,
            original_name: original_name.into(),
            local_path: local_path.into(),
            status: ResumeStatus::Pending,
            retries: 0,
            max_retries,
            error_reason: None,
            artifact: None,
            extracted: None,
            created_at: Utc::now(),
        }
    }

    pub fn mark_done(&mut self, extracted: Extracted, artifact: ArtifactRef) {
        self.extracted = Some(extracted);
        self.artifact = Some(artifact);
        self.status = ResumeStatus::Done;
    }

    /// Bumps `retries`, records the reason and picks the next status:
    /// FAILED once `retries >= max_retries`, otherwise back to PENDING.
    pub fn record_failure(&mut self, reason: impl Into<String>) -> ResumeStatus {
        self.retries += 1;
        self.error_reason = Some(reason.into());
        self.status = if self.retries >= self.max_retries {
            ResumeStatus::Failed
        } else {
            ResumeStatus::Pending
        };
        self.status
    }

    /// File stem of the uploaded name, used as the applicant's display name.
    pub fn display_name(&self) -> String {
        std::path::Path::new(&self.original_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("Unnamed applicant")
            .to_string()
    }
}
