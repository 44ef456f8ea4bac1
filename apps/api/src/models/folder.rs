use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recruiter-owned bucket of uploaded resumes.
///
/// `processed_files` is always a subset of `total_files`; ids are added to it
/// with set semantics when the worker finishes a resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: Uuid,
    pub title: String,
    pub user_id: Uuid,
    pub total_files: Vec<Uuid>,
    pub processed_files: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Folder {
    pub fn new(user_id: Uuid, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            user_id,
            total_files: Vec::new(),
            processed_files: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}
