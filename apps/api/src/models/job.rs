use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub vacancies: i32,
    pub skill_required: Vec<String>,
    /// Years of experience asked for.
    pub experience_required: Option<f64>,
    pub reports: Vec<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}
