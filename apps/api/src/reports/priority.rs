//! Priority vector validation and hashing.
//!
//! Validation works on the raw JSON so a missing field and a non-numeric one
//! get different messages. The first offending field (in declaration order)
//! is the one reported.

use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::models::report::Priority;

pub const PRIORITY_FIELDS: [&str; 5] = [
    "skills",
    "experience",
    "location",
    "qualifications",
    "projects",
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PriorityError {
    #[error("Priority field '{0}' is required")]
    Missing(&'static str),

    #[error("Priority field '{0}' must be a valid number")]
    NotANumber(&'static str),

    #[error("Priority field '{0}' cannot be negative")]
    Negative(&'static str),

    #[error("Priority total must be exactly 100. Received {0}")]
    Total(f64),
}

pub fn validate_priority(raw: &Value) -> Result<Priority, PriorityError> {
    let mut values = [0.0_f64; 5];

    for (slot, field) in values.iter_mut().zip(PRIORITY_FIELDS) {
        let value = match raw.get(field) {
            None | Some(Value::Null) => return Err(PriorityError::Missing(field)),
            Some(value) => value,
        };
        let number = value
            .as_f64()
            .filter(|n| n.is_finite())
            .ok_or(PriorityError::NotANumber(field))?;
        if number < 0.0 {
            return Err(PriorityError::Negative(field));
        }
        // Folds -0.0 into 0.0 so both hash alike.
        *slot = number + 0.0;
    }

    let [skills, experience, location, qualifications, projects] = values;
    let priority = Priority {
        skills,
        experience,
        location,
        qualifications,
        projects,
    };

    // Exact comparison: any other total is a different weighting.
    let total = priority.total();
    if total != 100.0 {
        return Err(PriorityError::Total(total));
    }

    Ok(priority)
}

/// Canonical form: `name=value` pairs sorted by field name, joined with `;`.
/// Integral values print without a fractional part, so `20` and `20.0` agree.
pub fn canonical_priority(priority: &Priority) -> String {
    let pairs = [
        ("experience", priority.experience),
        ("location", priority.location),
        ("projects", priority.projects),
        ("qualifications", priority.qualifications),
        ("skills", priority.skills),
    ];
    pairs
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(";")
}

/// Hex SHA-256 of [`canonical_priority`].
pub fn priority_hash(priority: &Priority) -> String {
    hex::encode(Sha256::digest(canonical_priority(priority).as_bytes()))
}
