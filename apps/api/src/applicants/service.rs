//! Applicant lookups and social-profile verification.

use tracing::{info, warn};
use uuid::Uuid;

use crate::enrichment::EnrichmentService;
use crate::errors::AppError;
use crate::models::applicant::{Applicant, ApplicantStatus};
use crate::store::Store;

const NO_SOCIAL_LINKS: &str = "No social links provided";
const UNAUTHENTICATED: &str = "Unable to authenticate social profiles";

/// Applicants are only visible to the recruiter whose report created them.
async fn own_applicant(store: &dyn Store, user_id: Uuid, id: Uuid) -> Result<Applicant, AppError> {
    store
        .get_applicant(id)
        .await?
        .filter(|a| a.created_by == user_id)
        .ok_or_else(|| AppError::NotFound("Applicant not found".to_string()))
}

pub async fn get_applicant(store: &dyn Store, user_id: Uuid, id: Uuid) -> Result<Applicant, AppError> {
    own_applicant(store, user_id, id).await
}

/// Looks up every declared profile and records the outcome.
///
/// VERIFIED when at least one platform answered with stats; FAILED
/// otherwise. An applicant without profile links is marked FAILED and the
/// call itself is rejected.
pub async fn verify_applicant(
    store: &dyn Store,
    enrichment: &dyn EnrichmentService,
    user_id: Uuid,
    id: Uuid,
) -> Result<Applicant, AppError> {
    let mut applicant = own_applicant(store, user_id, id).await?;

    if applicant.social.has_no_profiles() {
        applicant.status = ApplicantStatus::Failed;
        applicant.failure_reason = Some(NO_SOCIAL_LINKS.to_string());
        store.save_applicant(&applicant).await?;
        return Err(AppError::Validation(NO_SOCIAL_LINKS.to_string()));
    }

    let results = enrichment.fetch_all_profiles(&applicant.social).await;
    let verified = results.iter().any(|r| r.is_authenticated());
    for failed in results.iter().filter(|r| !r.is_authenticated()) {
        warn!(
            "Applicant {}: {} lookup unsuccessful ({})",
            applicant.id, failed.platform, failed.profile_url
        );
    }

    applicant.authentication = results;
    if verified {
        applicant.status = ApplicantStatus::Verified;
        applicant.failure_reason = None;
    } else {
        applicant.status = ApplicantStatus::Failed;
        applicant.failure_reason = Some(UNAUTHENTICATED.to_string());
    }
    store.save_applicant(&applicant).await?;

    info!(
        "Applicant {} verification finished: {}",
        applicant.id,
        applicant.status.as_str()
    );
    Ok(applicant)
}
