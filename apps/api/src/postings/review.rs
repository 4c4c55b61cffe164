//! Operator review transition.
//!
//! States: review → {published, reject}, with review re-selectable by the
//! operator. The status write is unconditional and idempotent; the Job
//! materialization on publish is an upsert keyed by (title, company), so a
//! duplicate publish is a silent no-op on the listing side.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::posting::{HireApplicationRow, PostingStatus};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReviewTransitionRequest {
    pub job_id: String,
    pub status: String,
}

#[derive(Serialize)]
pub struct ReviewTransitionResponse {
    pub message: String,
    pub posting: HireApplicationRow,
}

/// The operator may set exactly these values; anything else is rejected
/// before any lookup.
fn parse_review_status(status: &str) -> Result<PostingStatus, AppError> {
    match status {
        "review" => Ok(PostingStatus::Review),
        "published" => Ok(PostingStatus::Published),
        "reject" => Ok(PostingStatus::Reject),
        other => Err(AppError::InvalidStatus(format!(
            "'{other}' is not a valid review status"
        ))),
    }
}

/// POST /api/v1/postings/review — operator only.
pub async fn handle_review_transition(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(req): Json<ReviewTransitionRequest>,
) -> Result<Json<ReviewTransitionResponse>, AppError> {
    caller.require_operator(&state.config.operator_id)?;

    if req.job_id.trim().is_empty() {
        return Err(AppError::Validation("Job ID is required".to_string()));
    }
    let status = parse_review_status(&req.status)?;

    let posting: Option<HireApplicationRow> =
        sqlx::query_as("SELECT * FROM hire_applications WHERE job_id = $1")
            .bind(&req.job_id)
            .fetch_optional(&state.db)
            .await?;

    let Some(posting) = posting else {
        warn!("Review transition for unknown job {}", req.job_id);
        return Err(AppError::NotFound("Job application not found".to_string()));
    };

    let posting: HireApplicationRow =
        sqlx::query_as("UPDATE hire_applications SET status = $1 WHERE job_id = $2 RETURNING *")
            .bind(status)
            .bind(&req.job_id)
            .fetch_one(&state.db)
            .await?;

    info!("Posting {} transitioned to {:?}", posting.job_id, status);

    if status == PostingStatus::Published {
        materialize_job(&state, &posting).await?;
    }

    Ok(Json(ReviewTransitionResponse {
        message: "Job status updated successfully".to_string(),
        posting,
    }))
}

/// Creates the public listing for a freshly published posting. `posted_by`
/// is the identity of the user behind the posting's contact email; a
/// posting whose email maps to no account cannot go live.
async fn materialize_job(state: &AppState, posting: &HireApplicationRow) -> Result<(), AppError> {
    let poster_identity: Option<String> =
        sqlx::query_scalar("SELECT identity_id FROM users WHERE email = $1")
            .bind(&posting.contact_email)
            .fetch_optional(&state.db)
            .await?;

    let Some(poster_identity) = poster_identity else {
        warn!(
            "Publish of {} blocked: no user for {}",
            posting.job_id, posting.contact_email
        );
        return Err(AppError::NotFound(
            "User associated with this application not found".to_string(),
        ));
    };

    let inserted = sqlx::query(
        r#"
        INSERT INTO jobs
            (job_id, title, company, location, job_type, salary, description,
             requirements, tags, contact_email, posted_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(&posting.job_id)
    .bind(&posting.title)
    .bind(&posting.company)
    .bind(&posting.location)
    .bind(&posting.job_type)
    .bind(&posting.salary)
    .bind(&posting.description)
    .bind(&posting.requirements)
    .bind(&posting.tags)
    .bind(&posting.contact_email)
    .bind(&poster_identity)
    .execute(&state.db)
    .await?
    .rows_affected();

    if inserted == 1 {
        info!(
            "Listing created for {} ({} at {})",
            posting.job_id, posting.title, posting.company
        );
    } else {
        // Duplicate publish: listing already exists, accepted silently.
        info!(
            "Listing for {} at {} already exists, publish is a no-op",
            posting.title, posting.company
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_statuses_parse() {
        assert_eq!(parse_review_status("review").unwrap(), PostingStatus::Review);
        assert_eq!(
            parse_review_status("published").unwrap(),
            PostingStatus::Published
        );
        assert_eq!(parse_review_status("reject").unwrap(), PostingStatus::Reject);
    }

    #[test]
    fn test_applicant_side_status_is_rejected_here() {
        // ready_to_interview belongs to the applicant lifecycle, not the
        // posting review lifecycle.
        let err = parse_review_status("ready_to_interview").unwrap_err();
        assert!(matches!(err, AppError::InvalidStatus(_)));
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!(matches!(
            parse_review_status("live").unwrap_err(),
            AppError::InvalidStatus(_)
        ));
    }

    #[test]
    fn test_status_parse_is_case_sensitive() {
        assert!(parse_review_status("Published").is_err());
    }
}
