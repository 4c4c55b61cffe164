//! Employer decision on an application.
//!
//! The transition is one-way: an application leaves `review` exactly once,
//! to `reject` or `ready_to_interview`, and a terminal status is never
//! rewritten. The guard is read-then-check-then-write; a true concurrent
//! double call can race past it and at worst mail the candidate twice,
//! which is an accepted weakness of the design, not a guarantee we chase
//! with locks.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::application::{ApplicantStatus, ApplicationRow};
use crate::notify::templates::decision_notice;
use crate::postings::handlers::find_owned_posting;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub status: String,
}

#[derive(Serialize)]
pub struct DecisionResponse {
    pub message: String,
    pub application: ApplicationRow,
    /// False when the candidate email could not be delivered; the status
    /// change stands regardless.
    pub email_sent: bool,
}

/// Employers may only set the two terminal statuses.
fn parse_decision(status: &str) -> Result<ApplicantStatus, AppError> {
    match status {
        "reject" => Ok(ApplicantStatus::Reject),
        "ready_to_interview" => Ok(ApplicantStatus::ReadyToInterview),
        other => Err(AppError::InvalidStatus(format!(
            "'{other}' is not a valid applicant decision"
        ))),
    }
}

/// Write-once terminal-state invariant: once decided, always decided.
fn check_undecided(current: ApplicantStatus) -> Result<(), AppError> {
    if current.is_terminal() {
        return Err(AppError::Conflict(
            "Applicant has already been rejected or marked ready for interview".to_string(),
        ));
    }
    Ok(())
}

/// GET /api/v1/postings/:id/applicants — owner only.
pub async fn handle_list_applicants(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ApplicationRow>>, AppError> {
    let posting = find_owned_posting(&state, id, &caller.email).await?;

    let applicants: Vec<ApplicationRow> =
        sqlx::query_as("SELECT * FROM applications WHERE job_id = $1 ORDER BY submitted_at DESC")
            .bind(&posting.job_id)
            .fetch_all(&state.db)
            .await?;

    Ok(Json(applicants))
}

/// PATCH /api/v1/postings/:id/applicants/:applicant_id — owner only.
pub async fn handle_applicant_decision(
    State(state): State<AppState>,
    caller: AuthUser,
    Path((id, applicant_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<DecisionRequest>,
) -> Result<Json<DecisionResponse>, AppError> {
    let decision = parse_decision(&req.status)?;

    let posting = find_owned_posting(&state, id, &caller.email).await?;

    let applicant: Option<ApplicationRow> =
        sqlx::query_as("SELECT * FROM applications WHERE id = $1 AND job_id = $2")
            .bind(applicant_id)
            .bind(&posting.job_id)
            .fetch_optional(&state.db)
            .await?;

    let Some(applicant) = applicant else {
        return Err(AppError::NotFound(
            "Applicant not found or does not belong to this hire application".to_string(),
        ));
    };

    // No email is sent on the conflict path; the stored status is untouched.
    check_undecided(applicant.status)?;

    let application: ApplicationRow =
        sqlx::query_as("UPDATE applications SET status = $1 WHERE id = $2 RETURNING *")
            .bind(decision)
            .bind(applicant_id)
            .fetch_one(&state.db)
            .await?;

    info!(
        "Application {} moved to {:?} by {}",
        application.id, decision, caller.email
    );

    let email_sent = match decision_notice(&application, decision) {
        Some(notice) => match state.mailer.send(&notice).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "Decision email for application {} failed: {e}",
                    application.id
                );
                false
            }
        },
        None => false,
    };

    Ok(Json(DecisionResponse {
        message: format!(
            "Applicant status updated to '{}'",
            req.status.replace('_', " ")
        ),
        application,
        email_sent,
    }))
}

#[derive(Serialize)]
pub struct DeleteApplicantResponse {
    pub message: String,
}

/// DELETE /api/v1/postings/:id/applicants/:applicant_id — owner only,
/// independent of the applicant's status.
pub async fn handle_delete_applicant(
    State(state): State<AppState>,
    caller: AuthUser,
    Path((id, applicant_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<DeleteApplicantResponse>, AppError> {
    let posting = find_owned_posting(&state, id, &caller.email).await?;

    let deleted = sqlx::query("DELETE FROM applications WHERE id = $1 AND job_id = $2")
        .bind(applicant_id)
        .bind(&posting.job_id)
        .execute(&state.db)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AppError::NotFound(
            "Applicant not found or does not belong to this hire application".to_string(),
        ));
    }

    info!("Application {applicant_id} deleted from job {}", posting.job_id);

    Ok(Json(DeleteApplicantResponse {
        message: "Applicant deleted successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_decisions_parse() {
        assert_eq!(parse_decision("reject").unwrap(), ApplicantStatus::Reject);
        assert_eq!(
            parse_decision("ready_to_interview").unwrap(),
            ApplicantStatus::ReadyToInterview
        );
    }

    #[test]
    fn test_review_is_not_a_decision() {
        // Employers cannot push an application back into review.
        assert!(matches!(
            parse_decision("review").unwrap_err(),
            AppError::InvalidStatus(_)
        ));
    }

    #[test]
    fn test_posting_side_status_rejected_here() {
        assert!(matches!(
            parse_decision("published").unwrap_err(),
            AppError::InvalidStatus(_)
        ));
    }

    #[test]
    fn test_undecided_application_may_transition() {
        assert!(check_undecided(ApplicantStatus::Review).is_ok());
    }

    #[test]
    fn test_decided_application_conflicts() {
        assert!(matches!(
            check_undecided(ApplicantStatus::Reject).unwrap_err(),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            check_undecided(ApplicantStatus::ReadyToInterview).unwrap_err(),
            AppError::Conflict(_)
        ));
    }
}
