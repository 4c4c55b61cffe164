use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::application::ApplicantStatus;
use crate::models::posting::HireApplicationRow;
use crate::notify::templates::posting_review_notice;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitPostingRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    /// Contact email that will receive applicant notifications and anchors
    /// posting ownership.
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, rename = "type")]
    pub job_type: String,
    #[serde(default)]
    pub salary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Serialize)]
pub struct SubmitPostingResponse {
    pub posting: HireApplicationRow,
    /// False when the operator notification could not be delivered; the
    /// posting is persisted either way.
    pub email_sent: bool,
}

/// Title, company and contact email are the mandatory posting fields;
/// everything else defaults to empty.
fn validate_submission(req: &SubmitPostingRequest) -> Result<(), AppError> {
    let mut missing = Vec::new();
    if req.title.trim().is_empty() {
        missing.push("title");
    }
    if req.company.trim().is_empty() {
        missing.push("company");
    }
    if req.email.trim().is_empty() {
        missing.push("email");
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

/// POST /api/v1/postings
pub async fn handle_submit_posting(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(req): Json<SubmitPostingRequest>,
) -> Result<Json<SubmitPostingResponse>, AppError> {
    validate_submission(&req)?;

    // Fresh, never-reused job identifier; immutable for the posting's life.
    let job_id = Uuid::new_v4().to_string();

    let posting: HireApplicationRow = sqlx::query_as(
        r#"
        INSERT INTO hire_applications
            (job_id, title, company, location, job_type, salary, description,
             requirements, tags, contact_email, owner_identity)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(&job_id)
    .bind(req.title.trim())
    .bind(req.company.trim())
    .bind(&req.location)
    .bind(&req.job_type)
    .bind(&req.salary)
    .bind(&req.description)
    .bind(&req.requirements)
    .bind(&req.tags)
    .bind(req.email.trim())
    .bind(&caller.identity_id)
    .fetch_one(&state.db)
    .await?;

    info!(
        "Posting {} submitted by {} for review",
        posting.job_id, caller.identity_id
    );

    // Persist-then-notify: a relay failure is reported, never rolled back.
    let notice = posting_review_notice(
        &posting,
        &state.config.operator_email,
        &state.config.app_base_url,
    );
    let email_sent = match state.mailer.send(&notice).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Review notification for {} failed: {e}", posting.job_id);
            false
        }
    };

    Ok(Json(SubmitPostingResponse {
        posting,
        email_sent,
    }))
}

/// GET /api/v1/postings — the caller's own postings, newest first.
pub async fn handle_list_postings(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Vec<HireApplicationRow>>, AppError> {
    let postings: Vec<HireApplicationRow> = sqlx::query_as(
        "SELECT * FROM hire_applications WHERE contact_email = $1 ORDER BY posted_at DESC",
    )
    .bind(&caller.email)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(postings))
}

/// GET /api/v1/postings/:id
pub async fn handle_get_posting(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<HireApplicationRow>, AppError> {
    let posting = find_owned_posting(&state, id, &caller.email).await?;
    Ok(Json(posting))
}

#[derive(Serialize)]
pub struct DeletePostingResponse {
    pub message: String,
    pub deleted_applicants: u64,
}

/// DELETE /api/v1/postings/:id
///
/// Cascade: the posting, its materialized listing and every application
/// under its job_id go in one transaction, so a crash mid-delete never
/// leaves applicants pointing at a vanished posting.
pub async fn handle_delete_posting(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletePostingResponse>, AppError> {
    let mut tx = state.db.begin().await?;

    let job_id: Option<String> = sqlx::query_scalar(
        "DELETE FROM hire_applications WHERE id = $1 AND contact_email = $2 RETURNING job_id",
    )
    .bind(id)
    .bind(&caller.email)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(job_id) = job_id else {
        return Err(AppError::NotFound(
            "Hire application not found or you do not have access".to_string(),
        ));
    };

    sqlx::query("DELETE FROM jobs WHERE job_id = $1")
        .bind(&job_id)
        .execute(&mut *tx)
        .await?;

    let deleted = sqlx::query("DELETE FROM applications WHERE job_id = $1")
        .bind(&job_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;

    info!("Deleted posting {job_id} and {deleted} applicant(s)");

    Ok(Json(DeletePostingResponse {
        message: "Hire application and all associated applicants deleted successfully".to_string(),
        deleted_applicants: deleted,
    }))
}

/// A posting the caller has applied to, with their application's status
/// alongside the posting fields.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AppliedJobRow {
    pub id: Uuid,
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub salary: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub tags: Vec<String>,
    pub contact_email: String,
    pub application_status: ApplicantStatus,
}

/// GET /api/v1/postings/applied — jobs the caller has applied to.
pub async fn handle_list_applied(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Vec<AppliedJobRow>>, AppError> {
    // Applications are keyed by the email on record for the identity, which
    // may differ from the session email if the profile changed.
    let email: Option<String> = sqlx::query_scalar("SELECT email FROM users WHERE identity_id = $1")
        .bind(&caller.identity_id)
        .fetch_optional(&state.db)
        .await?;

    let email = email.ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let applied: Vec<AppliedJobRow> = sqlx::query_as(
        r#"
        SELECT h.id, h.job_id, h.title, h.company, h.location, h.job_type,
               h.salary, h.description, h.requirements, h.tags,
               h.contact_email, a.status AS application_status
        FROM applications a
        JOIN hire_applications h ON h.job_id = a.job_id
        WHERE a.email = $1
        ORDER BY a.submitted_at DESC
        "#,
    )
    .bind(&email)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(applied))
}

/// Fetches a posting by primary key, scoped to the caller's ownership
/// (contact email match). NotFound covers both absence and foreign rows.
pub async fn find_owned_posting(
    state: &AppState,
    id: Uuid,
    caller_email: &str,
) -> Result<HireApplicationRow, AppError> {
    let posting: Option<HireApplicationRow> =
        sqlx::query_as("SELECT * FROM hire_applications WHERE id = $1 AND contact_email = $2")
            .bind(id)
            .bind(caller_email)
            .fetch_optional(&state.db)
            .await?;

    posting.ok_or_else(|| {
        AppError::NotFound("Hire application not found or you do not have access".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> SubmitPostingRequest {
        SubmitPostingRequest {
            title: "Engineer".to_string(),
            company: "Acme".to_string(),
            email: "a@acme.com".to_string(),
            location: String::new(),
            job_type: String::new(),
            salary: String::new(),
            description: String::new(),
            requirements: vec![],
            tags: vec![],
        }
    }

    #[test]
    fn test_valid_submission_passes() {
        assert!(validate_submission(&valid_request()).is_ok());
    }

    #[test]
    fn test_missing_title_rejected() {
        let mut req = valid_request();
        req.title = "  ".to_string();
        let err = validate_submission(&req).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("title")));
    }

    #[test]
    fn test_all_mandatory_fields_reported() {
        let req = SubmitPostingRequest {
            title: String::new(),
            company: String::new(),
            email: String::new(),
            location: String::new(),
            job_type: String::new(),
            salary: String::new(),
            description: String::new(),
            requirements: vec![],
            tags: vec![],
        };
        let err = validate_submission(&req).unwrap_err();
        match err {
            AppError::Validation(msg) => {
                assert!(msg.contains("title"));
                assert!(msg.contains("company"));
                assert!(msg.contains("email"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_optional_fields_may_be_empty() {
        // Only title, company and email are mandatory.
        let req = valid_request();
        assert!(req.location.is_empty());
        assert!(validate_submission(&req).is_ok());
    }

    #[test]
    fn test_submission_request_accepts_minimal_json() {
        let req: SubmitPostingRequest = serde_json::from_str(
            r#"{"title":"Engineer","company":"Acme","email":"a@acme.com"}"#,
        )
        .unwrap();
        assert!(validate_submission(&req).is_ok());
        assert!(req.requirements.is_empty());
    }
}
