use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::application::ApplicationRow;
use crate::notify::templates::new_applicant_notice;
use crate::state::AppState;

/// Candidate submission. The resume URL comes from the prior upload step
/// (external collaborator); job title/company/contact are denormalized into
/// the record at submission time so it outlives the listing.
#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    #[serde(default)]
    pub job_id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    #[serde(default)]
    pub resume_url: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub job_company: String,
    #[serde(default)]
    pub job_email: String,
}

#[derive(Serialize)]
pub struct ApplyResponse {
    pub application: ApplicationRow,
    /// False when the employer notification could not be delivered; the
    /// application is persisted either way.
    pub email_sent: bool,
}

fn validate_apply(req: &ApplyRequest) -> Result<(), AppError> {
    let mandatory = [
        ("job_id", &req.job_id),
        ("first_name", &req.first_name),
        ("last_name", &req.last_name),
        ("email", &req.email),
        ("phone", &req.phone),
        ("resume_url", &req.resume_url),
        ("job_title", &req.job_title),
        ("job_company", &req.job_company),
        ("job_email", &req.job_email),
    ];

    let missing: Vec<&str> = mandatory
        .iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

/// POST /api/v1/applicants
pub async fn handle_apply(
    State(state): State<AppState>,
    Json(req): Json<ApplyRequest>,
) -> Result<Json<ApplyResponse>, AppError> {
    validate_apply(&req)?;

    // The job must be a live listing; nothing is persisted otherwise.
    let job_exists: Option<i32> = sqlx::query_scalar("SELECT 1 FROM jobs WHERE job_id = $1")
        .bind(&req.job_id)
        .fetch_optional(&state.db)
        .await?;

    if job_exists.is_none() {
        warn!("Application against unknown job {}", req.job_id);
        return Err(AppError::Validation("Invalid jobId".to_string()));
    }

    let application: ApplicationRow = sqlx::query_as(
        r#"
        INSERT INTO applications
            (job_id, first_name, last_name, email, phone, address, city,
             state, zip_code, resume_url, job_title, job_company, job_email)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING *
        "#,
    )
    .bind(&req.job_id)
    .bind(&req.first_name)
    .bind(&req.last_name)
    .bind(&req.email)
    .bind(&req.phone)
    .bind(&req.address)
    .bind(&req.city)
    .bind(&req.state)
    .bind(&req.zip_code)
    .bind(&req.resume_url)
    .bind(&req.job_title)
    .bind(&req.job_company)
    .bind(&req.job_email)
    .fetch_one(&state.db)
    .await?;

    info!(
        "Application {} received for job {}",
        application.id, application.job_id
    );

    // At-least-persisted, best-effort-notified.
    let notice = new_applicant_notice(&application);
    let email_sent = match state.mailer.send(&notice).await {
        Ok(()) => true,
        Err(e) => {
            warn!(
                "Employer notification for application {} failed: {e}",
                application.id
            );
            false
        }
    };

    Ok(Json(ApplyResponse {
        application,
        email_sent,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> ApplyRequest {
        ApplyRequest {
            job_id: "job-abc".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: "555-0100".to_string(),
            address: None,
            city: None,
            state: None,
            zip_code: None,
            resume_url: "https://files.example.com/ada.pdf".to_string(),
            job_title: "Engineer".to_string(),
            job_company: "Acme".to_string(),
            job_email: "hr@acme.com".to_string(),
        }
    }

    #[test]
    fn test_valid_application_passes() {
        assert!(validate_apply(&valid_request()).is_ok());
    }

    #[test]
    fn test_address_fields_are_optional() {
        let req = valid_request();
        assert!(req.address.is_none());
        assert!(validate_apply(&req).is_ok());
    }

    #[test]
    fn test_missing_phone_rejected() {
        let mut req = valid_request();
        req.phone = String::new();
        let err = validate_apply(&req).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("phone")));
    }

    #[test]
    fn test_missing_resume_rejected() {
        let mut req = valid_request();
        req.resume_url = " ".to_string();
        assert!(validate_apply(&req).is_err());
    }

    #[test]
    fn test_missing_denormalized_job_fields_rejected() {
        let mut req = valid_request();
        req.job_email = String::new();
        let err = validate_apply(&req).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("job_email")));
    }
}
