use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Decision status of a candidate's application. `Reject` and
/// `ReadyToInterview` are terminal: once set, no further transition is
/// accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "applicant_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicantStatus {
    Review,
    Reject,
    ReadyToInterview,
}

impl ApplicantStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ApplicantStatus::Reject | ApplicantStatus::ReadyToInterview)
    }
}

/// A candidate's submission against a published job, referenced by
/// `job_id`. Job title/company/contact are denormalized at submission time
/// so the record stays readable after the listing is deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub job_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub resume_url: String,
    pub job_title: String,
    pub job_company: String,
    pub job_email: String,
    pub status: ApplicantStatus,
    pub submitted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_is_not_terminal() {
        assert!(!ApplicantStatus::Review.is_terminal());
        assert!(ApplicantStatus::Reject.is_terminal());
        assert!(ApplicantStatus::ReadyToInterview.is_terminal());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ApplicantStatus::ReadyToInterview).unwrap(),
            "\"ready_to_interview\""
        );
    }
}
