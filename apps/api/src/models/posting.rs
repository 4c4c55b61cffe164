use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Review status of an employer's posting. Distinct from
/// [`ApplicantStatus`](crate::models::application::ApplicantStatus) — the
/// two lifecycles share spellings but never a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "posting_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PostingStatus {
    Review,
    Published,
    Reject,
}

/// An employer's job-posting submission, pending or past operator review.
/// `job_id` is generated at submission time and immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HireApplicationRow {
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
    pub status: PostingStatus,
    pub owner_identity: String,
    pub posted_at: DateTime<Utc>,
}
