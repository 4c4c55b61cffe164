use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The public, candidate-visible listing, materialized when a posting is
/// published. At most one row per (title, company); never mutated after
/// creation, deleted only by the owning posting's cascade delete.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
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
    /// Identity id of the user resolved from the posting's contact email.
    pub posted_by: String,
    pub posted_at: DateTime<Utc>,
}
