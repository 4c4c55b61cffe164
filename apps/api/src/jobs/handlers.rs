use axum::{
    extract::{Path, State},
    Json,
};

use crate::errors::AppError;
use crate::models::job::JobRow;
use crate::state::AppState;

/// GET /api/v1/jobs — all published listings, newest first.
pub async fn handle_list_jobs(
    State(state): State<AppState>,
) -> Result<Json<Vec<JobRow>>, AppError> {
    let jobs: Vec<JobRow> = sqlx::query_as("SELECT * FROM jobs ORDER BY posted_at DESC")
        .fetch_all(&state.db)
        .await?;

    Ok(Json(jobs))
}

/// GET /api/v1/jobs/:job_id — one listing by its job identifier.
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobRow>, AppError> {
    let job: Option<JobRow> = sqlx::query_as("SELECT * FROM jobs WHERE job_id = $1")
        .bind(&job_id)
        .fetch_optional(&state.db)
        .await?;

    job.map(Json)
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))
}
