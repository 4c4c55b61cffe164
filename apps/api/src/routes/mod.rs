pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::applicants::{decision, intake};
use crate::billing::{quota, webhook as billing_webhook};
use crate::identity::webhook as identity_webhook;
use crate::jobs::handlers as job_handlers;
use crate::postings::{handlers as posting_handlers, review};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Employer posting surface
        .route(
            "/api/v1/postings",
            post(posting_handlers::handle_submit_posting).get(posting_handlers::handle_list_postings),
        )
        .route(
            "/api/v1/postings/applied",
            get(posting_handlers::handle_list_applied),
        )
        .route("/api/v1/postings/review", post(review::handle_review_transition))
        .route(
            "/api/v1/postings/:id",
            get(posting_handlers::handle_get_posting)
                .delete(posting_handlers::handle_delete_posting),
        )
        .route(
            "/api/v1/postings/:id/applicants",
            get(decision::handle_list_applicants),
        )
        .route(
            "/api/v1/postings/:id/applicants/:applicant_id",
            patch(decision::handle_applicant_decision)
                .delete(decision::handle_delete_applicant),
        )
        // Public listings
        .route("/api/v1/jobs", get(job_handlers::handle_list_jobs))
        .route("/api/v1/jobs/:job_id", get(job_handlers::handle_get_job))
        // Candidate intake
        .route("/api/v1/applicants", post(intake::handle_apply))
        // Subscription / scan quota
        .route("/api/v1/subscription", get(quota::handle_get_subscription))
        .route("/api/v1/scans/consume", post(quota::handle_consume_scan))
        .route("/api/v1/scans/check-ip", post(quota::handle_check_ip))
        // Signed webhooks from external collaborators
        .route(
            "/api/v1/webhooks/billing",
            post(billing_webhook::handle_billing_webhook),
        )
        .route(
            "/api/v1/webhooks/identity",
            post(identity_webhook::handle_identity_webhook),
        )
        .with_state(state)
}
