use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::notify::Mailer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Pluggable mail capability. Default: HttpMailer against the relay;
    /// tests swap in a recording fake.
    pub mailer: Arc<dyn Mailer>,
    pub config: Config,
}
