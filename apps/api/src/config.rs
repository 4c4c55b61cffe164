use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Panics at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// HTTP endpoint of the transactional mail relay.
    pub mail_relay_url: String,
    pub mail_relay_token: String,
    /// From-address stamped on every outbound email.
    pub mail_from: String,
    /// Operator inbox that receives new-posting review notifications.
    pub operator_email: String,
    /// Identity id of the single operator allowed to run review transitions.
    pub operator_id: String,
    /// Base URL used to build admin review links in notification emails.
    pub app_base_url: String,
    pub billing_webhook_secret: String,
    pub identity_webhook_secret: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            mail_relay_url: require_env("MAIL_RELAY_URL")?,
            mail_relay_token: require_env("MAIL_RELAY_TOKEN")?,
            mail_from: require_env("MAIL_FROM")?,
            operator_email: require_env("OPERATOR_EMAIL")?,
            operator_id: require_env("OPERATOR_ID")?,
            app_base_url: require_env("APP_BASE_URL")?,
            billing_webhook_secret: require_env("BILLING_WEBHOOK_SECRET")?,
            identity_webhook_secret: require_env("IDENTITY_WEBHOOK_SECRET")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
