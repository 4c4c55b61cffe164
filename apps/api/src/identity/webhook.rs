//! Identity-provider webhook.
//!
//! The provider owns user identity; this service mirrors it. Deliveries are
//! signed (svix scheme) and verified against the raw body before any state
//! change. `user.created` also provisions the default free subscription in
//! the same transaction, so a user never exists without one.

use axum::{extract::State, http::HeaderMap, Json};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::subscription::PlanTier;
use crate::signature::verify_identity_signature;
use crate::state::AppState;

const ID_HEADER: &str = "svix-id";
const TIMESTAMP_HEADER: &str = "svix-timestamp";
const SIGNATURE_HEADER: &str = "svix-signature";

#[derive(Debug, Deserialize)]
struct IdentityEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: IdentityEventData,
}

#[derive(Debug, Deserialize)]
struct IdentityEventData {
    id: Option<String>,
    #[serde(default)]
    email_addresses: Vec<EmailAddress>,
    first_name: Option<String>,
    last_name: Option<String>,
    username: Option<String>,
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmailAddress {
    email_address: String,
}

/// A provisioning-ready view of a `user.created` payload.
#[derive(Debug, PartialEq)]
struct NewUser {
    identity_id: String,
    email: String,
    username: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    photo_url: Option<String>,
}

fn extract_new_user(data: IdentityEventData) -> Result<NewUser, AppError> {
    let identity_id = data
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("User ID is missing".to_string()))?;

    // The provider sends a list; the primary address is first.
    let email = data
        .email_addresses
        .into_iter()
        .next()
        .map(|e| e.email_address)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Validation("User email is missing".to_string()))?;

    Ok(NewUser {
        identity_id,
        email,
        username: data.username,
        first_name: data.first_name,
        last_name: data.last_name,
        photo_url: data.image_url,
    })
}

/// POST /api/v1/webhooks/identity
pub async fn handle_identity_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let msg_id = required_header(&headers, ID_HEADER)?;
    let timestamp = required_header(&headers, TIMESTAMP_HEADER)?;
    let signature = required_header(&headers, SIGNATURE_HEADER)?;

    verify_identity_signature(
        &state.config.identity_webhook_secret,
        msg_id,
        timestamp,
        signature,
        &body,
    )
    .map_err(|e| AppError::Validation(format!("Identity signature rejected: {e}")))?;

    let event: IdentityEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Malformed identity payload: {e}")))?;

    match event.event_type.as_str() {
        "user.created" => {
            let user = extract_new_user(event.data)?;
            create_user(&state, user).await?;
        }
        "user.updated" => {
            let identity_id = event
                .data
                .id
                .clone()
                .filter(|id| !id.is_empty())
                .ok_or_else(|| AppError::Validation("User ID is missing".to_string()))?;
            update_user(&state, &identity_id, event.data).await?;
        }
        "user.deleted" => {
            let identity_id = event
                .data
                .id
                .filter(|id| !id.is_empty())
                .ok_or_else(|| AppError::Validation("User ID is missing".to_string()))?;
            delete_user(&state, &identity_id).await?;
        }
        other => {
            info!("Unhandled identity event type: {other}");
        }
    }

    Ok(Json(json!({ "received": true })))
}

async fn create_user(state: &AppState, user: NewUser) -> Result<(), AppError> {
    // User and default subscription land atomically; re-delivered events
    // are no-ops on both inserts.
    let mut tx = state.db.begin().await?;

    let user_id: Option<Uuid> = sqlx::query_scalar(
        r#"
        INSERT INTO users (identity_id, email, username, first_name, last_name, photo_url)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (identity_id) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(&user.identity_id)
    .bind(&user.email)
    .bind(&user.username)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.photo_url)
    .fetch_optional(&mut *tx)
    .await?;

    if let Some(user_id) = user_id {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (user_id, plan, scans)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(PlanTier::Free)
        .bind(PlanTier::Free.initial_scans())
        .execute(&mut *tx)
        .await?;

        info!("User {} provisioned with free subscription", user.identity_id);
    } else {
        info!("User {} already exists, event ignored", user.identity_id);
    }

    tx.commit().await?;
    Ok(())
}

async fn update_user(
    state: &AppState,
    identity_id: &str,
    data: IdentityEventData,
) -> Result<(), AppError> {
    let updated = sqlx::query(
        r#"
        UPDATE users
        SET username = $2, first_name = $3, last_name = $4, photo_url = $5
        WHERE identity_id = $1
        "#,
    )
    .bind(identity_id)
    .bind(&data.username)
    .bind(&data.first_name)
    .bind(&data.last_name)
    .bind(&data.image_url)
    .execute(&state.db)
    .await?
    .rows_affected();

    if updated == 0 {
        warn!("Update for unknown user {identity_id}");
        return Err(AppError::NotFound("User not found for update".to_string()));
    }

    info!("User {identity_id} profile updated");
    Ok(())
}

async fn delete_user(state: &AppState, identity_id: &str) -> Result<(), AppError> {
    // The subscription row goes with the user via FK cascade.
    let deleted = sqlx::query("DELETE FROM users WHERE identity_id = $1")
        .bind(identity_id)
        .execute(&state.db)
        .await?
        .rows_affected();

    if deleted == 0 {
        warn!("Delete for unknown user {identity_id}");
        return Err(AppError::NotFound(
            "User not found for deletion".to_string(),
        ));
    }

    info!("User {identity_id} deleted");
    Ok(())
}

fn required_header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AppError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Validation(format!("Missing {name} header")))
}
