//! Billing-processor webhook.
//!
//! The processor signs every delivery with the shared webhook secret; the
//! signature is verified against the raw body before any state change. A
//! confirmed checkout maps the amount paid to a plan tier and upserts the
//! paying user's subscription.

use axum::{extract::State, http::HeaderMap, Json};
use bytes::Bytes;
use chrono::{Months, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::subscription::PlanTier;
use crate::signature::verify_billing_signature;
use crate::state::AppState;

const SIGNATURE_HEADER: &str = "stripe-signature";

/// Checkout prices in the smallest currency unit.
const MONTHLY_AMOUNT: i64 = 800; // $8.00
const ANNUAL_AMOUNT: i64 = 5500; // $55.00

#[derive(Debug, Deserialize)]
struct BillingEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: BillingEventData,
}

#[derive(Debug, Deserialize)]
struct BillingEventData {
    object: CheckoutSession,
}

#[derive(Debug, Deserialize)]
struct CheckoutSession {
    customer_email: Option<String>,
    amount_total: Option<i64>,
    currency: Option<String>,
}

/// Maps an amount paid to a plan and its scan allowance. Unknown amounts
/// are rejected rather than guessed at.
pub fn resolve_plan(amount: i64) -> Option<PlanTier> {
    match amount {
        MONTHLY_AMOUNT => Some(PlanTier::Monthly),
        ANNUAL_AMOUNT => Some(PlanTier::Annual),
        _ => None,
    }
}

fn plan_duration(plan: PlanTier) -> Months {
    match plan {
        PlanTier::Annual => Months::new(12),
        _ => Months::new(1),
    }
}

/// POST /api/v1/webhooks/billing
pub async fn handle_billing_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Validation("Missing billing signature".to_string()))?;

    verify_billing_signature(&state.config.billing_webhook_secret, signature, &body)
        .map_err(|e| AppError::Validation(format!("Billing signature rejected: {e}")))?;

    let event: BillingEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Malformed billing payload: {e}")))?;

    if event.event_type != "checkout.session.completed" {
        info!("Ignoring billing event type {}", event.event_type);
        return Ok(Json(json!({ "received": true })));
    }

    let session = event.data.object;

    let email = session
        .customer_email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Validation("No customer email found in session".to_string()))?;
    let currency = session
        .currency
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::Validation("No currency found in session".to_string()))?;
    let amount = session
        .amount_total
        .ok_or_else(|| AppError::Validation("No amount found in session".to_string()))?;

    let Some(plan) = resolve_plan(amount) else {
        warn!("Unexpected amount paid: {amount} {}", currency.to_uppercase());
        return Err(AppError::Validation("Unexpected amount paid".to_string()));
    };

    let user_id: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;

    let Some(user_id) = user_id else {
        warn!("Checkout completed for unknown email {email}");
        return Err(AppError::NotFound("User not found".to_string()));
    };

    let start = Utc::now();
    let end = start
        .checked_add_months(plan_duration(plan))
        .ok_or_else(|| AppError::Validation("Subscription end date overflow".to_string()))?;

    // Create or overwrite: a repeat purchase resets the whole window.
    sqlx::query(
        r#"
        INSERT INTO subscriptions (user_id, plan, scans, start_date, end_date)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id) DO UPDATE
        SET plan = EXCLUDED.plan,
            scans = EXCLUDED.scans,
            start_date = EXCLUDED.start_date,
            end_date = EXCLUDED.end_date
        "#,
    )
    .bind(user_id)
    .bind(plan)
    .bind(plan.initial_scans())
    .bind(start)
    .bind(end)
    .execute(&state.db)
    .await?;

    info!("Subscription for {email} upgraded to {plan:?} until {end}");

    Ok(Json(json!({ "received": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monthly_amount_resolves() {
        assert_eq!(resolve_plan(800), Some(PlanTier::Monthly));
    }

    #[test]
    fn test_annual_amount_resolves() {
        assert_eq!(resolve_plan(5500), Some(PlanTier::Annual));
    }

    #[test]
    fn test_unknown_amount_is_rejected() {
        assert_eq!(resolve_plan(0), None);
        assert_eq!(resolve_plan(799), None);
        assert_eq!(resolve_plan(100_000), None);
    }

    #[test]
    fn test_plan_durations() {
        assert_eq!(plan_duration(PlanTier::Monthly), Months::new(1));
        assert_eq!(plan_duration(PlanTier::Annual), Months::new(12));
    }

    #[test]
    fn test_resolved_plans_carry_expected_allowance() {
        assert_eq!(resolve_plan(800).unwrap().initial_scans(), Some(50));
        assert_eq!(resolve_plan(5500).unwrap().initial_scans(), None);
    }

    #[test]
    fn test_event_payload_parses() {
        let event: BillingEvent = serde_json::from_str(
            r#"{
                "type": "checkout.session.completed",
                "data": {
                    "object": {
                        "customer_email": "a@acme.com",
                        "amount_total": 800,
                        "currency": "usd"
                    }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(event.event_type, "checkout.session.completed");
        assert_eq!(event.data.object.amount_total, Some(800));
    }
}
