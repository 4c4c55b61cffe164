use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::subscription::{PlanTier, SubscriptionRow};
use crate::models::user::UserRow;
use crate::state::AppState;

/// What a scan-consume request should do, given the stored allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDecision {
    /// Annual plan: always allowed, stored count never touched.
    Unlimited,
    /// Finite plan with headroom: decrement and report the new count.
    Decrement,
    /// Finite plan at zero: refuse, count stays at zero.
    Exhausted,
}

pub fn scan_decision(plan: PlanTier, scans: Option<i32>) -> ScanDecision {
    match plan {
        PlanTier::Annual => ScanDecision::Unlimited,
        PlanTier::Free | PlanTier::Monthly => match scans {
            Some(n) if n > 0 => ScanDecision::Decrement,
            _ => ScanDecision::Exhausted,
        },
    }
}

/// GET /api/v1/subscription
pub async fn handle_get_subscription(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<SubscriptionRow>, AppError> {
    let (_, subscription) = resolve_subscription(&state, &caller.identity_id).await?;
    Ok(Json(subscription))
}

/// POST /api/v1/scans/consume
///
/// One scan per resume analysis. The decrement is a conditional UPDATE
/// (`scans > 0`) so concurrent consumers cannot drive the count negative.
pub async fn handle_consume_scan(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Value>, AppError> {
    let (user_id, subscription) = resolve_subscription(&state, &caller.identity_id).await?;

    match scan_decision(subscription.plan, subscription.scans) {
        ScanDecision::Unlimited => Ok(Json(json!({ "scans": "unlimited" }))),
        ScanDecision::Exhausted => {
            Err(AppError::QuotaExhausted("No scans left".to_string()))
        }
        ScanDecision::Decrement => {
            let remaining: Option<i32> = sqlx::query_scalar(
                "UPDATE subscriptions SET scans = scans - 1
                 WHERE user_id = $1 AND scans > 0
                 RETURNING scans",
            )
            .bind(user_id)
            .fetch_optional(&state.db)
            .await?;

            // The allowance can hit zero between the read and the update.
            let Some(remaining) = remaining else {
                return Err(AppError::QuotaExhausted("No scans left".to_string()));
            };

            info!("Scan consumed by {}, {remaining} left", caller.identity_id);
            Ok(Json(json!({ "scans": remaining })))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckIpRequest {
    #[serde(default)]
    pub ip: String,
}

#[derive(Serialize)]
pub struct CheckIpResponse {
    pub allowed: bool,
}

/// POST /api/v1/scans/check-ip
///
/// One free anonymous scan per IP: insert-or-deny against `scan_ips`.
pub async fn handle_check_ip(
    State(state): State<AppState>,
    Json(req): Json<CheckIpRequest>,
) -> Result<Json<CheckIpResponse>, AppError> {
    if req.ip.trim().is_empty() {
        return Err(AppError::Validation("IP address is required".to_string()));
    }

    let inserted = sqlx::query("INSERT INTO scan_ips (ip) VALUES ($1) ON CONFLICT DO NOTHING")
        .bind(req.ip.trim())
        .execute(&state.db)
        .await?
        .rows_affected();

    Ok(Json(CheckIpResponse {
        allowed: inserted == 1,
    }))
}

/// Resolves caller identity → user → subscription, failing with NotFound at
/// whichever step is missing.
async fn resolve_subscription(
    state: &AppState,
    identity_id: &str,
) -> Result<(Uuid, SubscriptionRow), AppError> {
    let user: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE identity_id = $1")
        .bind(identity_id)
        .fetch_optional(&state.db)
        .await?;

    let user = user.ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let subscription: Option<SubscriptionRow> =
        sqlx::query_as("SELECT * FROM subscriptions WHERE user_id = $1")
            .bind(user.id)
            .fetch_optional(&state.db)
            .await?;

    let subscription =
        subscription.ok_or_else(|| AppError::NotFound("Subscription not found".to_string()))?;

    Ok((user.id, subscription))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annual_is_always_unlimited() {
        assert_eq!(scan_decision(PlanTier::Annual, None), ScanDecision::Unlimited);
        // Even a stray stored count never gets decremented on annual.
        assert_eq!(
            scan_decision(PlanTier::Annual, Some(5)),
            ScanDecision::Unlimited
        );
    }

    #[test]
    fn test_finite_plans_decrement_with_headroom() {
        assert_eq!(scan_decision(PlanTier::Free, Some(3)), ScanDecision::Decrement);
        assert_eq!(
            scan_decision(PlanTier::Monthly, Some(1)),
            ScanDecision::Decrement
        );
    }

    #[test]
    fn test_zero_scans_is_exhausted() {
        assert_eq!(scan_decision(PlanTier::Free, Some(0)), ScanDecision::Exhausted);
        assert_eq!(
            scan_decision(PlanTier::Monthly, Some(0)),
            ScanDecision::Exhausted
        );
    }

    #[test]
    fn test_null_scans_on_finite_plan_is_exhausted() {
        // A finite plan should never carry the unlimited sentinel; treat it
        // as depleted rather than minting free scans.
        assert_eq!(scan_decision(PlanTier::Free, None), ScanDecision::Exhausted);
    }
}
