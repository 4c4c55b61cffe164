use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "plan_tier", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    Free,
    Monthly,
    Annual,
}

impl PlanTier {
    /// Scan allowance granted when a plan starts. `None` is the unlimited
    /// sentinel used by `annual` and is never decremented.
    pub fn initial_scans(self) -> Option<i32> {
        match self {
            PlanTier::Free => Some(3),
            PlanTier::Monthly => Some(50),
            PlanTier::Annual => None,
        }
    }
}

/// One-to-one with a user. `scans` is NULL for unlimited (annual).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan: PlanTier,
    pub scans: Option<i32>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_scans_per_plan() {
        assert_eq!(PlanTier::Free.initial_scans(), Some(3));
        assert_eq!(PlanTier::Monthly.initial_scans(), Some(50));
        assert_eq!(PlanTier::Annual.initial_scans(), None);
    }

    #[test]
    fn test_plan_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&PlanTier::Monthly).unwrap(),
            "\"monthly\""
        );
    }
}
