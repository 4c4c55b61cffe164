//! Subscription tiers and the per-user scan allowance that gates resume
//! analysis, plus the billing-processor webhook that upgrades plans.

pub mod quota;
pub mod webhook;
