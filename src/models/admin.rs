use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Counts from one pass of the scheduled sweeps.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SweepReport {
    pub subscriptions_deleted: u64,
    pub subscriptions_renewed: u64,
    pub subscriptions_lapsed: u64,
    pub orders_auto_confirmed: u64,
    pub messages_purged: u64,
    pub accounts_deleted: u64,
    pub accounts_deactivated: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RenewalReport {
    pub deleted: u64,
    pub renewed: u64,
    pub lapsed: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HousekeepingReport {
    pub deleted: u64,
    pub deactivated: u64,
}
