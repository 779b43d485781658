use crate::entities::subscription_entity;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionResponse {
    pub subscribe: bool,
    pub next_payment: NaiveDate,
    pub last_renewed_on: Option<NaiveDate>,
}

impl From<subscription_entity::Model> for SubscriptionResponse {
    fn from(m: subscription_entity::Model) -> Self {
        Self {
            subscribe: m.subscribe,
            next_payment: m.next_payment,
            last_renewed_on: m.last_renewed_on,
        }
    }
}
