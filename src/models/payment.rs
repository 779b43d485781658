use crate::entities::payment_entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PrepareTopUpRequest {
    #[schema(example = 10000)]
    pub amount: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PrepareTopUpResponse {
    pub merchant_uid: String,
    pub amount: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CompleteTopUpRequest {
    pub merchant_uid: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    pub merchant_uid: String,
    pub imp_uid: Option<String>,
    pub amount: i64,
    pub status: String,
    pub pay_method: Option<String>,
    pub receipt_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<payment_entity::Model> for PaymentResponse {
    fn from(m: payment_entity::Model) -> Self {
        Self {
            merchant_uid: m.merchant_uid,
            imp_uid: m.imp_uid,
            amount: m.amount,
            status: m.status,
            pay_method: m.pay_method,
            receipt_url: m.receipt_url,
            created_at: m.created_at,
        }
    }
}
