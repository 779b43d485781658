use crate::models::OrderItemResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Either a saved delivery or an inline address.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateBillRequest {
    pub delivery_id: Option<i64>,
    pub address: Option<String>,
    pub detail_address: Option<String>,
    pub recipient: Option<String>,
    pub postal_code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BillResponse {
    pub id: i64,
    pub address: String,
    pub detail_address: String,
    pub recipient: String,
    pub postal_code: String,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<OrderItemResponse>>,
}
