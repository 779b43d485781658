use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeliveryRequest {
    #[schema(example = "서울특별시 강남구 테헤란로 1")]
    pub address: String,
    #[serde(default)]
    pub detail_address: String,
    #[schema(example = "홍길동")]
    pub recipient: String,
    #[schema(example = "06236")]
    pub postal_code: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeliveryResponse {
    pub id: i64,
    pub address: String,
    pub detail_address: String,
    pub recipient: String,
    pub postal_code: String,
    pub created_at: DateTime<Utc>,
}
