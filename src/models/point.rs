use crate::entities::{PointType, point_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BalanceResponse {
    pub balance: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PointEntryResponse {
    pub id: i64,
    pub point_type: PointType,
    pub amount: i64,
    /// Negative for debits
    pub signed_amount: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AttendanceResponse {
    pub earned: i64,
    pub balance: i64,
}

impl From<point_entity::Model> for PointEntryResponse {
    fn from(m: point_entity::Model) -> Self {
        Self {
            id: m.id,
            signed_amount: m.point_type.signed(m.amount),
            point_type: m.point_type,
            amount: m.amount,
            created_at: m.created_at,
        }
    }
}
