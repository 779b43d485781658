use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 积分流水类型。金额恒为非负，方向由类型决定。
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    ToSchema,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
#[serde(rename_all = "snake_case")]
pub enum PointType {
    #[sea_orm(num_value = 1)]
    Attendance,
    #[sea_orm(num_value = 2)]
    TextReview,
    #[sea_orm(num_value = 3)]
    PhotoReview,
    #[sea_orm(num_value = 4)]
    PurchaseCashback,
    #[sea_orm(num_value = 5)]
    TopUp,
    #[sea_orm(num_value = 6)]
    SubscriptionFee,
    #[sea_orm(num_value = 7)]
    Payment,
    #[sea_orm(num_value = 8)]
    Settlement,
    #[sea_orm(num_value = 9)]
    Refund,
}

impl PointType {
    pub fn is_accrual(self) -> bool {
        !matches!(self, PointType::SubscriptionFee | PointType::Payment)
    }

    /// Contribution of `amount` to the balance.
    pub fn signed(self, amount: i64) -> i64 {
        if self.is_accrual() { amount } else { -amount }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "points")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub point_type: PointType,
    pub amount: i64,
    /// 仅签到流水有值，(user_id, attended_on) 唯一
    pub attended_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn test_only_fee_and_payment_are_debits() {
        let debits: Vec<PointType> = PointType::iter().filter(|t| !t.is_accrual()).collect();
        assert_eq!(debits, vec![PointType::SubscriptionFee, PointType::Payment]);
        assert_eq!(PointType::Refund.signed(500), 500);
        assert_eq!(PointType::Payment.signed(500), -500);
    }
}
