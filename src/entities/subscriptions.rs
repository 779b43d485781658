use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;

/// 订阅（每个用户一条）
/// subscribe=false 表示已退订或续费失败，记录保留
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub subscribe: bool,
    pub next_payment: NaiveDate,
    pub last_renewed_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
