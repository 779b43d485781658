use crate::utils::Ciphertext;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 订单（收货信息 + 支付状态）
/// 地址快照沿用配送信息的密文，is_paid 置为 true 后不再修改
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "bills")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    #[sea_orm(column_type = "Text")]
    pub address: Ciphertext,
    #[sea_orm(column_type = "Text")]
    pub detail_address: Ciphertext,
    #[sea_orm(column_type = "Text")]
    pub recipient: Ciphertext,
    #[sea_orm(column_type = "Text")]
    pub postal_code: Ciphertext,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
