use crate::utils::Ciphertext;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "deliveries")]
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
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
