use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Product lifecycle. Only `OnSale` products can be bought.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    ToSchema,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    #[sea_orm(num_value = 1)]
    OnSale,
    #[sea_orm(num_value = 2)]
    SoldOut,
    #[sea_orm(num_value = 6)]
    Deleted,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// sellers.id (not the seller's user id)
    pub seller_id: i64,
    pub category_id: Option<i64>,
    pub name: String,
    pub content: String,
    pub price: i64,
    /// Remaining stock.
    pub amount: i64,
    pub item_state: ItemState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_sellable(&self) -> bool {
        self.item_state == ItemState::OnSale
    }
}
