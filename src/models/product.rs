use crate::entities::{ItemState, category_entity, product_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const PRODUCT_PAGE_SIZE: i64 = 9;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductOrdering {
    Expensive,
    Cheap,
    Recent,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Seller's user id
    pub user_id: Option<i64>,
    /// Matches name or content
    pub search: Option<String>,
    pub category: Option<i64>,
    pub ordering: Option<ProductOrdering>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub category_id: Option<i64>,
    pub name: String,
    pub content: String,
    pub price: i64,
    pub amount: i64,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub category_id: Option<i64>,
    pub name: Option<String>,
    pub content: Option<String>,
    pub price: Option<i64>,
    pub amount: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: i64,
    pub seller_id: i64,
    pub category_id: Option<i64>,
    pub name: String,
    pub content: String,
    pub price: i64,
    pub amount: i64,
    pub item_state: ItemState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<product_entity::Model> for ProductResponse {
    fn from(m: product_entity::Model) -> Self {
        Self {
            id: m.id,
            seller_id: m.seller_id,
            category_id: m.category_id,
            name: m.name,
            content: m.content,
            price: m.price,
            amount: m.amount,
            item_state: m.item_state,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<category_entity::Model> for CategoryResponse {
    fn from(m: category_entity::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
        }
    }
}
