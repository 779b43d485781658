use crate::entities::{OrderStatus, order_item_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub bill_id: i64,
    /// Selected cart lines
    pub cart_ids: Vec<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckoutResponse {
    pub bill_id: i64,
    pub total_price: i64,
    pub cashback: i64,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChangeStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: i64,
    pub bill_id: i64,
    pub product_id: i64,
    pub seller_id: i64,
    pub name: String,
    pub price: i64,
    pub amount: i64,
    pub total_price: i64,
    pub order_status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<order_item_entity::Model> for OrderItemResponse {
    fn from(m: order_item_entity::Model) -> Self {
        Self {
            total_price: m.total_price(),
            id: m.id,
            bill_id: m.bill_id,
            product_id: m.product_id,
            seller_id: m.seller_id,
            name: m.name,
            price: m.price,
            amount: m.amount,
            order_status: m.order_status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
