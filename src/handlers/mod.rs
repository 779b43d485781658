pub mod admin;
pub mod auth;
pub mod bill;
pub mod cart;
pub mod catalog;
pub mod chat;
pub mod order;
pub mod payment;
pub mod point;
pub mod subscription;
pub mod user;
pub mod ws;

pub use admin::admin_config;
pub use auth::auth_config;
pub use bill::bill_config;
pub use cart::cart_config;
pub use catalog::catalog_config;
pub use chat::chat_config;
pub use order::order_config;
pub use payment::payment_config;
pub use point::point_config;
pub use subscription::subscription_config;
pub use user::user_config;
pub use ws::ws_config;

use crate::error::{AppError, AppResult};
use actix_web::{HttpMessage, HttpRequest, HttpResponse};
use crate::models::ApiResponse;
use serde::Serialize;

/// 认证中间件写入请求扩展的用户 ID
pub(crate) fn current_user_id(req: &HttpRequest) -> AppResult<i64> {
    req.extensions()
        .get::<i64>()
        .copied()
        .ok_or_else(|| AppError::AuthError("Missing access token".to_string()))
}

pub(crate) fn success<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success(data))
}

pub(crate) fn created<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Created().json(ApiResponse::success(data))
}
