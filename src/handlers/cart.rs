use crate::handlers::{created, current_user_id, success};
use crate::models::*;
use crate::services::CartService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/cart",
    tag = "cart",
    params(CartQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "购物车", body = [CartItemResponse]),
        (status = 400, description = "cart_id 格式错误")
    )
)]
pub async fn list_cart(
    cart_service: web::Data<CartService>,
    req: HttpRequest,
    query: web::Query<CartQuery>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    let ids = match query.ids() {
        Ok(ids) => ids,
        Err(e) => return Ok(e.error_response()),
    };
    match cart_service.list(user_id, ids).await {
        Ok(items) => Ok(success(items)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/cart",
    tag = "cart",
    request_body = AddCartRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "已加入购物车", body = CartItemResponse),
        (status = 400, description = "商品不可购买")
    )
)]
pub async fn add_to_cart(
    cart_service: web::Data<CartService>,
    req: HttpRequest,
    request: web::Json<AddCartRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match cart_service
        .add(user_id, request.product_id, request.amount)
        .await
    {
        Ok(item) => Ok(created(item)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/cart/{cart_id}",
    tag = "cart",
    request_body = UpdateCartRequest,
    params(("cart_id" = i64, Path, description = "购物车条目 ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "数量已更新"),
        (status = 404, description = "条目不存在")
    )
)]
pub async fn update_cart(
    cart_service: web::Data<CartService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdateCartRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match cart_service
        .update_amount(user_id, path.into_inner(), request.amount)
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({ "success": true }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/cart",
    tag = "cart",
    request_body = DeleteCartRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "已删除所选条目"),
        (status = 400, description = "未选择条目")
    )
)]
pub async fn delete_cart(
    cart_service: web::Data<CartService>,
    req: HttpRequest,
    request: web::Json<DeleteCartRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match cart_service.delete(user_id, &request.cart_ids).await {
        Ok(deleted) => Ok(success(json!({ "deleted": deleted }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn cart_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/cart")
            .route("", web::get().to(list_cart))
            .route("", web::post().to(add_to_cart))
            .route("", web::delete().to(delete_cart))
            .route("/{cart_id}", web::put().to(update_cart)),
    );
}
