use crate::handlers::{current_user_id, success};
use crate::models::*;
use crate::services::OrderService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/orders/checkout",
    tag = "order",
    request_body = CheckoutRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "结算成功", body = CheckoutResponse),
        (status = 400, description = "未选择购物车条目或商品不可购买"),
        (status = 403, description = "积分不足"),
        (status = 409, description = "账单已支付或库存不足")
    )
)]
pub async fn checkout(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    request: web::Json<CheckoutRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match order_service.checkout(user_id, request.into_inner()).await {
        Ok(response) => Ok(success(response)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/orders",
    tag = "order",
    params(OrderQuery),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "我购买的订单明细"))
)]
pub async fn list_orders(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    query: web::Query<OrderQuery>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match order_service.list_buyer_items(user_id, &query).await {
        Ok(page) => Ok(success(page)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/orders/seller",
    tag = "order",
    params(OrderQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "我售出的订单明细"),
        (status = 403, description = "不是卖家")
    )
)]
pub async fn list_seller_orders(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    query: web::Query<OrderQuery>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match order_service.list_seller_items(user_id, &query).await {
        Ok(page) => Ok(success(page)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/orders/{item_id}",
    tag = "order",
    params(("item_id" = i64, Path, description = "订单明细 ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "订单明细", body = OrderItemResponse),
        (status = 403, description = "既不是买家也不是卖家")
    )
)]
pub async fn get_order(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match order_service.item_detail(user_id, path.into_inner()).await {
        Ok(item) => Ok(success(item)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/orders/{item_id}/status",
    tag = "order",
    request_body = ChangeStatusRequest,
    params(("item_id" = i64, Path, description = "订单明细 ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "状态已变更", body = OrderItemResponse),
        (status = 403, description = "无权执行该变更"),
        (status = 422, description = "不允许的状态变更")
    )
)]
pub async fn change_status(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<ChangeStatusRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match order_service
        .change_status(user_id, path.into_inner(), request.status)
        .await
    {
        Ok(item) => Ok(success(item)),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn order_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/orders")
            .route("", web::get().to(list_orders))
            .route("/checkout", web::post().to(checkout))
            .route("/seller", web::get().to(list_seller_orders))
            .route("/{item_id}", web::get().to(get_order))
            .route("/{item_id}/status", web::put().to(change_status)),
    );
}
