use crate::handlers::{current_user_id, success};
use crate::models::*;
use crate::services::SubscriptionService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Utc;

#[utoipa::path(
    get,
    path = "/subscription",
    tag = "subscription",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "订阅状态", body = SubscriptionResponse),
        (status = 404, description = "没有订阅记录")
    )
)]
pub async fn get_subscription(
    subscription_service: web::Data<SubscriptionService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match subscription_service.get(user_id).await {
        Ok(sub) => Ok(success(sub)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/subscription",
    tag = "subscription",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "订阅成功并扣除首期费用", body = SubscriptionResponse),
        (status = 403, description = "积分不足"),
        (status = 409, description = "已在订阅中")
    )
)]
pub async fn subscribe(
    subscription_service: web::Data<SubscriptionService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match subscription_service
        .subscribe(user_id, Utc::now().date_naive())
        .await
    {
        Ok(sub) => Ok(success(sub)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/subscription",
    tag = "subscription",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "已取消订阅", body = SubscriptionResponse),
        (status = 404, description = "没有订阅记录")
    )
)]
pub async fn cancel_subscription(
    subscription_service: web::Data<SubscriptionService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match subscription_service.cancel(user_id).await {
        Ok(sub) => Ok(success(sub)),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn subscription_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/subscription")
            .route(web::get().to(get_subscription))
            .route(web::post().to(subscribe))
            .route(web::delete().to(cancel_subscription)),
    );
}
