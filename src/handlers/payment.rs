use crate::handlers::{current_user_id, success};
use crate::models::*;
use crate::services::PaymentService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/payments/prepare",
    tag = "payment",
    request_body = PrepareTopUpRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "已登记充值金额", body = PrepareTopUpResponse),
        (status = 400, description = "金额无效"),
        (status = 502, description = "支付网关错误")
    )
)]
pub async fn prepare_top_up(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
    request: web::Json<PrepareTopUpRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match payment_service.prepare_top_up(user_id, request.amount).await {
        Ok(response) => Ok(success(response)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/payments/complete",
    tag = "payment",
    request_body = CompleteTopUpRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "充值到账", body = PaymentResponse),
        (status = 400, description = "未支付或金额不符"),
        (status = 404, description = "充值记录不存在"),
        (status = 502, description = "支付网关错误")
    )
)]
pub async fn complete_top_up(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
    request: web::Json<CompleteTopUpRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match payment_service
        .complete_top_up(user_id, &request.merchant_uid)
        .await
    {
        Ok(payment) => Ok(success(payment)),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn payment_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payments")
            .route("/prepare", web::post().to(prepare_top_up))
            .route("/complete", web::post().to(complete_top_up)),
    );
}
