use crate::handlers::{current_user_id, success};
use crate::models::*;
use crate::services::PointService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Utc;

#[utoipa::path(
    get,
    path = "/points/balance",
    tag = "point",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "当前积分余额", body = BalanceResponse))
)]
pub async fn get_balance(
    point_service: web::Data<PointService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match point_service.balance(user_id).await {
        Ok(balance) => Ok(success(balance)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/points/history",
    tag = "point",
    params(PaginationParams),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "积分流水"))
)]
pub async fn get_history(
    point_service: web::Data<PointService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match point_service.history(user_id, &query).await {
        Ok(page) => Ok(success(page)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/points/attendance",
    tag = "point",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "签到成功", body = AttendanceResponse),
        (status = 409, description = "今天已签到")
    )
)]
pub async fn attend(
    point_service: web::Data<PointService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match point_service.attend(user_id, Utc::now()).await {
        Ok(response) => Ok(success(response)),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn point_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/points")
            .route("/balance", web::get().to(get_balance))
            .route("/history", web::get().to(get_history))
            .route("/attendance", web::post().to(attend)),
    );
}
