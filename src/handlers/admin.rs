use crate::error::AppError;
use crate::handlers::{created, current_user_id, success};
use crate::models::*;
use crate::services::{ProductService, SweepService, UserService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Utc;

#[utoipa::path(
    post,
    path = "/admin/sweeps",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "全部清理任务执行完成", body = SweepReport),
        (status = 403, description = "不是管理员")
    )
)]
pub async fn run_all_sweeps(
    user_service: web::Data<UserService>,
    sweep_service: web::Data<SweepService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    if let Err(e) = user_service.ensure_admin(user_id).await {
        return Ok(e.error_response());
    }
    match sweep_service.run_all(Utc::now()).await {
        Ok(report) => Ok(success(report)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/sweeps/{sweep}",
    tag = "admin",
    params(("sweep" = String, Path, description = "subscriptions | orders | chat | accounts")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "清理任务执行完成", body = SweepReport),
        (status = 403, description = "不是管理员"),
        (status = 404, description = "未知的清理任务")
    )
)]
pub async fn run_sweep(
    user_service: web::Data<UserService>,
    sweep_service: web::Data<SweepService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    if let Err(e) = user_service.ensure_admin(user_id).await {
        return Ok(e.error_response());
    }

    let now = Utc::now();
    let result = match path.as_str() {
        "subscriptions" => sweep_service.renew_subscriptions(now).await,
        "orders" => sweep_service.auto_confirm_orders(now).await,
        "chat" => sweep_service.purge_chat_logs(now).await,
        "accounts" => sweep_service.account_housekeeping(now).await,
        other => Err(AppError::NotFound(format!("Unknown sweep {other}"))),
    };
    match result {
        Ok(report) => Ok(success(report)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/sellers/{user_id}/approval",
    tag = "admin",
    request_body = SellerApprovalRequest,
    params(("user_id" = i64, Path, description = "申请人的用户 ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "审核结果已保存", body = SellerResponse),
        (status = 403, description = "不是管理员"),
        (status = 404, description = "没有卖家申请")
    )
)]
pub async fn set_seller_approval(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<SellerApprovalRequest>,
) -> Result<HttpResponse> {
    let admin_id = current_user_id(&req)?;
    match user_service
        .set_seller_approval(admin_id, path.into_inner(), request.approved)
        .await
    {
        Ok(seller) => Ok(success(seller)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/categories",
    tag = "admin",
    request_body = CreateCategoryRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "分类已创建", body = CategoryResponse),
        (status = 403, description = "不是管理员"),
        (status = 409, description = "分类已存在")
    )
)]
pub async fn create_category(
    product_service: web::Data<ProductService>,
    req: HttpRequest,
    request: web::Json<CreateCategoryRequest>,
) -> Result<HttpResponse> {
    let admin_id = current_user_id(&req)?;
    match product_service.create_category(admin_id, &request.name).await {
        Ok(category) => Ok(created(category)),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/sweeps", web::post().to(run_all_sweeps))
            .route("/sweeps/{sweep}", web::post().to(run_sweep))
            .route("/sellers/{user_id}/approval", web::put().to(set_seller_approval))
            .route("/categories", web::post().to(create_category)),
    );
}
