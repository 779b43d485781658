use crate::handlers::{created, current_user_id, success};
use crate::models::*;
use crate::services::BillService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/bills",
    tag = "order",
    request_body = CreateBillRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "账单已创建", body = BillResponse),
        (status = 400, description = "地址信息不完整")
    )
)]
pub async fn create_bill(
    bill_service: web::Data<BillService>,
    req: HttpRequest,
    request: web::Json<CreateBillRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match bill_service.create(user_id, request.into_inner()).await {
        Ok(bill) => Ok(created(bill)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/bills",
    tag = "order",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "我的账单", body = [BillResponse]))
)]
pub async fn list_bills(
    bill_service: web::Data<BillService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match bill_service.list(user_id).await {
        Ok(list) => Ok(success(list)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/bills/{bill_id}",
    tag = "order",
    params(("bill_id" = i64, Path, description = "账单 ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "账单详情（含订单明细）", body = BillResponse),
        (status = 404, description = "账单不存在")
    )
)]
pub async fn get_bill(
    bill_service: web::Data<BillService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match bill_service.detail(user_id, path.into_inner()).await {
        Ok(bill) => Ok(success(bill)),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn bill_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/bills")
            .route("", web::get().to(list_bills))
            .route("", web::post().to(create_bill))
            .route("/{bill_id}", web::get().to(get_bill)),
    );
}
