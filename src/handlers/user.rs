use crate::handlers::{created, current_user_id, success};
use crate::models::*;
use crate::services::UserService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Utc;
use serde_json::json;

#[utoipa::path(
    get,
    path = "/users/me",
    tag = "user",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "获取用户资料成功", body = ProfileResponse),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_profile(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match user_service.get_profile(user_id).await {
        Ok(profile) => Ok(success(profile)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/users/me",
    tag = "user",
    request_body = UpdateUserRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "更新用户资料成功", body = UserResponse),
        (status = 400, description = "请求参数错误")
    )
)]
pub async fn update_profile(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    request: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match user_service.update_profile(user_id, request.into_inner()).await {
        Ok(user) => Ok(success(user)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/users/me/password",
    tag = "user",
    request_body = ChangePasswordRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "密码已修改"),
        (status = 400, description = "当前密码错误或新密码不符合规则")
    )
)]
pub async fn change_password(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    request: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match user_service.change_password(user_id, request.into_inner()).await {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/users/me/phone",
    tag = "user",
    request_body = PhoneCodeRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "短信验证码已发送"),
        (status = 400, description = "手机号格式错误")
    )
)]
pub async fn request_phone_code(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    request: web::Json<PhoneCodeRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match user_service
        .request_phone_code(user_id, request.into_inner(), Utc::now())
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Phone code sent"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/users/me/phone/verify",
    tag = "user",
    request_body = VerifyPhoneRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "手机认证成功", body = UserResponse),
        (status = 400, description = "验证码错误或已过期")
    )
)]
pub async fn verify_phone(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    request: web::Json<VerifyPhoneRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match user_service
        .verify_phone(user_id, request.into_inner(), Utc::now())
        .await
    {
        Ok(user) => Ok(success(user)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/users/me/seller",
    tag = "seller",
    request_body = SellerApplyRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "卖家申请已提交", body = SellerResponse),
        (status = 409, description = "已提交过申请")
    )
)]
pub async fn apply_seller(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    request: web::Json<SellerApplyRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match user_service.apply_seller(user_id, request.into_inner()).await {
        Ok(seller) => Ok(created(seller)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/users/me/seller",
    tag = "seller",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "卖家信息", body = SellerResponse),
        (status = 404, description = "未申请卖家")
    )
)]
pub async fn get_seller(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match user_service.get_seller(user_id).await {
        Ok(seller) => Ok(success(seller)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/users/me/seller",
    tag = "seller",
    request_body = UpdateSellerRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "卖家信息已更新", body = SellerResponse),
        (status = 404, description = "未申请卖家")
    )
)]
pub async fn update_seller(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    request: web::Json<UpdateSellerRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match user_service.update_seller(user_id, request.into_inner()).await {
        Ok(seller) => Ok(success(seller)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/users/me/seller",
    tag = "seller",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "已注销卖家"),
        (status = 409, description = "仍有未完结订单")
    )
)]
pub async fn withdraw_seller(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match user_service.withdraw_seller(user_id).await {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/users/me/deliveries",
    tag = "user",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "配送地址列表", body = [DeliveryResponse])
    )
)]
pub async fn list_deliveries(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match user_service.list_deliveries(user_id).await {
        Ok(list) => Ok(success(list)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/users/me/deliveries",
    tag = "user",
    request_body = DeliveryRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "配送地址已添加", body = DeliveryResponse),
        (status = 400, description = "参数错误、超过 5 个或手机未认证")
    )
)]
pub async fn create_delivery(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    request: web::Json<DeliveryRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match user_service.create_delivery(user_id, request.into_inner()).await {
        Ok(delivery) => Ok(created(delivery)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/users/me/deliveries/{delivery_id}",
    tag = "user",
    request_body = DeliveryRequest,
    params(("delivery_id" = i64, Path, description = "配送地址 ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "配送地址已更新", body = DeliveryResponse),
        (status = 404, description = "配送地址不存在")
    )
)]
pub async fn update_delivery(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<DeliveryRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match user_service
        .update_delivery(user_id, path.into_inner(), request.into_inner())
        .await
    {
        Ok(delivery) => Ok(success(delivery)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/users/me/deliveries/{delivery_id}",
    tag = "user",
    params(("delivery_id" = i64, Path, description = "配送地址 ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "配送地址已删除"),
        (status = 404, description = "配送地址不存在")
    )
)]
pub async fn delete_delivery(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match user_service.delete_delivery(user_id, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn user_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users/me")
            .route("", web::get().to(get_profile))
            .route("", web::put().to(update_profile))
            .route("/password", web::put().to(change_password))
            .route("/phone", web::post().to(request_phone_code))
            .route("/phone/verify", web::post().to(verify_phone))
            .route("/seller", web::get().to(get_seller))
            .route("/seller", web::post().to(apply_seller))
            .route("/seller", web::put().to(update_seller))
            .route("/seller", web::delete().to(withdraw_seller))
            .route("/deliveries", web::get().to(list_deliveries))
            .route("/deliveries", web::post().to(create_delivery))
            .route("/deliveries/{delivery_id}", web::put().to(update_delivery))
            .route("/deliveries/{delivery_id}", web::delete().to(delete_delivery)),
    );
}
