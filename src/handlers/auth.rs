use crate::handlers::{created, success};
use crate::models::*;
use crate::services::AuthService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use chrono::Utc;
use serde_json::json;

#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "注册成功，等待邮箱验证", body = UserResponse),
        (status = 400, description = "请求参数错误"),
        (status = 409, description = "邮箱已注册")
    )
)]
pub async fn signup(
    auth_service: web::Data<AuthService>,
    request: web::Json<SignupRequest>,
) -> Result<HttpResponse> {
    match auth_service.signup(request.into_inner()).await {
        Ok(user) => Ok(created(user)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/verify",
    tag = "auth",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "邮箱验证成功，账户激活并解除锁定", body = UserResponse),
        (status = 400, description = "验证码错误或已过期"),
        (status = 404, description = "用户不存在")
    )
)]
pub async fn verify(
    auth_service: web::Data<AuthService>,
    request: web::Json<VerifyEmailRequest>,
) -> Result<HttpResponse> {
    match auth_service.verify_email(request.into_inner(), Utc::now()).await {
        Ok(user) => Ok(success(user)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/resend-code",
    tag = "auth",
    request_body = ResendCodeRequest,
    responses(
        (status = 200, description = "验证码已重新发送（激活或解锁）"),
        (status = 404, description = "用户不存在"),
        (status = 409, description = "账户已验证且未被锁定")
    )
)]
pub async fn resend_code(
    auth_service: web::Data<AuthService>,
    request: web::Json<ResendCodeRequest>,
) -> Result<HttpResponse> {
    match auth_service.resend_code(&request.email, Utc::now()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Verification code sent"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "登录成功", body = AuthResponse),
        (status = 401, description = "认证失败或账户被锁定")
    )
)]
pub async fn login(
    auth_service: web::Data<AuthService>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    match auth_service.login(request.into_inner()).await {
        Ok(response) => Ok(success(response)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "auth",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "刷新令牌成功", body = AuthResponse),
        (status = 401, description = "刷新令牌无效")
    )
)]
pub async fn refresh(
    auth_service: web::Data<AuthService>,
    request: web::Json<RefreshTokenRequest>,
) -> Result<HttpResponse> {
    match auth_service.refresh_token(&request.refresh_token).await {
        Ok(response) => Ok(success(response)),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn auth_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/signup", web::post().to(signup))
            .route("/verify", web::post().to(verify))
            .route("/resend-code", web::post().to(resend_code))
            .route("/login", web::post().to(login))
            .route("/refresh", web::post().to(refresh)),
    );
}
