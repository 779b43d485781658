use crate::entities::user_entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SignupRequest {
    #[schema(example = "choco@example.com")]
    pub email: String,
    #[schema(example = "초코")]
    pub nickname: String,
    #[schema(example = "choco12!")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyEmailRequest {
    #[schema(example = "choco@example.com")]
    pub email: String,
    #[schema(example = "123456")]
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResendCodeRequest {
    #[schema(example = "choco@example.com")]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "choco@example.com")]
    pub email: String,
    #[schema(example = "choco12!")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub nickname: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    /// 当前密码
    #[schema(example = "choco12!")]
    pub password: String,
    #[schema(example = "choco34@")]
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PhoneCodeRequest {
    #[schema(example = "01012345678")]
    pub phone_number: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyPhoneRequest {
    #[schema(example = "1234")]
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub nickname: String,
    pub is_active: bool,
    pub is_seller: bool,
    pub is_admin: bool,
    pub phone_number: Option<String>,
    pub phone_verified: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub user: UserResponse,
    /// Derived from the point ledger on every call.
    pub point_balance: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

impl From<user_entity::Model> for UserResponse {
    fn from(user: user_entity::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            nickname: user.nickname,
            is_active: user.is_active,
            is_seller: user.is_seller,
            is_admin: user.is_admin,
            phone_number: user.phone_number,
            phone_verified: user.phone_verified,
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}
