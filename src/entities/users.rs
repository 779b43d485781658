use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};

/// 邮箱验证码的用途
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, DeriveActiveEnum, EnumIter)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
#[serde(rename_all = "snake_case")]
pub enum VerificationPurpose {
    /// 注册后激活账户
    #[sea_orm(num_value = 1)]
    Activate,
    /// 登录失败过多后解锁
    #[sea_orm(num_value = 2)]
    Unlock,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub email: String,
    pub nickname: String,
    pub password_hash: String,
    /// Pending email code, cleared once used or expired.
    pub auth_code: Option<String>,
    pub auth_code_purpose: Option<VerificationPurpose>,
    pub auth_code_issued_at: Option<DateTime<Utc>>,
    pub login_attempts_count: i32,
    pub is_active: bool,
    /// Seller application approved by an admin.
    pub is_seller: bool,
    pub is_admin: bool,
    pub phone_number: Option<String>,
    pub phone_code: Option<String>,
    pub phone_code_issued_at: Option<DateTime<Utc>>,
    /// 添加配送地址前必须完成手机验证
    pub phone_verified: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
