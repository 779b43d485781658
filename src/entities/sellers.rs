use crate::utils::Ciphertext;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 卖家档案
/// - company_name / business_number / business_owner_name / contact_number 明文
/// - 银行相关字段加密存储，读取时通过 FieldCipher 解密
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "sellers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub company_name: String,
    pub business_number: String,
    pub business_owner_name: String,
    pub contact_number: String,
    #[sea_orm(column_type = "Text")]
    pub bank_name: Ciphertext,
    #[sea_orm(column_type = "Text")]
    pub account_number: Ciphertext,
    #[sea_orm(column_type = "Text")]
    pub account_holder: Ciphertext,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
