use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SellerApplyRequest {
    pub company_name: String,
    pub business_number: String,
    pub business_owner_name: String,
    pub contact_number: String,
    pub bank_name: String,
    pub account_number: String,
    pub account_holder: String,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateSellerRequest {
    pub company_name: Option<String>,
    pub business_number: Option<String>,
    pub business_owner_name: Option<String>,
    pub contact_number: Option<String>,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub account_holder: Option<String>,
}

/// Seller profile with the bank fields decrypted.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SellerResponse {
    pub id: i64,
    pub user_id: i64,
    pub company_name: String,
    pub business_number: String,
    pub business_owner_name: String,
    pub contact_number: String,
    pub bank_name: String,
    pub account_number: String,
    pub account_holder: String,
    /// Whether an admin approved the application.
    pub approved: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SellerApprovalRequest {
    pub approved: bool,
}
