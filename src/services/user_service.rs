use crate::entities::{
    ItemState, OrderStatus, cart_item_entity as cart_items, delivery_entity as deliveries, order_item_entity as order_items,
    product_entity as products, seller_entity as sellers, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::point_service::net_balance_on;
use crate::utils::*;
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

pub const MAX_DELIVERIES: u64 = 5;
const UNVERIFIED_RETENTION_DAYS: i64 = 2;
const IDLE_DEACTIVATION_DAYS: i64 = 30;
/// 停用超过该天数的账户被删除
const INACTIVE_RETENTION_DAYS: i64 = 30;

/// 管理员校验
pub async fn require_admin<C: ConnectionTrait>(conn: &C, user_id: i64) -> AppResult<users::Model> {
    let user = users::Entity::find_by_id(user_id)
        .one(conn)
        .await?
        .ok_or(AppError::Forbidden)?;
    if !user.is_admin {
        return Err(AppError::Forbidden);
    }
    Ok(user)
}

/// 已审核通过的卖家档案
pub async fn approved_seller<C: ConnectionTrait>(conn: &C, user_id: i64) -> AppResult<sellers::Model> {
    let user = users::Entity::find_by_id(user_id)
        .one(conn)
        .await?
        .ok_or(AppError::Forbidden)?;
    if !user.is_seller {
        return Err(AppError::Forbidden);
    }
    sellers::Entity::find()
        .filter(sellers::Column::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or(AppError::Forbidden)
}

#[derive(Clone)]
pub struct UserService {
    pool: DatabaseConnection,
    cipher: FieldCipher,
}

impl UserService {
    pub fn new(pool: DatabaseConnection, cipher: FieldCipher) -> Self {
        Self { pool, cipher }
    }

    async fn find_user(&self, user_id: i64) -> AppResult<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn ensure_admin(&self, user_id: i64) -> AppResult<()> {
        require_admin(&self.pool, user_id).await.map(|_| ())
    }

    // -----------------------------
    // 个人资料
    // -----------------------------

    pub async fn get_profile(&self, user_id: i64) -> AppResult<ProfileResponse> {
        let user = self.find_user(user_id).await?;
        let point_balance = net_balance_on(&self.pool, user_id).await?;
        Ok(ProfileResponse {
            user: user.into(),
            point_balance,
        })
    }

    pub async fn update_profile(&self, user_id: i64, request: UpdateUserRequest) -> AppResult<UserResponse> {
        let user = self.find_user(user_id).await?;
        let mut am = user.into_active_model();

        if let Some(nickname) = request.nickname {
            validate_nickname(&nickname)?;
            am.nickname = Set(nickname);
        }
        am.updated_at = Set(Utc::now());

        Ok(am.update(&self.pool).await?.into())
    }

    /// 修改密码：需要当前密码，新密码同样受密码规则约束
    pub async fn change_password(&self, user_id: i64, request: ChangePasswordRequest) -> AppResult<()> {
        let user = self.find_user(user_id).await?;
        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AppError::ValidationError(
                "Current password does not match".to_string(),
            ));
        }
        validate_password(&request.new_password)?;
        if request.new_password == request.password {
            return Err(AppError::ValidationError(
                "New password must differ from the current one".to_string(),
            ));
        }

        let mut am = user.into_active_model();
        am.password_hash = Set(hash_password(&request.new_password)?);
        am.updated_at = Set(Utc::now());
        am.update(&self.pool).await?;

        log::info!("User {user_id} changed password");
        Ok(())
    }

    // -----------------------------
    // 手机认证
    // -----------------------------

    /// 签发 4 位短信验证码。更换号码后需要重新认证。
    pub async fn request_phone_code(
        &self,
        user_id: i64,
        request: PhoneCodeRequest,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let phone_number = request.phone_number.trim().to_string();
        validate_phone_number(&phone_number)?;
        let user = self.find_user(user_id).await?;

        let code = generate_four_digit_code();
        let mut am = user.into_active_model();
        am.phone_number = Set(Some(phone_number.clone()));
        am.phone_code = Set(Some(code.clone()));
        am.phone_code_issued_at = Set(Some(now));
        am.phone_verified = Set(false);
        am.updated_at = Set(now);
        am.update(&self.pool).await?;

        // 短信网关不在本服务范围内
        log::info!("SMS code for user {user_id} ({phone_number}): {code}");
        Ok(())
    }

    pub async fn verify_phone(
        &self,
        user_id: i64,
        request: VerifyPhoneRequest,
        now: DateTime<Utc>,
    ) -> AppResult<UserResponse> {
        let user = self.find_user(user_id).await?;
        let Some(code) = user.phone_code.clone() else {
            return Err(AppError::ValidationError(
                "Request a phone code first".to_string(),
            ));
        };
        if is_code_expired(user.phone_code_issued_at, now) {
            let mut am = user.into_active_model();
            am.phone_code = Set(None);
            am.phone_code_issued_at = Set(None);
            am.update(&self.pool).await?;
            return Err(AppError::ValidationError("Phone code expired".to_string()));
        }
        if code != request.code.trim() {
            return Err(AppError::ValidationError("Invalid phone code".to_string()));
        }

        let mut am = user.into_active_model();
        am.phone_code = Set(None);
        am.phone_code_issued_at = Set(None);
        am.phone_verified = Set(true);
        am.updated_at = Set(now);
        let user = am.update(&self.pool).await?;

        log::info!("User {user_id} verified phone");
        Ok(user.into())
    }

    // -----------------------------
    // 卖家
    // -----------------------------

    fn seller_response(&self, seller: sellers::Model, approved: bool) -> AppResult<SellerResponse> {
        Ok(SellerResponse {
            id: seller.id,
            user_id: seller.user_id,
            bank_name: self.cipher.open(&seller.bank_name)?,
            account_number: self.cipher.open(&seller.account_number)?,
            account_holder: self.cipher.open(&seller.account_holder)?,
            company_name: seller.company_name,
            business_number: seller.business_number,
            business_owner_name: seller.business_owner_name,
            contact_number: seller.contact_number,
            approved,
        })
    }

    async fn find_seller(&self, user_id: i64) -> AppResult<sellers::Model> {
        sellers::Entity::find()
            .filter(sellers::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Seller profile not found".to_string()))
    }

    /// 申请成为卖家，等待管理员审核
    pub async fn apply_seller(&self, user_id: i64, req: SellerApplyRequest) -> AppResult<SellerResponse> {
        let user = self.find_user(user_id).await?;
        let existing = sellers::Entity::find()
            .filter(sellers::Column::UserId.eq(user_id))
            .count(&self.pool)
            .await?;
        if existing > 0 {
            return Err(AppError::Conflict("Seller profile already exists".to_string()));
        }
        for (field, value) in [
            ("company_name", &req.company_name),
            ("business_number", &req.business_number),
            ("bank_name", &req.bank_name),
            ("account_number", &req.account_number),
            ("account_holder", &req.account_holder),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::ValidationError(format!("{field} is required")));
            }
        }

        let now = Utc::now();
        let seller = sellers::ActiveModel {
            user_id: Set(user_id),
            company_name: Set(req.company_name),
            business_number: Set(req.business_number),
            business_owner_name: Set(req.business_owner_name),
            contact_number: Set(req.contact_number),
            bank_name: Set(self.cipher.seal(&req.bank_name)?),
            account_number: Set(self.cipher.seal(&req.account_number)?),
            account_holder: Set(self.cipher.seal(&req.account_holder)?),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("Seller application from user {user_id}");
        self.seller_response(seller, user.is_seller)
    }

    pub async fn get_seller(&self, user_id: i64) -> AppResult<SellerResponse> {
        let user = self.find_user(user_id).await?;
        let seller = self.find_seller(user_id).await?;
        self.seller_response(seller, user.is_seller)
    }

    pub async fn update_seller(&self, user_id: i64, req: UpdateSellerRequest) -> AppResult<SellerResponse> {
        let user = self.find_user(user_id).await?;
        let seller = self.find_seller(user_id).await?;
        let mut am = seller.into_active_model();

        if let Some(v) = req.company_name {
            am.company_name = Set(v);
        }
        if let Some(v) = req.business_number {
            am.business_number = Set(v);
        }
        if let Some(v) = req.business_owner_name {
            am.business_owner_name = Set(v);
        }
        if let Some(v) = req.contact_number {
            am.contact_number = Set(v);
        }
        if let Some(v) = req.bank_name {
            am.bank_name = Set(self.cipher.seal(&v)?);
        }
        if let Some(v) = req.account_number {
            am.account_number = Set(self.cipher.seal(&v)?);
        }
        if let Some(v) = req.account_holder {
            am.account_holder = Set(self.cipher.seal(&v)?);
        }
        am.updated_at = Set(Utc::now());

        let seller = am.update(&self.pool).await?;
        self.seller_response(seller, user.is_seller)
    }

    /// 注销卖家：存在未完结订单时不允许；商品全部下架
    pub async fn withdraw_seller(&self, user_id: i64) -> AppResult<()> {
        let seller = self.find_seller(user_id).await?;

        let open_orders = order_items::Entity::find()
            .filter(order_items::Column::SellerId.eq(seller.id))
            .filter(order_items::Column::OrderStatus.is_not_in(OrderStatus::terminal_states()))
            .count(&self.pool)
            .await?;
        if open_orders > 0 {
            return Err(AppError::Conflict(format!(
                "{open_orders} order items are still in progress"
            )));
        }

        let now = Utc::now();
        let txn = self.pool.begin().await?;
        products::Entity::update_many()
            .col_expr(products::Column::ItemState, Expr::value(ItemState::Deleted))
            .col_expr(products::Column::UpdatedAt, Expr::value(now))
            .filter(products::Column::SellerId.eq(seller.id))
            .exec(&txn)
            .await?;
        sellers::Entity::delete_by_id(seller.id).exec(&txn).await?;
        users::Entity::update_many()
            .col_expr(users::Column::IsSeller, Expr::value(false))
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(users::Column::Id.eq(user_id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        log::info!("Seller {} (user {user_id}) withdrew", seller.id);
        Ok(())
    }

    /// 管理员审核卖家申请
    pub async fn set_seller_approval(
        &self,
        admin_id: i64,
        target_user_id: i64,
        approved: bool,
    ) -> AppResult<SellerResponse> {
        require_admin(&self.pool, admin_id).await?;
        let seller = self.find_seller(target_user_id).await?;
        let user = self.find_user(target_user_id).await?;

        let mut am = user.into_active_model();
        am.is_seller = Set(approved);
        am.updated_at = Set(Utc::now());
        am.update(&self.pool).await?;

        log::info!("Admin {admin_id} set seller approval of user {target_user_id} to {approved}");
        self.seller_response(seller, approved)
    }

    // -----------------------------
    // 配送地址
    // -----------------------------

    fn delivery_response(&self, d: deliveries::Model) -> AppResult<DeliveryResponse> {
        Ok(DeliveryResponse {
            id: d.id,
            address: self.cipher.open(&d.address)?,
            detail_address: self.cipher.open(&d.detail_address)?,
            recipient: self.cipher.open(&d.recipient)?,
            postal_code: self.cipher.open(&d.postal_code)?,
            created_at: d.created_at,
        })
    }

    pub async fn list_deliveries(&self, user_id: i64) -> AppResult<Vec<DeliveryResponse>> {
        deliveries::Entity::find()
            .filter(deliveries::Column::UserId.eq(user_id))
            .order_by_asc(deliveries::Column::Id)
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|d| self.delivery_response(d))
            .collect()
    }

    pub async fn create_delivery(&self, user_id: i64, req: DeliveryRequest) -> AppResult<DeliveryResponse> {
        let user = self.find_user(user_id).await?;
        if !user.phone_verified {
            return Err(AppError::ValidationError(
                "Verify your phone number before adding a delivery".to_string(),
            ));
        }
        let count = deliveries::Entity::find()
            .filter(deliveries::Column::UserId.eq(user_id))
            .count(&self.pool)
            .await?;
        if count >= MAX_DELIVERIES {
            return Err(AppError::ValidationError(format!(
                "At most {MAX_DELIVERIES} deliveries can be registered"
            )));
        }
        validate_postal_code(&req.postal_code)?;
        validate_address(&req.address, &req.recipient)?;

        let delivery = deliveries::ActiveModel {
            user_id: Set(user_id),
            address: Set(self.cipher.seal(&req.address)?),
            detail_address: Set(self.cipher.seal(&req.detail_address)?),
            recipient: Set(self.cipher.seal(&req.recipient)?),
            postal_code: Set(self.cipher.seal(&req.postal_code)?),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        self.delivery_response(delivery)
    }

    pub async fn update_delivery(
        &self,
        user_id: i64,
        delivery_id: i64,
        req: DeliveryRequest,
    ) -> AppResult<DeliveryResponse> {
        let delivery = self.find_delivery(user_id, delivery_id).await?;
        validate_postal_code(&req.postal_code)?;
        validate_address(&req.address, &req.recipient)?;

        let mut am = delivery.into_active_model();
        am.address = Set(self.cipher.seal(&req.address)?);
        am.detail_address = Set(self.cipher.seal(&req.detail_address)?);
        am.recipient = Set(self.cipher.seal(&req.recipient)?);
        am.postal_code = Set(self.cipher.seal(&req.postal_code)?);
        let delivery = am.update(&self.pool).await?;

        self.delivery_response(delivery)
    }

    pub async fn delete_delivery(&self, user_id: i64, delivery_id: i64) -> AppResult<()> {
        let delivery = self.find_delivery(user_id, delivery_id).await?;
        deliveries::Entity::delete_by_id(delivery.id)
            .exec(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_delivery(&self, user_id: i64, delivery_id: i64) -> AppResult<deliveries::Model> {
        deliveries::Entity::find_by_id(delivery_id)
            .filter(deliveries::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Delivery not found".to_string()))
    }

    // -----------------------------
    // 账户清理
    // -----------------------------

    /// 删除注册 2 天仍未验证的账户，删除停用超过 30 天的账户，停用 30 天未登录的账户
    pub async fn housekeeping(&self, now: DateTime<Utc>) -> AppResult<HousekeepingReport> {
        let unverified_cutoff = now - Duration::days(UNVERIFIED_RETENTION_DAYS);
        let unverified = users::Entity::delete_many()
            .filter(users::Column::IsActive.eq(false))
            .filter(users::Column::LastLogin.is_null())
            .filter(users::Column::AuthCode.is_not_null())
            .filter(users::Column::CreatedAt.lt(unverified_cutoff))
            .exec(&self.pool)
            .await?;
        let expired = self.delete_long_inactive(now).await?;

        let idle_cutoff = now - Duration::days(IDLE_DEACTIVATION_DAYS);
        let deactivated = users::Entity::update_many()
            .col_expr(users::Column::IsActive, Expr::value(false))
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(users::Column::IsActive.eq(true))
            .filter(users::Column::IsAdmin.eq(false))
            .filter(
                Condition::any()
                    .add(users::Column::LastLogin.lt(idle_cutoff))
                    .add(
                        Condition::all()
                            .add(users::Column::LastLogin.is_null())
                            .add(users::Column::CreatedAt.lt(idle_cutoff)),
                    ),
            )
            .exec(&self.pool)
            .await?;

        let report = HousekeepingReport {
            deleted: unverified.rows_affected + expired,
            deactivated: deactivated.rows_affected,
        };
        if report.deleted > 0 || report.deactivated > 0 {
            log::info!(
                "Account housekeeping: deleted={} deactivated={}",
                report.deleted,
                report.deactivated
            );
        }
        Ok(report)
    }

    /// 停用超过 30 天的普通账户连同配送地址和购物车一起删除。
    /// 订单、账单和积分流水作为交易记录保留。
    async fn delete_long_inactive(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let cutoff = now - Duration::days(INACTIVE_RETENTION_DAYS);
        let ids: Vec<i64> = users::Entity::find()
            .filter(users::Column::IsActive.eq(false))
            .filter(users::Column::IsAdmin.eq(false))
            .filter(users::Column::IsSeller.eq(false))
            .filter(users::Column::UpdatedAt.lt(cutoff))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|u| u.id)
            .collect();
        if ids.is_empty() {
            return Ok(0);
        }

        let txn = self.pool.begin().await?;
        deliveries::Entity::delete_many()
            .filter(deliveries::Column::UserId.is_in(ids.clone()))
            .exec(&txn)
            .await?;
        cart_items::Entity::delete_many()
            .filter(cart_items::Column::UserId.is_in(ids.clone()))
            .exec(&txn)
            .await?;
        // 条件重复一遍，期间重新激活的账户不删
        let deleted = users::Entity::delete_many()
            .filter(users::Column::Id.is_in(ids))
            .filter(users::Column::IsActive.eq(false))
            .filter(users::Column::UpdatedAt.lt(cutoff))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        log::info!("Deleted {} accounts inactive for over {INACTIVE_RETENTION_DAYS} days", deleted.rows_affected);
        Ok(deleted.rows_affected)
    }
}
