use crate::entities::{VerificationPurpose, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::*;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};

/// 连续登录失败达到该次数后锁定账户
pub const MAX_LOGIN_ATTEMPTS: i32 = 5;

#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    jwt_service: JwtService,
}

impl AuthService {
    pub fn new(pool: DatabaseConnection, jwt_service: JwtService) -> Self {
        Self { pool, jwt_service }
    }

    /// 注册：创建未激活用户并生成邮箱验证码
    pub async fn signup(&self, request: SignupRequest) -> AppResult<UserResponse> {
        let email = request.email.trim().to_string();
        validate_email(&email)?;
        validate_nickname(&request.nickname)?;
        validate_password(&request.password)?;

        let existing = users::Entity::find()
            .filter(users::Column::Email.eq(email.as_str()))
            .one(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(&request.password)?;
        let code = generate_six_digit_code();
        let now = Utc::now();

        let user = users::ActiveModel {
            email: Set(email.clone()),
            nickname: Set(request.nickname),
            password_hash: Set(password_hash),
            auth_code: Set(Some(code.clone())),
            auth_code_purpose: Set(Some(VerificationPurpose::Activate)),
            auth_code_issued_at: Set(Some(now)),
            login_attempts_count: Set(0),
            is_active: Set(false),
            is_seller: Set(false),
            is_admin: Set(false),
            phone_verified: Set(false),
            last_login: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        // 邮件发送不在本服务范围内，验证码写入日志
        log::info!("Verification code issued for {email}: {code}");
        Ok(user.into())
    }

    /// 重新签发邮箱验证码：未激活账户用于激活，被锁定账户用于解锁
    pub async fn resend_code(&self, email: &str, now: DateTime<Utc>) -> AppResult<()> {
        let user = self.find_by_email(email).await?;
        let purpose = if !user.is_active {
            VerificationPurpose::Activate
        } else if user.login_attempts_count >= MAX_LOGIN_ATTEMPTS {
            VerificationPurpose::Unlock
        } else {
            return Err(AppError::Conflict("Account already verified".to_string()));
        };

        let code = generate_six_digit_code();
        let mut am = user.into_active_model();
        am.auth_code = Set(Some(code.clone()));
        am.auth_code_purpose = Set(Some(purpose));
        am.auth_code_issued_at = Set(Some(now));
        am.updated_at = Set(now);
        am.update(&self.pool).await?;

        log::info!("Verification code ({purpose:?}) issued for {email}: {code}");
        Ok(())
    }

    /// 校验邮箱验证码：激活账户并清零登录失败次数。过期的验证码会被清除。
    pub async fn verify_email(
        &self,
        request: VerifyEmailRequest,
        now: DateTime<Utc>,
    ) -> AppResult<UserResponse> {
        let user = self.find_by_email(&request.email).await?;

        let Some(code) = user.auth_code.clone() else {
            return Err(AppError::ValidationError(
                "Request a verification code first".to_string(),
            ));
        };
        if is_code_expired(user.auth_code_issued_at, now) {
            let mut am = user.into_active_model();
            am.auth_code = Set(None);
            am.auth_code_purpose = Set(None);
            am.auth_code_issued_at = Set(None);
            am.update(&self.pool).await?;
            return Err(AppError::ValidationError(
                "Verification code expired".to_string(),
            ));
        }
        if code != request.code.trim() {
            return Err(AppError::ValidationError("Invalid verification code".to_string()));
        }

        let purpose = user.auth_code_purpose;
        let mut am = user.into_active_model();
        am.is_active = Set(true);
        am.auth_code = Set(None);
        am.auth_code_purpose = Set(None);
        am.auth_code_issued_at = Set(None);
        am.login_attempts_count = Set(0);
        am.updated_at = Set(now);
        let user = am.update(&self.pool).await?;

        log::info!("User {} verified ({purpose:?})", user.id);
        Ok(user.into())
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(request.email.trim()))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid email or password".to_string()))?;

        if user.login_attempts_count >= MAX_LOGIN_ATTEMPTS {
            return Err(AppError::AuthError("account locked".to_string()));
        }
        if !user.is_active {
            return Err(AppError::AuthError("Account is not active".to_string()));
        }

        if !verify_password(&request.password, &user.password_hash)? {
            users::Entity::update_many()
                .col_expr(
                    users::Column::LoginAttemptsCount,
                    Expr::col(users::Column::LoginAttemptsCount).add(1),
                )
                .filter(users::Column::Id.eq(user.id))
                .exec(&self.pool)
                .await?;
            log::warn!(
                "Failed login for user {} ({} previous failures)",
                user.id,
                user.login_attempts_count
            );
            return Err(AppError::AuthError("Invalid email or password".to_string()));
        }

        let now = Utc::now();
        let mut am = user.into_active_model();
        am.login_attempts_count = Set(0);
        am.last_login = Set(Some(now));
        am.updated_at = Set(now);
        let user = am.update(&self.pool).await?;

        self.issue_tokens(user)
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let claims = self.jwt_service.verify_refresh_token(refresh_token)?;
        let user_id = claims.user_id()?;

        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("User no longer exists".to_string()))?;
        if !user.is_active {
            return Err(AppError::AuthError("Account is not active".to_string()));
        }

        self.issue_tokens(user)
    }

    fn issue_tokens(&self, user: users::Model) -> AppResult<AuthResponse> {
        let access_token = self.jwt_service.generate_access_token(user.id, &user.email)?;
        let refresh_token = self.jwt_service.generate_refresh_token(user.id, &user.email)?;

        Ok(AuthResponse {
            user: user.into(),
            access_token,
            refresh_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }

    async fn find_by_email(&self, email: &str) -> AppResult<users::Model> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email.trim()))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory_pool;
    use crate::services::test_support::{TEST_PASSWORD, seed_user};

    fn service(db: &DatabaseConnection) -> AuthService {
        AuthService::new(db.clone(), JwtService::new("test-secret", 60, 120))
    }

    fn login_req(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn verify_req(email: &str, code: &str) -> VerifyEmailRequest {
        VerifyEmailRequest {
            email: email.to_string(),
            code: code.to_string(),
        }
    }

    async fn stored(db: &DatabaseConnection, id: i64) -> users::Model {
        users::Entity::find_by_id(id).one(db).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_signup_verify_login() {
        let db = memory_pool().await;
        let auth = service(&db);

        let user = auth
            .signup(SignupRequest {
                email: "new@choco.kr".to_string(),
                nickname: "초코".to_string(),
                password: TEST_PASSWORD.to_string(),
            })
            .await
            .unwrap();
        assert!(!user.is_active);

        let err = auth.login(login_req("new@choco.kr", TEST_PASSWORD)).await.unwrap_err();
        assert!(matches!(err, AppError::AuthError(_)));

        let pending = stored(&db, user.id).await;
        assert_eq!(pending.auth_code_purpose, Some(VerificationPurpose::Activate));
        let code = pending.auth_code.unwrap();
        assert!(
            auth.verify_email(verify_req("new@choco.kr", "000000x"), Utc::now())
                .await
                .is_err()
        );
        let verified = auth
            .verify_email(verify_req("new@choco.kr", &code), Utc::now())
            .await
            .unwrap();
        assert!(verified.is_active);

        let tokens = auth.login(login_req("new@choco.kr", TEST_PASSWORD)).await.unwrap();
        assert!(tokens.user.last_login.is_some());
        let refreshed = auth.refresh_token(&tokens.refresh_token).await.unwrap();
        assert_eq!(refreshed.user.id, user.id);
        assert!(auth.refresh_token(&tokens.access_token).await.is_err());
    }

    #[tokio::test]
    async fn test_signup_rejects_duplicates_and_bad_input() {
        let db = memory_pool().await;
        let auth = service(&db);
        seed_user(&db, "taken@choco.kr").await;

        let dup = auth
            .signup(SignupRequest {
                email: "taken@choco.kr".to_string(),
                nickname: "dup".to_string(),
                password: TEST_PASSWORD.to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(dup, AppError::Conflict(_)));

        let weak = auth
            .signup(SignupRequest {
                email: "weak@choco.kr".to_string(),
                nickname: "weak".to_string(),
                password: "password".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(weak, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_lockout_after_five_failures() {
        let db = memory_pool().await;
        let auth = service(&db);
        let user = seed_user(&db, "lock@choco.kr").await;

        for _ in 0..MAX_LOGIN_ATTEMPTS {
            assert!(auth.login(login_req("lock@choco.kr", "wrong12!")).await.is_err());
        }
        let err = auth
            .login(login_req("lock@choco.kr", TEST_PASSWORD))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AuthError(msg) if msg == "account locked"));

        assert_eq!(stored(&db, user.id).await.login_attempts_count, MAX_LOGIN_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_locked_account_is_unlocked_by_email_code() {
        let db = memory_pool().await;
        let auth = service(&db);
        let user = seed_user(&db, "unlock@choco.kr").await;
        let now = Utc::now();

        // 未锁定的已激活账户不能重发
        assert!(matches!(
            auth.resend_code("unlock@choco.kr", now).await.unwrap_err(),
            AppError::Conflict(_)
        ));

        for _ in 0..MAX_LOGIN_ATTEMPTS {
            assert!(auth.login(login_req("unlock@choco.kr", "wrong12!")).await.is_err());
        }
        auth.resend_code("unlock@choco.kr", now).await.unwrap();
        let locked = stored(&db, user.id).await;
        assert_eq!(locked.auth_code_purpose, Some(VerificationPurpose::Unlock));

        auth.verify_email(verify_req("unlock@choco.kr", &locked.auth_code.unwrap()), now)
            .await
            .unwrap();
        let unlocked = stored(&db, user.id).await;
        assert_eq!(unlocked.login_attempts_count, 0);
        assert!(unlocked.auth_code.is_none());

        auth.login(login_req("unlock@choco.kr", TEST_PASSWORD)).await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_code_is_rejected_and_cleared() {
        let db = memory_pool().await;
        let auth = service(&db);
        let user = auth
            .signup(SignupRequest {
                email: "late@choco.kr".to_string(),
                nickname: "late".to_string(),
                password: TEST_PASSWORD.to_string(),
            })
            .await
            .unwrap();
        let pending = stored(&db, user.id).await;
        let code = pending.auth_code.clone().unwrap();
        let issued_at = pending.auth_code_issued_at.unwrap();

        let late = issued_at + chrono::Duration::minutes(CODE_TTL_MINUTES + 1);
        let err = auth
            .verify_email(verify_req("late@choco.kr", &code), late)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg.contains("expired")));

        let cleared = stored(&db, user.id).await;
        assert!(cleared.auth_code.is_none());
        assert!(!cleared.is_active);

        // 过期后原验证码不可再用，重发后可以激活
        assert!(auth.verify_email(verify_req("late@choco.kr", &code), issued_at).await.is_err());
        auth.resend_code("late@choco.kr", late).await.unwrap();
        let fresh = stored(&db, user.id).await.auth_code.unwrap();
        let verified = auth
            .verify_email(verify_req("late@choco.kr", &fresh), late)
            .await
            .unwrap();
        assert!(verified.is_active);
    }

    #[tokio::test]
    async fn test_successful_login_resets_counter() {
        let db = memory_pool().await;
        let auth = service(&db);
        let user = seed_user(&db, "reset@choco.kr").await;

        for _ in 0..3 {
            assert!(auth.login(login_req("reset@choco.kr", "wrong12!")).await.is_err());
        }
        auth.login(login_req("reset@choco.kr", TEST_PASSWORD)).await.unwrap();

        assert_eq!(stored(&db, user.id).await.login_attempts_count, 0);
    }
}
