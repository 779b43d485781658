use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use uuid::Uuid;

/// 邮箱与短信验证码的有效期（分钟）
pub const CODE_TTL_MINUTES: i64 = 5;

/// 生成6位数字代码（邮箱验证码）
pub fn generate_six_digit_code() -> String {
    let mut rng = rand::thread_rng();
    format!("{:06}", rng.gen_range(100000..=999999))
}

/// 生成4位数字代码（短信验证码）
pub fn generate_four_digit_code() -> String {
    let mut rng = rand::thread_rng();
    format!("{:04}", rng.gen_range(0..=9999))
}

/// 没有签发时间，或签发已超过 `CODE_TTL_MINUTES`
pub fn is_code_expired(issued_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match issued_at {
        Some(issued_at) => now - issued_at > Duration::minutes(CODE_TTL_MINUTES),
        None => true,
    }
}

/// 生成充值订单号，提交给支付网关作为 merchant_uid
pub fn generate_merchant_uid(user_id: i64) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "choco_{}_{}_{}",
        user_id,
        Utc::now().timestamp_millis(),
        &suffix[..8]
    )
}
