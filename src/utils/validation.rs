use crate::error::{AppError, AppResult};
use regex::Regex;

/// 邮箱格式校验
pub fn validate_email(email: &str) -> AppResult<()> {
    let email_regex = Regex::new(r"^[\w.-]+@[\w.-]+\.\w+$")
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    if !email_regex.is_match(email) {
        return Err(AppError::ValidationError("Invalid email".to_string()));
    }

    Ok(())
}

/// 昵称：2~19 个字符，不含空白
pub fn validate_nickname(nickname: &str) -> AppResult<()> {
    let len = nickname.chars().count();
    if !(2..20).contains(&len) || nickname.chars().any(char::is_whitespace) {
        return Err(AppError::ValidationError("Invalid nickname".to_string()));
    }
    Ok(())
}

/// 韩国手机号：11 位数字，不带连字符
pub fn validate_phone_number(phone: &str) -> AppResult<()> {
    let phone_regex =
        Regex::new(r"^[0-9]{11}$").map_err(|e| AppError::InternalError(e.to_string()))?;

    if !phone_regex.is_match(phone) {
        return Err(AppError::ValidationError(
            "Phone number must be 11 digits".to_string(),
        ));
    }
    Ok(())
}

/// 邮编：5 位数字
pub fn validate_postal_code(postal_code: &str) -> AppResult<()> {
    if postal_code.len() != 5 || !postal_code.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::ValidationError("Invalid postal code".to_string()));
    }
    Ok(())
}

/// 收货地址与收件人不能为空白（详细地址可为空）
pub fn validate_address(address: &str, recipient: &str) -> AppResult<()> {
    if address.trim().is_empty() || recipient.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Address and recipient are required".to_string(),
        ));
    }
    Ok(())
}

/// 商品评分 1~5
pub fn validate_star(star: i32) -> AppResult<()> {
    if !(1..=5).contains(&star) {
        return Err(AppError::ValidationError(
            "Star must be between 1 and 5".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("choco@example.com").is_ok());
        assert!(validate_email("first.last-1@mail.co.kr").is_ok());
        assert!(validate_email("choco@example").is_err());
        assert!(validate_email("choco example@a.com").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_validate_nickname() {
        assert!(validate_nickname("초코").is_ok());
        assert!(validate_nickname("a").is_err());
        assert!(validate_nickname("has space").is_err());
        assert!(validate_nickname(&"n".repeat(19)).is_ok());
        assert!(validate_nickname(&"n".repeat(20)).is_err());
    }

    #[test]
    fn test_validate_phone_number() {
        assert!(validate_phone_number("01012345678").is_ok());
        assert!(validate_phone_number("0101234567").is_err());
        assert!(validate_phone_number("010-1234-5678").is_err());
        assert!(validate_phone_number("010 12345678").is_err());
        assert!(validate_phone_number("0101234567a").is_err());
    }

    #[test]
    fn test_validate_postal_code_and_address() {
        assert!(validate_postal_code("06236").is_ok());
        assert!(validate_postal_code("0623").is_err());
        assert!(validate_postal_code("0623a").is_err());
        assert!(validate_address("서울", "홍길동").is_ok());
        assert!(validate_address("   ", "홍길동").is_err());
        assert!(validate_address("서울", "").is_err());
    }

    #[test]
    fn test_validate_star() {
        assert!(validate_star(1).is_ok());
        assert!(validate_star(5).is_ok());
        assert!(validate_star(0).is_err());
        assert!(validate_star(6).is_err());
    }
}
