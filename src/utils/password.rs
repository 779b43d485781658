use crate::error::{AppError, AppResult};
use bcrypt::{DEFAULT_COST, hash, verify};

const SPECIALS: &[char] = &['!', '@', '#', '$', '%', '^', '&', '*', '_'];

/// 验证密码强度
/// - 6~20 个字符，不含空白
/// - 只允许字母、数字与 `!@#$%^&*_`
/// - 至少包含一个字母、一个数字、一个特殊字符
pub fn validate_password(password: &str) -> AppResult<()> {
    let len = password.chars().count();
    if !(6..=20).contains(&len) {
        return Err(AppError::ValidationError(
            "Password must be 6-20 characters".to_string(),
        ));
    }

    if !password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || SPECIALS.contains(&c))
    {
        return Err(AppError::ValidationError(
            "Password may only contain letters, digits and !@#$%^&*_".to_string(),
        ));
    }

    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| SPECIALS.contains(&c));

    if !has_letter || !has_digit || !has_special {
        return Err(AppError::ValidationError(
            "Password needs a letter, a digit and a special character".to_string(),
        ));
    }

    Ok(())
}

/// 对密码进行哈希
pub fn hash_password(password: &str) -> AppResult<String> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::InternalError(format!("password hashing failed: {e}")))
}

/// 验证密码
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    verify(password, hash)
        .map_err(|e| AppError::InternalError(format!("password verification failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password() {
        assert!(validate_password("choco12!").is_ok());
        assert!(validate_password("choco12").is_err()); // 缺少特殊字符
        assert!(validate_password("choco!!").is_err()); // 缺少数字
        assert!(validate_password("1234!!").is_err()); // 缺少字母
        assert!(validate_password("a1!").is_err()); // 太短
        assert!(validate_password("abcdefghij1234567890!").is_err()); // 太长
        assert!(validate_password("choco 12!").is_err()); // 含空格
        assert!(validate_password("choco12?").is_err()); // 非法字符
    }

    #[test]
    fn test_hash_and_verify_password() {
        let password = "choco12!";
        let hashed = hash_password(password).unwrap();

        assert!(verify_password(password, &hashed).unwrap());
        assert!(!verify_password("wrong12!", &hashed).unwrap());
    }
}
