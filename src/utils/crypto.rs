//! 敏感字段加解密（AES-256-GCM）
//!
//! 存储格式：base64(nonce(12 字节) || ciphertext)

use crate::error::{AppError, AppResult};
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sea_orm::DeriveValueType;

const NONCE_LEN: usize = 12;

/// 数据库中的密文列。只能通过 [`FieldCipher`] 构造或读取明文。
#[derive(Clone, Debug, PartialEq, Eq, DeriveValueType)]
pub struct Ciphertext(pub String);

#[derive(Clone)]
pub struct FieldCipher {
    cipher: Aes256Gcm,
}

impl FieldCipher {
    pub fn new(key: &str) -> AppResult<Self> {
        let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|_| AppError::ConfigError("AES key must be exactly 32 bytes".to_string()))?;
        Ok(Self { cipher })
    }

    pub fn seal(&self, plaintext: &str) -> AppResult<Ciphertext> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| AppError::CryptoError(format!("encrypt failed: {e}")))?;

        let mut raw = Vec::with_capacity(NONCE_LEN + sealed.len());
        raw.extend_from_slice(nonce.as_slice());
        raw.extend_from_slice(&sealed);
        Ok(Ciphertext(STANDARD.encode(raw)))
    }

    pub fn open(&self, value: &Ciphertext) -> AppResult<String> {
        let raw = STANDARD
            .decode(value.0.as_bytes())
            .map_err(|e| AppError::CryptoError(format!("invalid base64: {e}")))?;
        if raw.len() < NONCE_LEN {
            return Err(AppError::CryptoError("ciphertext too short".to_string()));
        }

        let (nonce, sealed) = raw.split_at(NONCE_LEN);
        let plain = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|e| AppError::CryptoError(format!("decrypt failed: {e}")))?;
        String::from_utf8(plain).map_err(|e| AppError::CryptoError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_seal_then_open_returns_same_bytes() {
        let cipher = FieldCipher::new(KEY).unwrap();
        for plain in ["서울시 강남구 테헤란로 1", "", "12345", "국민은행"] {
            let sealed = cipher.seal(plain).unwrap();
            assert_ne!(sealed.0, plain);
            assert_eq!(cipher.open(&sealed).unwrap(), plain);
        }
    }

    #[test]
    fn test_nonce_differs_per_seal() {
        let cipher = FieldCipher::new(KEY).unwrap();
        let a = cipher.seal("same").unwrap();
        let b = cipher.seal("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_key_or_tampered_value_fails() {
        let cipher = FieldCipher::new(KEY).unwrap();
        let other = FieldCipher::new("abcdef0123456789abcdef0123456789").unwrap();
        let sealed = cipher.seal("secret").unwrap();
        assert!(other.open(&sealed).is_err());
        assert!(cipher.open(&Ciphertext("bm9wZQ==".to_string())).is_err());
    }

    #[test]
    fn test_key_length_is_checked() {
        assert!(FieldCipher::new("short").is_err());
    }
}
