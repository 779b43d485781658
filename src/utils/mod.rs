pub mod code_generator;
pub mod crypto;
pub mod jwt;
pub mod password;
pub mod validation;

pub use code_generator::{
    CODE_TTL_MINUTES, generate_four_digit_code, generate_merchant_uid, generate_six_digit_code,
    is_code_expired,
};
pub use crypto::{Ciphertext, FieldCipher};
pub use jwt::*;
pub use password::*;
pub use validation::*;
