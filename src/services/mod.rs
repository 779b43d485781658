pub mod auth_service;
pub mod bill_service;
pub mod cart_service;
pub mod chat_service;
pub mod order_service;
pub mod payment_service;
pub mod point_service;
pub mod product_service;
pub mod review_service;
pub mod subscription_service;
pub mod sweep_service;
pub mod user_service;

#[cfg(test)]
pub mod test_support;

pub use auth_service::*;
pub use bill_service::*;
pub use cart_service::*;
pub use chat_service::*;
pub use order_service::*;
pub use payment_service::*;
pub use point_service::*;
pub use product_service::*;
pub use review_service::*;
pub use subscription_service::*;
pub use sweep_service::*;
pub use user_service::*;
