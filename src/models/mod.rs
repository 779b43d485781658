pub mod admin;
pub mod bill;
pub mod cart;
pub mod chat;
pub mod common;
pub mod delivery;
pub mod order;
pub mod pagination;
pub mod payment;
pub mod point;
pub mod product;
pub mod review;
pub mod seller;
pub mod subscription;
pub mod user;

pub use admin::*;
pub use bill::*;
pub use cart::*;
pub use chat::*;
pub use common::*;
pub use delivery::*;
pub use order::*;
pub use pagination::*;
pub use payment::*;
pub use point::*;
pub use product::*;
pub use review::*;
pub use seller::*;
pub use subscription::*;
pub use user::*;
