pub mod iamport;

pub use iamport::*;
