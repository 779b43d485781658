pub mod consumer;
pub mod events;
pub mod layer;

pub use consumer::*;
pub use events::*;
pub use layer::*;
