pub mod bills;
pub mod cart_items;
pub mod categories;
pub mod chat_rooms;
pub mod deliveries;
pub mod order_items;
pub mod payments;
pub mod points;
pub mod products;
pub mod reviews;
pub mod room_messages;
pub mod room_participants;
pub mod sellers;
pub mod subscriptions;
pub mod users;

pub use bills as bill_entity;
pub use cart_items as cart_item_entity;
pub use categories as category_entity;
pub use chat_rooms as chat_room_entity;
pub use deliveries as delivery_entity;
pub use order_items as order_item_entity;
pub use payments as payment_entity;
pub use points as point_entity;
pub use products as product_entity;
pub use reviews as review_entity;
pub use room_messages as room_message_entity;
pub use room_participants as room_participant_entity;
pub use sellers as seller_entity;
pub use subscriptions as subscription_entity;
pub use users as user_entity;

pub use order_items::{OrderActor, OrderStatus};
pub use points::PointType;
pub use products::ItemState;
pub use users::VerificationPurpose;
