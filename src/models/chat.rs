use crate::entities::{chat_room_entity, room_message_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateRoomRequest {
    #[schema(example = "초코 수다방")]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoomResponse {
    pub id: i64,
    pub author_id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ParticipantResponse {
    pub user_id: i64,
    pub nickname: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoomDetailResponse {
    pub room: RoomResponse,
    pub participants: Vec<ParticipantResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub id: i64,
    pub author_id: i64,
    pub room_id: i64,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<chat_room_entity::Model> for RoomResponse {
    fn from(m: chat_room_entity::Model) -> Self {
        Self {
            id: m.id,
            author_id: m.author_id,
            name: m.name,
            description: m.description,
            created_at: m.created_at,
        }
    }
}

impl From<room_message_entity::Model> for MessageResponse {
    fn from(m: room_message_entity::Model) -> Self {
        Self {
            id: m.id,
            author_id: m.author_id,
            room_id: m.room_id,
            content: m.content,
            is_read: m.is_read,
            created_at: m.created_at,
        }
    }
}
