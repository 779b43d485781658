use crate::entities::{
    chat_room_entity as chat_rooms, room_message_entity as room_messages,
    room_participant_entity as room_participants, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

pub const MAX_ROOMS_PER_AUTHOR: u64 = 3;
const MAX_ROOM_NAME_CHARS: usize = 20;
const MAX_ROOM_DESCRIPTION_CHARS: usize = 100;
pub const MAX_MESSAGE_CHARS: usize = 1000;
/// 聊天记录保留天数
pub const MESSAGE_RETENTION_DAYS: i64 = 7;

/// 进入聊天室的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOutcome {
    /// 本次连接新建了参与记录
    pub is_new: bool,
    pub participants_count: u64,
}

impl JoinOutcome {
    /// 仅当房间的第一位参与者进入时广播 enter
    pub fn announces_enter(&self) -> bool {
        self.is_new && self.participants_count == 1
    }
}

#[derive(Clone)]
pub struct ChatService {
    pool: DatabaseConnection,
}

impl ChatService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn list_rooms(&self) -> AppResult<Vec<RoomResponse>> {
        let rooms = chat_rooms::Entity::find()
            .order_by_desc(chat_rooms::Column::CreatedAt)
            .order_by_desc(chat_rooms::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(rooms.into_iter().map(Into::into).collect())
    }

    pub async fn find_room(&self, room_id: i64) -> AppResult<chat_rooms::Model> {
        chat_rooms::Entity::find_by_id(room_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Chat room not found".to_string()))
    }

    pub async fn create_room(&self, author_id: i64, req: CreateRoomRequest) -> AppResult<RoomResponse> {
        let owned = chat_rooms::Entity::find()
            .filter(chat_rooms::Column::AuthorId.eq(author_id))
            .count(&self.pool)
            .await?;
        if owned >= MAX_ROOMS_PER_AUTHOR {
            return Err(AppError::NotAcceptable(format!(
                "At most {MAX_ROOMS_PER_AUTHOR} rooms per user"
            )));
        }

        let name = req.name.trim();
        if name.is_empty() || name.chars().count() > MAX_ROOM_NAME_CHARS {
            return Err(AppError::ValidationError(format!(
                "Room name must be 1-{MAX_ROOM_NAME_CHARS} characters"
            )));
        }
        if req.description.chars().count() > MAX_ROOM_DESCRIPTION_CHARS {
            return Err(AppError::ValidationError(format!(
                "Description must be at most {MAX_ROOM_DESCRIPTION_CHARS} characters"
            )));
        }

        let now = Utc::now();
        let room = chat_rooms::ActiveModel {
            author_id: Set(author_id),
            name: Set(name.to_string()),
            description: Set(req.description),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        Ok(room.into())
    }

    pub async fn room_detail(&self, room_id: i64) -> AppResult<RoomDetailResponse> {
        let room = self.find_room(room_id).await?;
        let user_ids: Vec<i64> = room_participants::Entity::find()
            .filter(room_participants::Column::RoomId.eq(room_id))
            .order_by_asc(room_participants::Column::Id)
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|p| p.user_id)
            .collect();
        let participants = users::Entity::find()
            .filter(users::Column::Id.is_in(user_ids))
            .order_by_asc(users::Column::Id)
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|u| ParticipantResponse {
                user_id: u.id,
                nickname: u.nickname,
            })
            .collect();

        Ok(RoomDetailResponse {
            room: room.into(),
            participants,
        })
    }

    /// 只有房主可以删除，且房间内没有在线成员
    pub async fn delete_room(&self, user_id: i64, room_id: i64) -> AppResult<()> {
        let room = self.find_room(room_id).await?;
        if room.author_id != user_id {
            return Err(AppError::Forbidden);
        }
        let live = room_participants::Entity::find()
            .filter(room_participants::Column::RoomId.eq(room_id))
            .count(&self.pool)
            .await?;
        if live > 0 {
            return Err(AppError::Forbidden);
        }

        let txn = self.pool.begin().await?;
        room_messages::Entity::delete_many()
            .filter(room_messages::Column::RoomId.eq(room_id))
            .exec(&txn)
            .await?;
        chat_rooms::Entity::delete_by_id(room_id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    /// 聊天记录（时间正序），同时把他人的消息标记为已读
    pub async fn history(&self, user_id: i64, room_id: i64) -> AppResult<Vec<MessageResponse>> {
        self.find_room(room_id).await?;
        room_messages::Entity::update_many()
            .col_expr(room_messages::Column::IsRead, Expr::value(true))
            .filter(room_messages::Column::RoomId.eq(room_id))
            .filter(room_messages::Column::AuthorId.ne(user_id))
            .filter(room_messages::Column::IsRead.eq(false))
            .exec(&self.pool)
            .await?;

        let messages = room_messages::Entity::find()
            .filter(room_messages::Column::RoomId.eq(room_id))
            .order_by_asc(room_messages::Column::CreatedAt)
            .order_by_asc(room_messages::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(messages.into_iter().map(Into::into).collect())
    }

    pub async fn nickname(&self, user_id: i64) -> AppResult<String> {
        users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .map(|u| u.nickname)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    async fn participants_count(&self, room_id: i64) -> AppResult<u64> {
        Ok(room_participants::Entity::find()
            .filter(room_participants::Column::RoomId.eq(room_id))
            .count(&self.pool)
            .await?)
    }

    /// 记录参与者（已存在则复用）
    pub async fn join(&self, room_id: i64, user_id: i64) -> AppResult<JoinOutcome> {
        let existing = room_participants::Entity::find()
            .filter(room_participants::Column::RoomId.eq(room_id))
            .filter(room_participants::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?;
        let is_new = existing.is_none();
        if is_new {
            room_participants::ActiveModel {
                room_id: Set(room_id),
                user_id: Set(user_id),
                ..Default::default()
            }
            .insert(&self.pool)
            .await?;
        }

        Ok(JoinOutcome {
            is_new,
            participants_count: self.participants_count(room_id).await?,
        })
    }

    /// 删除参与记录，返回剩余人数
    pub async fn leave(&self, room_id: i64, user_id: i64) -> AppResult<u64> {
        room_participants::Entity::delete_many()
            .filter(room_participants::Column::RoomId.eq(room_id))
            .filter(room_participants::Column::UserId.eq(user_id))
            .exec(&self.pool)
            .await?;
        self.participants_count(room_id).await
    }

    pub async fn post_message(&self, room_id: i64, user_id: i64, content: &str) -> AppResult<MessageResponse> {
        if content.trim().is_empty() || content.chars().count() > MAX_MESSAGE_CHARS {
            return Err(AppError::ValidationError(format!(
                "Message must be 1-{MAX_MESSAGE_CHARS} characters"
            )));
        }

        let now = Utc::now();
        let message = room_messages::ActiveModel {
            author_id: Set(user_id),
            room_id: Set(room_id),
            content: Set(content.to_string()),
            is_read: Set(false),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        chat_rooms::Entity::update_many()
            .col_expr(chat_rooms::Column::UpdatedAt, Expr::value(now))
            .filter(chat_rooms::Column::Id.eq(room_id))
            .exec(&self.pool)
            .await?;

        Ok(message.into())
    }

    /// 删除 7 天前的聊天记录
    pub async fn purge_old_messages(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let cutoff = now - Duration::days(MESSAGE_RETENTION_DAYS);
        let result = room_messages::Entity::delete_many()
            .filter(room_messages::Column::CreatedAt.lte(cutoff))
            .exec(&self.pool)
            .await?;
        if result.rows_affected > 0 {
            log::info!("Purged {} chat messages older than {cutoff}", result.rows_affected);
        }
        Ok(result.rows_affected)
    }
}
