use crate::chat::events::{ChatEvent, Inbound, alert_group, dispatch_inbound, room_group};
use crate::chat::layer::ChannelLayer;
use crate::error::{AppError, AppResult};
use crate::services::ChatService;
use actix_ws::{CloseReason, Message, MessageStream, Session};
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::broadcast::{Receiver, error::RecvError};

/// 一个已加入房间的 websocket 连接
pub struct ChatConnection {
    room_id: i64,
    user_id: i64,
    nickname: String,
    chat: ChatService,
    layer: Arc<dyn ChannelLayer>,
}

impl ChatConnection {
    /// 加入房间组并登记参与者；房间的第一位参与者会触发 enter 广播
    pub async fn open(
        chat: ChatService,
        layer: Arc<dyn ChannelLayer>,
        room_id: i64,
        user_id: i64,
    ) -> AppResult<(Self, Receiver<ChatEvent>)> {
        chat.find_room(room_id).await?;
        let nickname = chat.nickname(user_id).await?;

        let rx = layer.subscribe(&room_group(room_id)).await?;
        let outcome = chat.join(room_id, user_id).await?;
        if outcome.announces_enter() {
            layer
                .group_send(
                    &room_group(room_id),
                    ChatEvent::Enter {
                        sender: user_id,
                        sender_name: nickname.clone(),
                        participants_count: outcome.participants_count,
                        user_id,
                    },
                )
                .await?;
        }
        log::info!(
            "User {user_id} joined room {room_id} ({} online)",
            outcome.participants_count
        );

        Ok((
            Self {
                room_id,
                user_id,
                nickname,
                chat,
                layer,
            },
            rx,
        ))
    }

    pub async fn handle_text(&self, text: &str) -> AppResult<()> {
        match dispatch_inbound(text, self.room_id, self.user_id) {
            Inbound::Post { content } => {
                match self.chat.post_message(self.room_id, self.user_id, &content).await {
                    Ok(message) => {
                        self.layer
                            .group_send(
                                &room_group(self.room_id),
                                ChatEvent::Message {
                                    id: message.id,
                                    message: message.content,
                                    sender: self.user_id,
                                    sender_name: self.nickname.clone(),
                                    room_id: self.room_id,
                                    time: message.created_at,
                                },
                            )
                            .await?;
                    }
                    Err(AppError::ValidationError(reason)) => {
                        self.layer
                            .group_send(
                                &alert_group(&self.user_id.to_string()),
                                ChatEvent::Alert { message: reason },
                            )
                            .await?;
                    }
                    Err(e) => return Err(e),
                }
            }
            Inbound::Alert { group, reason } => {
                log::warn!("Rejected frame in room {}: {reason}", self.room_id);
                self.layer
                    .group_send(&group, ChatEvent::Alert { message: reason })
                    .await?;
            }
        }
        Ok(())
    }

    /// 删除参与记录并广播 out
    pub async fn close(self) -> AppResult<()> {
        let group = room_group(self.room_id);
        let participants_count = self.chat.leave(self.room_id, self.user_id).await?;
        self.layer
            .group_send(
                &group,
                ChatEvent::Out {
                    participants_count,
                    user_id: self.user_id,
                },
            )
            .await?;
        self.layer.discard(&group).await?;
        log::info!("User {} left room {}", self.user_id, self.room_id);
        Ok(())
    }
}

async fn forward(session: &mut Session, event: &ChatEvent) -> bool {
    match serde_json::to_string(event) {
        Ok(json) => session.text(json).await.is_ok(),
        Err(e) => {
            log::error!("Failed to encode chat event: {e}");
            true
        }
    }
}

/// 处理下一帧或下一个广播事件，直到任一方关闭
async fn pump(
    session: &mut Session,
    stream: &mut MessageStream,
    rx: &mut Receiver<ChatEvent>,
    conn: Option<&ChatConnection>,
) -> Option<CloseReason> {
    loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if let Some(conn) = conn
                        && let Err(e) = conn.handle_text(&text).await
                    {
                        log::error!("Failed to handle chat frame: {e}");
                    }
                }
                Some(Ok(Message::Ping(bytes))) => {
                    if session.pong(&bytes).await.is_err() {
                        return None;
                    }
                }
                Some(Ok(Message::Close(reason))) => return reason,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    log::warn!("Websocket protocol error: {e}");
                    return None;
                }
                None => return None,
            },
            event = rx.recv() => match event {
                Ok(event) => {
                    if !forward(session, &event).await {
                        return None;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Websocket receiver lagged, {skipped} events skipped");
                }
                Err(RecvError::Closed) => return None,
            },
        }
    }
}

/// `/ws/chat/{room_id}/` 连接主循环
pub async fn run_chat_socket(
    mut session: Session,
    mut stream: MessageStream,
    conn: ChatConnection,
    mut rx: Receiver<ChatEvent>,
) {
    let reason = pump(&mut session, &mut stream, &mut rx, Some(&conn)).await;
    drop(rx);
    if let Err(e) = conn.close().await {
        log::error!("Failed to leave chat room: {e}");
    }
    let _ = session.close(reason).await;
}

/// `/ws/notifications/` 连接主循环：只转发 `alert_<user_id>` 组的事件
pub async fn run_notification_socket(
    mut session: Session,
    mut stream: MessageStream,
    layer: Arc<dyn ChannelLayer>,
    user_id: i64,
    mut rx: Receiver<ChatEvent>,
) {
    let reason = pump(&mut session, &mut stream, &mut rx, None).await;
    drop(rx);
    if let Err(e) = layer.discard(&alert_group(&user_id.to_string())).await {
        log::error!("Failed to release notification group: {e}");
    }
    let _ = session.close(reason).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::layer::InMemoryChannelLayer;
    use crate::database::memory_pool;
    use crate::entities::room_message_entity as room_messages;
    use crate::models::CreateRoomRequest;
    use crate::services::test_support::seed_user;
    use sea_orm::{EntityTrait, PaginatorTrait};

    async fn setup() -> (sea_orm::DatabaseConnection, ChatService, Arc<dyn ChannelLayer>, i64, i64, i64) {
        let db = memory_pool().await;
        let a = seed_user(&db, "a@choco.kr").await;
        let b = seed_user(&db, "b@choco.kr").await;
        let chat = ChatService::new(db.clone());
        let room = chat
            .create_room(
                a.id,
                CreateRoomRequest {
                    name: "lobby".to_string(),
                    description: String::new(),
                },
            )
            .await
            .unwrap();
        let layer: Arc<dyn ChannelLayer> = Arc::new(InMemoryChannelLayer::new());
        (db, chat, layer, room.id, a.id, b.id)
    }

    #[tokio::test]
    async fn test_first_joiner_announces_enter_second_does_not() {
        let (_db, chat, layer, room_id, a, b) = setup().await;

        let (_conn_a, mut rx_a) = ChatConnection::open(chat.clone(), layer.clone(), room_id, a)
            .await
            .unwrap();
        match rx_a.try_recv().unwrap() {
            ChatEvent::Enter {
                participants_count,
                user_id,
                ..
            } => {
                assert_eq!(participants_count, 1);
                assert_eq!(user_id, a);
            }
            other => panic!("unexpected event {other:?}"),
        }

        let (conn_b, _rx_b) = ChatConnection::open(chat.clone(), layer.clone(), room_id, b)
            .await
            .unwrap();
        assert!(rx_a.try_recv().is_err());

        conn_b.close().await.unwrap();
        assert_eq!(
            rx_a.try_recv().unwrap(),
            ChatEvent::Out {
                participants_count: 1,
                user_id: b
            }
        );
    }

    #[tokio::test]
    async fn test_message_is_persisted_then_broadcast() {
        let (db, chat, layer, room_id, a, _) = setup().await;
        let (conn, mut rx) = ChatConnection::open(chat, layer, room_id, a).await.unwrap();
        rx.try_recv().unwrap();

        let frame = format!(r#"{{"room_id":"{room_id}","user_id":"{a}","message":"안녕"}}"#);
        conn.handle_text(&frame).await.unwrap();

        match rx.try_recv().unwrap() {
            ChatEvent::Message {
                message, sender, ..
            } => {
                assert_eq!(message, "안녕");
                assert_eq!(sender, a);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(room_messages::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_room_id_alerts_without_persisting() {
        let (db, chat, layer, room_id, a, _) = setup().await;
        let mut alerts = layer.subscribe("alert_").await.unwrap();
        let (conn, mut rx) = ChatConnection::open(chat, layer.clone(), room_id, a).await.unwrap();
        rx.try_recv().unwrap();

        conn.handle_text(r#"{"room_id":"","message":"lost"}"#).await.unwrap();

        assert!(matches!(alerts.try_recv().unwrap(), ChatEvent::Alert { .. }));
        assert!(rx.try_recv().is_err());
        assert_eq!(room_messages::Entity::find().count(&db).await.unwrap(), 0);
    }
}
