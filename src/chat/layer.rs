use crate::chat::events::ChatEvent;
use crate::error::AppResult;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{Mutex, broadcast};

const GROUP_CHANNEL_CAPACITY: usize = 100;

/// 按组名分发聊天事件
#[async_trait]
pub trait ChannelLayer: Send + Sync {
    /// 订阅一个组；丢弃 Receiver 即退出该组
    async fn subscribe(&self, group: &str) -> AppResult<broadcast::Receiver<ChatEvent>>;

    /// 向组内所有订阅者发送，返回收到的订阅者数量
    async fn group_send(&self, group: &str, event: ChatEvent) -> AppResult<usize>;

    /// 组内已无订阅者时释放它
    async fn discard(&self, group: &str) -> AppResult<()>;
}

#[derive(Default)]
pub struct InMemoryChannelLayer {
    groups: Mutex<HashMap<String, broadcast::Sender<ChatEvent>>>,
}

impl InMemoryChannelLayer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChannelLayer for InMemoryChannelLayer {
    async fn subscribe(&self, group: &str) -> AppResult<broadcast::Receiver<ChatEvent>> {
        let mut groups = self.groups.lock().await;
        let sender = groups
            .entry(group.to_string())
            .or_insert_with(|| broadcast::channel(GROUP_CHANNEL_CAPACITY).0);
        Ok(sender.subscribe())
    }

    async fn group_send(&self, group: &str, event: ChatEvent) -> AppResult<usize> {
        let groups = self.groups.lock().await;
        match groups.get(group) {
            // send 只在没有接收者时失败
            Some(sender) => Ok(sender.send(event).unwrap_or(0)),
            None => {
                log::debug!("No subscribers in group {group}");
                Ok(0)
            }
        }
    }

    async fn discard(&self, group: &str) -> AppResult<()> {
        let mut groups = self.groups.lock().await;
        if groups.get(group).is_some_and(|s| s.receiver_count() == 0) {
            groups.remove(group);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fan_out_to_group_members_only() {
        let layer = InMemoryChannelLayer::new();
        let mut a = layer.subscribe("chat_1").await.unwrap();
        let mut b = layer.subscribe("chat_1").await.unwrap();
        let mut other = layer.subscribe("chat_2").await.unwrap();

        let event = ChatEvent::Out {
            participants_count: 1,
            user_id: 3,
        };
        assert_eq!(layer.group_send("chat_1", event.clone()).await.unwrap(), 2);
        assert_eq!(a.recv().await.unwrap(), event);
        assert_eq!(b.recv().await.unwrap(), event);
        assert!(other.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_discard_keeps_live_groups() {
        let layer = InMemoryChannelLayer::new();
        let rx = layer.subscribe("chat_1").await.unwrap();
        layer.discard("chat_1").await.unwrap();
        assert_eq!(layer.groups.lock().await.len(), 1);

        drop(rx);
        layer.discard("chat_1").await.unwrap();
        assert!(layer.groups.lock().await.is_empty());

        let alert = ChatEvent::Alert {
            message: "nobody".to_string(),
        };
        assert_eq!(layer.group_send("alert_", alert).await.unwrap(), 0);
    }
}
