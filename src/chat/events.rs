//! 聊天 websocket 上的 JSON 事件，以 `response_type` 区分

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "response_type", rename_all = "snake_case")]
pub enum ChatEvent {
    Enter {
        sender: i64,
        sender_name: String,
        participants_count: u64,
        user_id: i64,
    },
    Out {
        participants_count: u64,
        user_id: i64,
    },
    Message {
        id: i64,
        message: String,
        sender: i64,
        sender_name: String,
        room_id: i64,
        time: DateTime<Utc>,
    },
    Alert {
        message: String,
    },
}

pub fn room_group(room_id: i64) -> String {
    format!("chat_{room_id}")
}

/// 个人通知组；发送者未知时为 `alert_`
pub fn alert_group(user_id: &str) -> String {
    format!("alert_{user_id}")
}

/// 客户端发来的消息帧，id 可能是数字、字符串或缺失
#[derive(Debug, Default, Deserialize)]
pub struct InboundFrame {
    #[serde(default)]
    pub room_id: Value,
    #[serde(default)]
    pub user_id: Value,
    #[serde(default)]
    pub message: String,
}

/// 解析后的处理决定
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Post { content: String },
    Alert { group: String, reason: String },
}

fn id_text(value: &Value) -> String {
    match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => String::new(),
    }
}

fn parse_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// 判断一帧消息是入库广播还是转给发送者的告警
///
/// 房间或用户 id 缺失、为空或与当前连接不一致时不入库。
pub fn dispatch_inbound(text: &str, room_id: i64, user_id: i64) -> Inbound {
    let frame: InboundFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(_) => {
            return Inbound::Alert {
                group: alert_group(&user_id.to_string()),
                reason: "Malformed message frame".to_string(),
            };
        }
    };

    let sender = id_text(&frame.user_id);
    let alert = |reason: &str| Inbound::Alert {
        group: alert_group(&sender),
        reason: reason.to_string(),
    };

    match (parse_id(&frame.room_id), parse_id(&frame.user_id)) {
        (None, _) => alert("Missing room id"),
        (_, None) => alert("Missing user id"),
        (Some(r), Some(u)) if r != room_id || u != user_id => alert("Message is not addressed to this room"),
        _ if frame.message.trim().is_empty() => alert("Empty message"),
        _ => Inbound::Post {
            content: frame.message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tags() {
        let out = serde_json::to_value(ChatEvent::Out {
            participants_count: 2,
            user_id: 7,
        })
        .unwrap();
        assert_eq!(out["response_type"], "out");
        assert_eq!(out["participants_count"], 2);

        let alert = serde_json::to_value(ChatEvent::Alert {
            message: "x".to_string(),
        })
        .unwrap();
        assert_eq!(alert["response_type"], "alert");
    }

    #[test]
    fn test_empty_room_id_goes_to_sender_alert() {
        let decision = dispatch_inbound(r#"{"room_id":"","user_id":"7","message":"hi"}"#, 1, 7);
        assert!(matches!(decision, Inbound::Alert { ref group, .. } if group == "alert_7"));

        let decision = dispatch_inbound(r#"{"room_id":"1","message":"hi"}"#, 1, 7);
        assert!(matches!(decision, Inbound::Alert { ref group, .. } if group == "alert_"));
    }

    #[test]
    fn test_valid_frame_posts() {
        let decision = dispatch_inbound(r#"{"room_id":1,"user_id":"7","message":"안녕"}"#, 1, 7);
        assert_eq!(
            decision,
            Inbound::Post {
                content: "안녕".to_string()
            }
        );
    }

    #[test]
    fn test_mismatched_or_garbage_frames_alert() {
        assert!(matches!(
            dispatch_inbound(r#"{"room_id":2,"user_id":7,"message":"hi"}"#, 1, 7),
            Inbound::Alert { .. }
        ));
        assert!(matches!(
            dispatch_inbound(r#"{"room_id":1,"user_id":8,"message":"hi"}"#, 1, 7),
            Inbound::Alert { ref group, .. } if group == "alert_8"
        ));
        assert!(matches!(
            dispatch_inbound("not json", 1, 7),
            Inbound::Alert { ref group, .. } if group == "alert_7"
        ));
    }
}
