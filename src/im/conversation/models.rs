//! 会话本地模型定义

use crate::im::message::models::Message;
use crate::im::serialization::{deserialize_id, deserialize_opt_id, deserialize_vec_or_null};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 会话参与者（内嵌在会话中，不单独维护）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, alias = "username")]
    pub name: String,
    #[serde(default, alias = "avatarUrl", alias = "avatar")]
    pub avatar_url: Option<String>,
}

/// 最新消息摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePreview {
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(
        default,
        alias = "senderId",
        alias = "sender",
        deserialize_with = "deserialize_opt_id"
    )]
    pub sender_id: Option<String>,
    #[serde(default, alias = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for MessagePreview {
    fn from(msg: &Message) -> Self {
        Self {
            id: Some(msg.id.clone()),
            content: msg.content.clone(),
            sender_id: Some(msg.sender_id.clone()),
            created_at: msg.created_at,
        }
    }
}

/// 会话数据结构
/// 可以直接从服务器返回的 JSON 反序列化，缺失的字段使用默认值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// 会话 ID（会话内稳定）
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// 参与者列表（有序）
    #[serde(default, deserialize_with = "deserialize_vec_or_null")]
    pub participants: Vec<Participant>,
    /// 最新消息
    #[serde(default, alias = "lastMessage")]
    pub last_message: Option<MessagePreview>,
    /// 未读消息数
    #[serde(default, alias = "unreadCount")]
    pub unread_count: u32,
    #[serde(default, alias = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, alias = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// 是否包含指定参与者
    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p.id == user_id)
    }

    /// 除自己以外的第一个参与者（单聊的对方）
    pub fn peer(&self, self_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id != self_id)
    }

    /// 用新消息更新摘要和更新时间，不动其他字段
    ///
    /// 服务器消息缺少创建时间（反序列化为纪元时间）时，更新时间取当前时间。
    pub fn apply_last_message(&mut self, msg: &Message) {
        let mut preview = MessagePreview::from(msg);
        if preview.created_at == DateTime::<Utc>::default() {
            preview.created_at = Utc::now();
        }
        self.updated_at = preview.created_at;
        self.last_message = Some(preview);
    }
}
