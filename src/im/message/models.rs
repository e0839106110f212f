//! 消息本地模型定义

use crate::im::serialization::{deserialize_id, deserialize_vec_or_null};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 消息附件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, alias = "fileName", alias = "name")]
    pub filename: String,
    /// 文件地址；降级模式下为本地临时引用（`blob:` 前缀）
    #[serde(default, alias = "fileUrl", alias = "file")]
    pub url: String,
    #[serde(default, alias = "sizeLabel")]
    pub size_label: String,
}

/// 聊天消息（创建后不再修改）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(alias = "senderId", alias = "sender", deserialize_with = "deserialize_id")]
    pub sender_id: String,
    #[serde(
        alias = "conversationId",
        alias = "conversation",
        deserialize_with = "deserialize_id"
    )]
    pub conversation_id: String,
    #[serde(default, deserialize_with = "deserialize_vec_or_null")]
    pub attachments: Vec<Attachment>,
    #[serde(default, alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(default, alias = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// 待发送的附件（本地文件内容）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingAttachment {
    pub filename: String,
    /// MIME 类型，未知时由服务器推断
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
}

impl OutgoingAttachment {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: None,
            data,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_accepts_server_shapes() {
        let json = r#"{
            "id": 17,
            "content": "hi",
            "sender": 3,
            "conversation": "c-1",
            "attachments": [{"id": 1, "filename": "a.pdf", "url": "/media/a.pdf", "size_label": "1.0 KB"}],
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-01T10:00:00Z"
        }"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id, "17");
        assert_eq!(msg.sender_id, "3");
        assert_eq!(msg.conversation_id, "c-1");
        assert_eq!(msg.attachments.len(), 1);
        assert_eq!(msg.attachments[0].filename, "a.pdf");

        let camel = r#"{"id":"m","senderId":"u","conversationId":"c","attachments":null,"createdAt":"2024-05-01T10:00:00Z"}"#;
        let msg: Message = serde_json::from_str(camel).unwrap();
        assert!(msg.attachments.is_empty());
        assert_eq!(msg.content, "");
    }
}
