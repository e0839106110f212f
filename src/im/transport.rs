//! 传输层抽象
//!
//! 同步引擎只通过 [`ChatApi`] 访问远端服务，HTTP 实现为 [`HttpChatApi`]，
//! 测试中替换为内存实现。

use crate::im::conversation::api::ConversationApi;
use crate::im::conversation::models::Conversation;
use crate::im::message::api::MessageApi;
use crate::im::message::models::{Message, OutgoingAttachment};
use crate::im::user::api::UserApi;
use crate::im::user::models::User;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

/// 聊天服务接口（对应服务端的 REST 路由）
///
/// 失败时返回的 `anyhow::Error` 应包含 [`crate::im::error::ChatError`]，
/// 以便区分 404（接口未实现）和其他错误。
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// `GET /chat/conversations`
    async fn list_conversations(&self) -> Result<Vec<Conversation>>;

    /// `GET /chat/conversations/{id}/messages`
    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>>;

    /// `POST /chat/conversations`
    async fn get_or_create_conversation(&self, participant_id: &str) -> Result<Conversation>;

    /// `POST /chat/conversations/{id}/messages`
    async fn send_message(
        &self,
        conversation_id: &str,
        content: &str,
        attachments: &[OutgoingAttachment],
    ) -> Result<Message>;

    /// `POST /chat/conversations/{id}/read`
    async fn mark_as_read(&self, conversation_id: &str) -> Result<()>;

    /// `GET /users/user-list`
    async fn list_users(&self) -> Result<Vec<User>>;
}

/// 基于 reqwest 的聊天服务实现
#[derive(Clone)]
pub struct HttpChatApi {
    conversations: ConversationApi,
    messages: MessageApi,
    users: UserApi,
}

impl HttpChatApi {
    /// 使用已配置好的 HTTP 客户端创建
    pub fn new(client: reqwest::Client, api_base_url: impl Into<String>) -> Self {
        let api_base_url = api_base_url.into().trim_end_matches('/').to_string();
        Self {
            conversations: ConversationApi::new(client.clone(), api_base_url.clone()),
            messages: MessageApi::new(client.clone(), api_base_url.clone()),
            users: UserApi::new(client, api_base_url),
        }
    }

    /// 创建带认证头和超时的 HTTP 客户端，再构建 API
    pub fn connect(
        api_base_url: impl Into<String>,
        token: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = build_http_client(token, timeout)?;
        Ok(Self::new(client, api_base_url))
    }
}

/// 创建带认证头的 HTTP 客户端（token 通过 default_headers 自动添加）
pub fn build_http_client(token: &str, timeout: Duration) -> Result<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();
    if !token.is_empty() {
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token))
                .context("无效的 token")?,
        );
    }

    reqwest::ClientBuilder::new()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .context("创建 HTTP 客户端失败")
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        self.conversations.get_conversations().await
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        self.messages.get_messages(conversation_id).await
    }

    async fn get_or_create_conversation(&self, participant_id: &str) -> Result<Conversation> {
        self.conversations
            .get_or_create_conversation(participant_id)
            .await
    }

    async fn send_message(
        &self,
        conversation_id: &str,
        content: &str,
        attachments: &[OutgoingAttachment],
    ) -> Result<Message> {
        self.messages
            .send_message(conversation_id, content, attachments)
            .await
    }

    async fn mark_as_read(&self, conversation_id: &str) -> Result<()> {
        self.conversations.mark_as_read(conversation_id).await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        self.users.get_user_list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_token_with_control_characters() {
        assert!(build_http_client("bad\ntoken", Duration::from_secs(5)).is_err());
        assert!(build_http_client("", Duration::from_secs(5)).is_ok());
        let api = HttpChatApi::connect(
            "http://localhost:8000/api/",
            "t0k3n",
            Duration::from_secs(5),
        );
        assert!(api.is_ok());
    }
}
