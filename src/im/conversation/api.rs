//! 会话 HTTP API 客户端
//!
//! 负责所有会话相关的 HTTP 请求

use crate::im::conversation::models::Conversation;
use crate::im::error::ChatError;
use crate::im::types::{ensure_success, handle_http_response};
use anyhow::Result;
use tracing::{debug, info};
use uuid::Uuid;

/// 会话相关的 HTTP API 客户端
#[derive(Clone)]
pub struct ConversationApi {
    client: reqwest::Client,
    api_base_url: String,
}

impl ConversationApi {
    /// 创建新的会话 API 客户端
    ///
    /// `client` 应该已经在外部配置好认证头
    pub fn new(client: reqwest::Client, api_base_url: String) -> Self {
        Self {
            client,
            api_base_url,
        }
    }

    /// 获取全部会话
    pub async fn get_conversations(&self) -> Result<Vec<Conversation>> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/chat/conversations", self.api_base_url);

        info!("[ConvAPI] 📡 请求会话列表");
        debug!("[ConvAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .get(&url)
            .header("operationID", &operation_id)
            .send()
            .await
            .map_err(ChatError::from)?;

        let conversations =
            handle_http_response::<Vec<Conversation>>(response, "会话列表").await?;
        debug!("[ConvAPI] 会话列表返回 {} 条", conversations.len());
        Ok(conversations)
    }

    /// 查找或创建与指定用户的单聊会话
    pub async fn get_or_create_conversation(&self, participant_id: &str) -> Result<Conversation> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/chat/conversations", self.api_base_url);

        info!("[ConvAPI] 📡 查找或创建会话，对方用户ID: {}", participant_id);
        debug!("[ConvAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("operationID", &operation_id)
            .json(&serde_json::json!({
                "participant_id": participant_id,
            }))
            .send()
            .await
            .map_err(ChatError::from)?;

        handle_http_response::<Conversation>(response, "创建会话").await
    }

    /// 标记会话已读（响应内容忽略）
    pub async fn mark_as_read(&self, conversation_id: &str) -> Result<()> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!(
            "{}/chat/conversations/{}/read",
            self.api_base_url, conversation_id
        );

        debug!(
            "[ConvAPI] 📡 标记已读，会话ID: {}, 操作ID: {}",
            conversation_id, operation_id
        );

        let response = self
            .client
            .post(&url)
            .header("operationID", &operation_id)
            .send()
            .await
            .map_err(ChatError::from)?;

        ensure_success(response, "标记已读").await
    }
}
