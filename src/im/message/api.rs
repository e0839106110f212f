//! 消息 HTTP API 客户端

use crate::im::error::ChatError;
use crate::im::message::models::{Message, OutgoingAttachment};
use crate::im::types::handle_http_response;
use anyhow::Result;
use reqwest::multipart::{Form, Part};
use tracing::{debug, info};
use uuid::Uuid;

/// 消息相关的 HTTP API 客户端
#[derive(Clone)]
pub struct MessageApi {
    client: reqwest::Client,
    api_base_url: String,
}

impl MessageApi {
    pub fn new(client: reqwest::Client, api_base_url: String) -> Self {
        Self {
            client,
            api_base_url,
        }
    }

    /// 获取会话的全部消息
    pub async fn get_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!(
            "{}/chat/conversations/{}/messages",
            self.api_base_url, conversation_id
        );

        debug!(
            "[MsgAPI] 📡 请求消息列表，会话ID: {}, URL: {}, 操作ID: {}",
            conversation_id, url, operation_id
        );

        let response = self
            .client
            .get(&url)
            .header("operationID", &operation_id)
            .send()
            .await
            .map_err(ChatError::from)?;

        handle_http_response::<Vec<Message>>(response, "消息列表").await
    }

    /// 发送消息（multipart：content + 多个 attachments）
    pub async fn send_message(
        &self,
        conversation_id: &str,
        content: &str,
        attachments: &[OutgoingAttachment],
    ) -> Result<Message> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!(
            "{}/chat/conversations/{}/messages",
            self.api_base_url, conversation_id
        );

        info!(
            "[MsgAPI] 📤 发送消息，会话ID: {}, 附件数: {}",
            conversation_id,
            attachments.len()
        );
        debug!("[MsgAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let form = build_message_form(content, attachments)?;
        let response = self
            .client
            .post(&url)
            .header("operationID", &operation_id)
            .multipart(form)
            .send()
            .await
            .map_err(ChatError::from)?;

        handle_http_response::<Message>(response, "发送消息").await
    }
}

/// 构建发送消息的表单，附件顺序与传入顺序一致
fn build_message_form(content: &str, attachments: &[OutgoingAttachment]) -> Result<Form> {
    let mut form = Form::new().text("content", content.to_string());
    for attachment in attachments {
        let mut part = Part::bytes(attachment.data.clone()).file_name(attachment.filename.clone());
        if let Some(mime) = &attachment.mime_type {
            part = part.mime_str(mime).map_err(ChatError::from)?;
        }
        form = form.part("attachments", part);
    }
    Ok(form)
}
