//! 用户 HTTP API 客户端

use crate::im::error::ChatError;
use crate::im::types::handle_http_response;
use crate::im::user::models::User;
use anyhow::Result;
use tracing::{debug, info};
use uuid::Uuid;

/// 用户相关的 HTTP API 客户端
#[derive(Clone)]
pub struct UserApi {
    client: reqwest::Client,
    api_base_url: String,
}

impl UserApi {
    pub fn new(client: reqwest::Client, api_base_url: String) -> Self {
        Self {
            client,
            api_base_url,
        }
    }

    /// 获取用户列表
    pub async fn get_user_list(&self) -> Result<Vec<User>> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/users/user-list", self.api_base_url);

        info!("[UserAPI] 📡 请求用户列表");
        debug!("[UserAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .get(&url)
            .header("operationID", &operation_id)
            .send()
            .await
            .map_err(ChatError::from)?;

        handle_http_response::<Vec<User>>(response, "用户列表").await
    }
}
