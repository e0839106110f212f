//! 用户本地模型定义

use crate::im::conversation::models::Participant;
use crate::im::serialization::deserialize_id;
use serde::{Deserialize, Serialize};

/// 用户列表中的用户
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default, alias = "firstName")]
    pub first_name: String,
    #[serde(default, alias = "lastName")]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "avatarUrl", alias = "avatar")]
    pub avatar_url: Option<String>,
}

impl User {
    /// 展示名称：优先姓名，其次用户名
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

impl From<&User> for Participant {
    fn from(user: &User) -> Self {
        Participant {
            id: user.id.clone(),
            name: user.display_name(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}
