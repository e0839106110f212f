//! 当前用户身份
//!
//! 同步引擎只读取身份信息：过滤用户列表，以及给本地合成的消息/会话标记"自己"。

use crate::im::conversation::models::Participant;
use serde::{Deserialize, Serialize};

/// 当前登录用户
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    #[serde(rename = "userID")]
    pub id: String,
    pub name: String,
    #[serde(rename = "avatarURL", default)]
    pub avatar_url: Option<String>,
}

impl CurrentUser {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            avatar_url: None,
        }
    }

    /// 作为会话参与者
    pub fn as_participant(&self) -> Participant {
        Participant {
            id: self.id.clone(),
            name: self.name.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

/// 身份提供者
pub trait IdentityProvider: Send + Sync {
    /// 当前用户（纯读取，不产生副作用）
    fn current_user(&self) -> CurrentUser;
}

/// 固定身份（登录后身份不变的会话、CLI 和测试使用）
#[derive(Debug, Clone)]
pub struct StaticIdentity {
    user: CurrentUser,
}

impl StaticIdentity {
    pub fn new(user: CurrentUser) -> Self {
        Self { user }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> CurrentUser {
        self.user.clone()
    }
}
