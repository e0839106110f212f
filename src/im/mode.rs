//! 降级模式判定
//!
//! 每次调用根据本次响应单独判定：404 表示接口尚未实现，本次调用改用本地合成数据；
//! 其他错误原样向上传递。不缓存"后端不可用"之类的全局标记。

use crate::im::error::is_route_not_implemented;
use serde::Serialize;
use std::fmt;

/// 参与降级判定的逻辑资源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChatResource {
    Conversations,
    Messages,
    ConversationCreation,
    Send,
}

impl ChatResource {
    pub const ALL: [ChatResource; 4] = [
        ChatResource::Conversations,
        ChatResource::Messages,
        ChatResource::ConversationCreation,
        ChatResource::Send,
    ];

    fn index(self) -> usize {
        match self {
            ChatResource::Conversations => 0,
            ChatResource::Messages => 1,
            ChatResource::ConversationCreation => 2,
            ChatResource::Send => 3,
        }
    }
}

impl fmt::Display for ChatResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChatResource::Conversations => "会话列表",
            ChatResource::Messages => "消息列表",
            ChatResource::ConversationCreation => "创建会话",
            ChatResource::Send => "发送消息",
        };
        f.write_str(name)
    }
}

/// 资源最近一次调用所处的模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SyncMode {
    #[default]
    Live,
    Degraded,
}

/// 单次失败的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// 使用本地合成数据
    Degrade,
    /// 作为错误向上传递
    Propagate,
}

/// 根据本次调用的错误决定处理方式
pub fn resolve(err: &anyhow::Error) -> Resolution {
    if is_route_not_implemented(err) {
        Resolution::Degrade
    } else {
        Resolution::Propagate
    }
}

/// 每个资源最近一次调用的模式（只记录，不影响下一次调用是否请求远端）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModeTable {
    modes: [SyncMode; 4],
}

impl ModeTable {
    pub fn get(&self, resource: ChatResource) -> SyncMode {
        self.modes[resource.index()]
    }

    pub fn record(&mut self, resource: ChatResource, mode: SyncMode) {
        self.modes[resource.index()] = mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::im::error::ChatError;

    #[test]
    fn resolve_per_status() {
        let not_found: anyhow::Error = ChatError::Http {
            status: 404,
            body: String::new(),
        }
        .into();
        assert_eq!(resolve(&not_found), Resolution::Degrade);

        let unavailable: anyhow::Error = ChatError::Http {
            status: 503,
            body: String::new(),
        }
        .into();
        assert_eq!(resolve(&unavailable), Resolution::Propagate);

        let network: anyhow::Error = ChatError::Network("connection refused".into()).into();
        assert_eq!(resolve(&network), Resolution::Propagate);
    }

    #[test]
    fn modes_are_tracked_per_resource() {
        let mut table = ModeTable::default();
        for resource in ChatResource::ALL {
            assert_eq!(table.get(resource), SyncMode::Live);
        }

        table.record(ChatResource::Messages, SyncMode::Degraded);
        assert_eq!(table.get(ChatResource::Messages), SyncMode::Degraded);
        assert_eq!(table.get(ChatResource::Conversations), SyncMode::Live);

        table.record(ChatResource::Messages, SyncMode::Live);
        assert_eq!(table.get(ChatResource::Messages), SyncMode::Live);
    }
}
