//! 同步引擎持有的全部可变状态

use crate::im::conversation::models::Conversation;
use crate::im::conversation::store::ConversationStore;
use crate::im::message::models::Message;
use crate::im::message::store::MessageStore;
use crate::im::mode::{ChatResource, ModeTable, SyncMode};
use crate::im::user::models::User;
use serde::Serialize;

/// 加载标记，各自独立开关，不根据数据是否存在推断
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadingFlags {
    pub conversations: bool,
    pub messages: bool,
    pub users: bool,
    pub sending: bool,
}

/// 加载标记的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingKind {
    Conversations,
    Messages,
    Users,
    Sending,
}

impl LoadingKind {
    fn index(self) -> usize {
        match self {
            LoadingKind::Conversations => 0,
            LoadingKind::Messages => 1,
            LoadingKind::Users => 2,
            LoadingKind::Sending => 3,
        }
    }
}

impl LoadingFlags {
    pub fn set(&mut self, kind: LoadingKind, value: bool) {
        match kind {
            LoadingKind::Conversations => self.conversations = value,
            LoadingKind::Messages => self.messages = value,
            LoadingKind::Users => self.users = value,
            LoadingKind::Sending => self.sending = value,
        }
    }
}

/// 同步状态：最近一次用户操作的错误，以及每个资源最近一次的模式
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncState {
    pub error: Option<String>,
    pub modes: ModeTable,
}

/// 引擎内部状态
#[derive(Debug, Default)]
pub(crate) struct ChatState {
    pub conversations: ConversationStore,
    pub messages: MessageStore,
    pub users: Vec<User>,
    pub loading: LoadingFlags,
    pub sync: SyncState,
    /// 上一次通知出去的总未读数
    pub last_total_unread: Option<u32>,
    /// 每种加载中的请求数，归零时标记才复位
    in_flight: [u32; 4],
}

impl ChatState {
    pub fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            conversations: self.conversations.list().to_vec(),
            selected_conversation: self.conversations.selected().cloned(),
            messages: self.messages.messages().to_vec(),
            users: self.users.clone(),
            loading: self.loading,
            sync: self.sync.clone(),
        }
    }

    pub fn begin_loading(&mut self, kind: LoadingKind) {
        self.in_flight[kind.index()] += 1;
        self.loading.set(kind, true);
    }

    pub fn end_loading(&mut self, kind: LoadingKind) {
        let count = &mut self.in_flight[kind.index()];
        *count = count.saturating_sub(1);
        let still_loading = *count > 0;
        self.loading.set(kind, still_loading);
    }

    pub fn record_mode(&mut self, resource: ChatResource, mode: SyncMode) {
        self.sync.modes.record(resource, mode);
    }

    /// 总未读数有变化时返回新值
    pub fn take_unread_change(&mut self) -> Option<u32> {
        let total = self.conversations.total_unread();
        if self.last_total_unread == Some(total) {
            return None;
        }
        self.last_total_unread = Some(total);
        Some(total)
    }
}

/// 给调用方的只读快照
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChatSnapshot {
    pub conversations: Vec<Conversation>,
    pub selected_conversation: Option<Conversation>,
    pub messages: Vec<Message>,
    pub users: Vec<User>,
    pub loading: LoadingFlags,
    pub sync: SyncState,
}
