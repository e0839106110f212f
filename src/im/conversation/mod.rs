//! 会话模块
//!
//! 会话数据模型、HTTP 接口、内存存储和监听器

pub mod api;
pub mod listener;
pub mod models;
pub mod store;

// 重新导出主要类型
pub use api::ConversationApi;
pub use listener::{ConversationListener, EmptyConversationListener};
pub use models::{Conversation, MessagePreview, Participant};
pub use store::ConversationStore;
