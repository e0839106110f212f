//! 消息模块
//!
//! 消息数据模型、HTTP 接口、当前会话的消息存储和监听器

pub mod api;
pub mod listener;
pub mod models;
pub mod store;

// 重新导出主要类型
pub use api::MessageApi;
pub use listener::{EmptyMessageListener, MessageListener};
pub use models::{Attachment, Message, OutgoingAttachment};
pub use store::MessageStore;
