//! 会话监听器回调接口

use crate::im::conversation::models::Conversation;
use async_trait::async_trait;

/// 会话监听器回调接口
#[async_trait]
pub trait ConversationListener: Send + Sync {
    /// 会话列表变更（参数为变更后的完整列表）
    async fn on_conversation_list_changed(&self, conversations: Vec<Conversation>);

    /// 选中的会话变更
    async fn on_selected_conversation_changed(&self, conversation: Option<Conversation>);

    /// 总未读消息数变更
    async fn on_total_unread_count_changed(&self, total_unread_count: u32);
}

/// 空实现（默认监听器）
pub struct EmptyConversationListener;

#[async_trait]
impl ConversationListener for EmptyConversationListener {
    async fn on_conversation_list_changed(&self, _conversations: Vec<Conversation>) {}
    async fn on_selected_conversation_changed(&self, _conversation: Option<Conversation>) {}
    async fn on_total_unread_count_changed(&self, _total_unread_count: u32) {}
}
