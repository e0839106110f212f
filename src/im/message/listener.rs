//! 消息监听器回调接口

use crate::im::message::models::Message;
use async_trait::async_trait;

/// 消息监听器
#[async_trait]
pub trait MessageListener: Send + Sync {
    /// 当前会话的消息列表被整体替换或清空
    async fn on_message_list_changed(&self, conversation_id: String, messages: Vec<Message>);

    /// 当前会话追加了一条新消息（发送成功或降级合成）
    async fn on_new_message(&self, message: Message);
}

/// 默认空实现（无操作）
pub struct EmptyMessageListener;

#[async_trait]
impl MessageListener for EmptyMessageListener {
    async fn on_message_list_changed(&self, _conversation_id: String, _messages: Vec<Message>) {
        // 默认不做任何处理
    }

    async fn on_new_message(&self, _message: Message) {
        // 默认不做任何处理
    }
}
