//! 消息内存存储
//!
//! 只保存当前选中会话的消息。每次切换会话时代数加一，
//! 发出请求时记录 (会话 ID, 代数)，响应回来后不匹配的直接丢弃。

use crate::im::message::models::Message;

/// 请求发出时记录的目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub conversation_id: String,
    pub generation: u64,
}

/// 消息存储
#[derive(Debug, Default, Clone)]
pub struct MessageStore {
    conversation_id: Option<String>,
    messages: Vec<Message>,
    generation: u64,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// 切换到另一个会话：清空旧消息，代数加一
    pub fn retarget(&mut self, conversation_id: &str) {
        self.conversation_id = Some(conversation_id.to_string());
        self.messages.clear();
        self.generation += 1;
    }

    /// 取消目标会话（已有消息保留）
    pub fn detach(&mut self) {
        self.conversation_id = None;
        self.generation += 1;
    }

    /// 取消目标会话并清空消息
    pub fn reset(&mut self) {
        self.conversation_id = None;
        self.messages.clear();
        self.generation += 1;
    }

    /// 为指定会话生成请求凭据；不是当前目标时返回 None
    pub fn ticket(&self, conversation_id: &str) -> Option<FetchTicket> {
        match self.conversation_id.as_deref() {
            Some(current) if current == conversation_id => Some(FetchTicket {
                conversation_id: conversation_id.to_string(),
                generation: self.generation,
            }),
            _ => None,
        }
    }

    /// 凭据是否仍然有效
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.generation == ticket.generation
            && self.conversation_id.as_deref() == Some(ticket.conversation_id.as_str())
    }

    /// 整体替换消息列表，凭据失效时丢弃
    pub fn replace(&mut self, ticket: &FetchTicket, messages: Vec<Message>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.messages = messages;
        true
    }

    /// 只在新列表更长时替换（轮询使用，避免旧快照覆盖刚追加的消息）
    pub fn replace_if_grown(&mut self, ticket: &FetchTicket, messages: Vec<Message>) -> bool {
        if !self.is_current(ticket) || messages.len() <= self.messages.len() {
            return false;
        }
        self.messages = messages;
        true
    }

    /// 硬失败时清空列表，凭据失效时不动
    pub fn clear(&mut self, ticket: &FetchTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.messages.clear();
        true
    }

    /// 追加一条消息：必须属于当前目标会话，且 ID 不重复
    pub fn append(&mut self, msg: Message) -> bool {
        if self.conversation_id.as_deref() != Some(msg.conversation_id.as_str()) {
            return false;
        }
        if self.messages.iter().any(|m| m.id == msg.id) {
            return false;
        }
        self.messages.push(msg);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn msg(id: &str, conv: &str) -> Message {
        Message {
            id: id.to_string(),
            content: format!("content {}", id),
            sender_id: "u1".to_string(),
            conversation_id: conv.to_string(),
            attachments: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn stale_ticket_is_discarded() {
        let mut store = MessageStore::new();
        store.retarget("a");
        let ticket_a = store.ticket("a").unwrap();
        assert!(store.ticket("b").is_none());

        store.retarget("b");
        assert!(!store.replace(&ticket_a, vec![msg("1", "a")]));
        assert!(store.is_empty());

        let ticket_b = store.ticket("b").unwrap();
        assert!(store.replace(&ticket_b, vec![msg("2", "b")]));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn reselecting_same_conversation_invalidates_old_tickets() {
        let mut store = MessageStore::new();
        store.retarget("a");
        let old = store.ticket("a").unwrap();
        store.retarget("a");
        assert!(!store.is_current(&old));
    }

    #[test]
    fn growth_only_replace() {
        let mut store = MessageStore::new();
        store.retarget("a");
        let ticket = store.ticket("a").unwrap();
        store.replace(&ticket, vec![msg("1", "a"), msg("2", "a")]);

        assert!(!store.replace_if_grown(&ticket, vec![msg("1", "a")]));
        assert!(!store.replace_if_grown(&ticket, vec![msg("1", "a"), msg("x", "a")]));
        assert_eq!(store.messages()[1].id, "2");

        assert!(store.replace_if_grown(
            &ticket,
            vec![msg("1", "a"), msg("2", "a"), msg("3", "a")]
        ));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn append_rejects_other_conversations_and_duplicates() {
        let mut store = MessageStore::new();
        store.retarget("a");
        assert!(store.append(msg("1", "a")));
        assert!(!store.append(msg("1", "a")));
        assert!(!store.append(msg("2", "b")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn detach_keeps_messages_reset_clears() {
        let mut store = MessageStore::new();
        store.retarget("a");
        store.append(msg("1", "a"));
        store.detach();
        assert_eq!(store.len(), 1);
        assert!(store.conversation_id().is_none());
        store.reset();
        assert!(store.is_empty());
    }
}
