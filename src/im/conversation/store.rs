//! 会话内存存储
//!
//! 保存有序会话列表和当前选中的会话。选中状态只记录 ID，
//! 读取时从列表中取，保证拿到的总是列表里的最新数据。

use crate::im::conversation::models::Conversation;
use crate::im::message::models::Message;
use std::collections::HashSet;

/// 整体替换列表的结果
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplaceOutcome {
    /// 被保留下来的本地会话数
    pub retained_local: usize,
    /// 选中的会话不在新列表中，选中状态已清除
    pub selection_dropped: bool,
}

/// 会话存储
#[derive(Debug, Default, Clone)]
pub struct ConversationStore {
    conversations: Vec<Conversation>,
    selected_id: Option<String>,
    /// 降级模式下本地合成的会话 ID
    local_ids: HashSet<String>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn get(&self, conversation_id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == conversation_id)
    }

    pub fn contains(&self, conversation_id: &str) -> bool {
        self.get(conversation_id).is_some()
    }

    /// 查找包含指定参与者的会话
    pub fn find_by_participant(&self, user_id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.has_participant(user_id))
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    /// 当前选中的会话（总是列表中的那一项）
    pub fn selected(&self) -> Option<&Conversation> {
        self.selected_id.as_deref().and_then(|id| self.get(id))
    }

    /// 设置选中会话，会话必须已在列表中
    pub fn select(&mut self, conversation_id: Option<&str>) -> bool {
        match conversation_id {
            Some(id) if self.contains(id) => {
                self.selected_id = Some(id.to_string());
                true
            }
            Some(_) => false,
            None => {
                self.selected_id = None;
                true
            }
        }
    }

    /// 整体替换会话列表
    ///
    /// `retain_local` 为 true 时，新列表中没有的本地会话保留在最前面。
    /// 选中的会话不在新列表中时清除选中状态。
    pub fn replace_all(
        &mut self,
        incoming: Vec<Conversation>,
        retain_local: bool,
    ) -> ReplaceOutcome {
        let mut seen = HashSet::new();
        let mut next = Vec::with_capacity(incoming.len());

        if retain_local {
            for conv in &self.conversations {
                if self.local_ids.contains(&conv.id)
                    && !incoming.iter().any(|c| c.id == conv.id)
                    && seen.insert(conv.id.clone())
                {
                    next.push(conv.clone());
                }
            }
        }
        let retained_local = next.len();

        // 服务器返回的列表按 ID 去重，保留第一次出现的
        for conv in incoming {
            if seen.insert(conv.id.clone()) {
                next.push(conv);
            }
        }

        self.local_ids.retain(|id| seen.contains(id));
        self.conversations = next;

        let selection_dropped = match &self.selected_id {
            Some(id) if !self.contains(id) => {
                self.selected_id = None;
                true
            }
            _ => false,
        };

        ReplaceOutcome {
            retained_local,
            selection_dropped,
        }
    }

    /// 整体替换为本地合成的列表（这些会话全部记为本地会话）
    pub fn replace_with_local(
        &mut self,
        incoming: Vec<Conversation>,
        retain_local: bool,
    ) -> ReplaceOutcome {
        let ids: Vec<String> = incoming.iter().map(|c| c.id.clone()).collect();
        let outcome = self.replace_all(incoming, retain_local);
        self.local_ids.extend(ids);
        outcome
    }

    /// 不存在同 ID 的会话时插入到最前面，返回是否插入
    pub fn insert_if_absent(&mut self, conversation: Conversation) -> bool {
        if self.contains(&conversation.id) {
            return false;
        }
        self.conversations.insert(0, conversation);
        true
    }

    /// 插入本地合成的会话
    pub fn insert_local(&mut self, conversation: Conversation) -> bool {
        let id = conversation.id.clone();
        let inserted = self.insert_if_absent(conversation);
        if inserted {
            self.local_ids.insert(id);
        }
        inserted
    }

    /// 用新消息更新会话的最新消息和更新时间，其他字段不变
    pub fn apply_last_message(&mut self, conversation_id: &str, msg: &Message) -> bool {
        match self.conversations.iter_mut().find(|c| c.id == conversation_id) {
            Some(conv) => {
                conv.apply_last_message(msg);
                true
            }
            None => false,
        }
    }

    /// 未读数清零
    pub fn reset_unread(&mut self, conversation_id: &str) -> bool {
        match self.conversations.iter_mut().find(|c| c.id == conversation_id) {
            Some(conv) if conv.unread_count > 0 => {
                conv.unread_count = 0;
                true
            }
            _ => false,
        }
    }

    /// 所有会话未读数之和
    pub fn total_unread(&self) -> u32 {
        self.conversations
            .iter()
            .fold(0u32, |acc, c| acc.saturating_add(c.unread_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::im::conversation::models::Participant;
    use chrono::Utc;

    fn conv(id: &str, peer: &str, unread: u32) -> Conversation {
        Conversation {
            id: id.to_string(),
            participants: vec![Participant {
                id: peer.to_string(),
                name: peer.to_string(),
                avatar_url: None,
            }],
            last_message: None,
            unread_count: unread,
            updated_at: Utc::now(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn replace_all_dedupes_and_keeps_order() {
        let mut store = ConversationStore::new();
        store.replace_all(vec![conv("a", "1", 0), conv("b", "2", 1), conv("a", "3", 0)], false);
        let ids: Vec<_> = store.list().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(store.get("a").unwrap().participants[0].id, "1");
        assert_eq!(store.total_unread(), 1);
    }

    #[test]
    fn selection_follows_list_entry() {
        let mut store = ConversationStore::new();
        store.replace_all(vec![conv("a", "1", 2)], false);
        assert!(store.select(Some("a")));
        assert!(!store.select(Some("missing")));
        assert_eq!(store.selected_id(), Some("a"));

        // 列表刷新后选中的会话是新数据
        store.replace_all(vec![conv("a", "1", 5)], false);
        assert_eq!(store.selected().unwrap().unread_count, 5);

        // 新列表中不存在时清除选中
        let outcome = store.replace_all(vec![conv("b", "2", 0)], false);
        assert!(outcome.selection_dropped);
        assert!(store.selected().is_none());
    }

    #[test]
    fn local_conversations_dropped_or_retained_by_policy() {
        let mut store = ConversationStore::new();
        store.replace_all(vec![conv("s1", "1", 0)], false);
        assert!(store.insert_local(conv("local-1", "9", 0)));
        assert!(store.local_ids.contains("local-1"));
        assert_eq!(store.list()[0].id, "local-1");

        let outcome = store.replace_all(vec![conv("s1", "1", 0), conv("s2", "2", 0)], true);
        assert_eq!(outcome.retained_local, 1);
        let ids: Vec<_> = store.list().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["local-1", "s1", "s2"]);

        store.replace_all(vec![conv("s1", "1", 0)], false);
        assert!(!store.contains("local-1"));
        assert!(!store.local_ids.contains("local-1"));
    }

    #[test]
    fn insert_if_absent_is_idempotent() {
        let mut store = ConversationStore::new();
        store.replace_all(vec![conv("a", "1", 0)], false);
        assert!(store.insert_if_absent(conv("b", "2", 0)));
        assert!(!store.insert_if_absent(conv("b", "2", 7)));
        assert_eq!(store.list().len(), 2);
        assert_eq!(store.list()[0].id, "b");
        assert_eq!(store.get("b").unwrap().unread_count, 0);
        assert_eq!(store.find_by_participant("2").unwrap().id, "b");
    }

    #[test]
    fn reset_unread_only_touches_target() {
        let mut store = ConversationStore::new();
        store.replace_all(vec![conv("a", "1", 3), conv("b", "2", 4)], false);
        assert!(store.reset_unread("a"));
        assert!(!store.reset_unread("a"));
        assert_eq!(store.get("a").unwrap().unread_count, 0);
        assert_eq!(store.get("b").unwrap().unread_count, 4);
    }
}
