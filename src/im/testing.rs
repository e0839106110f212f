//! 测试用的内存聊天服务
//!
//! 每个接口可以预设返回数据或 HTTP 状态码，并记录调用次数。

use crate::im::conversation::models::{Conversation, Participant};
use crate::im::error::ChatError;
use crate::im::message::models::{Attachment, Message, OutgoingAttachment};
use crate::im::serialization::format_size_label;
use crate::im::transport::ChatApi;
use crate::im::user::models::User;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};
use std::time::Duration;

/// 预设的接口返回
#[derive(Debug, Clone)]
pub(crate) enum Reply<T> {
    Ok(T),
    Status(u16),
}

impl<T: Clone> Reply<T> {
    fn get(&self) -> Result<T> {
        match self {
            Reply::Ok(value) => Ok(value.clone()),
            Reply::Status(status) => Err(ChatError::Http {
                status: *status,
                body: format!("mock status {}", status),
            }
            .into()),
        }
    }
}

pub(crate) const SELF_ID: &str = "me";

pub(crate) fn ts(offset_secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_714_557_600, 0).unwrap() + ChronoDuration::seconds(offset_secs)
}

pub(crate) fn participant(id: &str) -> Participant {
    Participant {
        id: id.to_string(),
        name: format!("name-{}", id),
        avatar_url: None,
    }
}

pub(crate) fn conversation(id: &str, peer: &str, unread: u32) -> Conversation {
    Conversation {
        id: id.to_string(),
        participants: vec![participant(SELF_ID), participant(peer)],
        last_message: None,
        unread_count: unread,
        updated_at: ts(0),
        created_at: ts(0),
    }
}

pub(crate) fn message(id: &str, conversation_id: &str, content: &str) -> Message {
    Message {
        id: id.to_string(),
        content: content.to_string(),
        sender_id: "peer".to_string(),
        conversation_id: conversation_id.to_string(),
        attachments: Vec::new(),
        created_at: ts(60),
        updated_at: ts(60),
    }
}

pub(crate) fn thread(conversation_id: &str, count: usize) -> Vec<Message> {
    (1..=count)
        .map(|n| {
            message(
                &format!("{}-m{}", conversation_id, n),
                conversation_id,
                &format!("message {}", n),
            )
        })
        .collect()
}

pub(crate) fn user(id: &str, username: &str) -> User {
    User {
        id: id.to_string(),
        username: username.to_string(),
        first_name: String::new(),
        last_name: String::new(),
        email: String::new(),
        avatar_url: None,
    }
}

/// 内存聊天服务
pub(crate) struct MockChatApi {
    conversations: Mutex<Reply<Vec<Conversation>>>,
    messages: Mutex<HashMap<String, Reply<Vec<Message>>>>,
    message_delays: Mutex<HashMap<String, Duration>>,
    create: Mutex<Option<Reply<Conversation>>>,
    create_delay: Mutex<Duration>,
    send: Mutex<Option<Reply<Message>>>,
    send_delay: Mutex<Duration>,
    mark_read: Mutex<Reply<()>>,
    users: Mutex<Reply<Vec<User>>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    sent_ids: AtomicUsize,
}

impl MockChatApi {
    pub fn new() -> Self {
        Self {
            conversations: Mutex::new(Reply::Ok(Vec::new())),
            messages: Mutex::new(HashMap::new()),
            message_delays: Mutex::new(HashMap::new()),
            create: Mutex::new(None),
            create_delay: Mutex::new(Duration::ZERO),
            send: Mutex::new(None),
            send_delay: Mutex::new(Duration::ZERO),
            mark_read: Mutex::new(Reply::Ok(())),
            users: Mutex::new(Reply::Ok(Vec::new())),
            calls: Mutex::new(HashMap::new()),
            sent_ids: AtomicUsize::new(0),
        }
    }

    pub fn set_conversations(&self, reply: Reply<Vec<Conversation>>) {
        *self.conversations.lock().unwrap() = reply;
    }

    pub fn set_messages(&self, conversation_id: &str, reply: Reply<Vec<Message>>) {
        self.messages
            .lock()
            .unwrap()
            .insert(conversation_id.to_string(), reply);
    }

    pub fn set_message_delay(&self, conversation_id: &str, delay: Duration) {
        self.message_delays
            .lock()
            .unwrap()
            .insert(conversation_id.to_string(), delay);
    }

    /// None 表示按参与者自动生成服务器会话
    pub fn set_create(&self, reply: Option<Reply<Conversation>>) {
        *self.create.lock().unwrap() = reply;
    }

    pub fn set_create_delay(&self, delay: Duration) {
        *self.create_delay.lock().unwrap() = delay;
    }

    /// None 表示回显发送内容
    pub fn set_send(&self, reply: Option<Reply<Message>>) {
        *self.send.lock().unwrap() = reply;
    }

    pub fn set_send_delay(&self, delay: Duration) {
        *self.send_delay.lock().unwrap() = delay;
    }

    pub fn set_mark_read(&self, reply: Reply<()>) {
        *self.mark_read.lock().unwrap() = reply;
    }

    pub fn set_users(&self, reply: Reply<Vec<User>>) {
        *self.users.lock().unwrap() = reply;
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(endpoint)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    fn record(&self, endpoint: &'static str) {
        *self.calls.lock().unwrap().entry(endpoint).or_insert(0) += 1;
    }
}

#[async_trait]
impl ChatApi for MockChatApi {
    async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        self.record("list_conversations");
        let reply = self.conversations.lock().unwrap().clone();
        reply.get()
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        self.record("list_messages");
        let delay = self
            .message_delays
            .lock()
            .unwrap()
            .get(conversation_id)
            .copied();
        let reply = self
            .messages
            .lock()
            .unwrap()
            .get(conversation_id)
            .cloned()
            .unwrap_or(Reply::Ok(Vec::new()));
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        reply.get()
    }

    async fn get_or_create_conversation(&self, participant_id: &str) -> Result<Conversation> {
        self.record("get_or_create_conversation");
        let delay = *self.create_delay.lock().unwrap();
        let reply = self.create.lock().unwrap().clone();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match reply {
            Some(reply) => reply.get(),
            None => Ok(conversation(
                &format!("srv-conv-{}", participant_id),
                participant_id,
                0,
            )),
        }
    }

    async fn send_message(
        &self,
        conversation_id: &str,
        content: &str,
        attachments: &[OutgoingAttachment],
    ) -> Result<Message> {
        self.record("send_message");
        let delay = *self.send_delay.lock().unwrap();
        let reply = self.send.lock().unwrap().clone();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match reply {
            Some(reply) => reply.get(),
            None => {
                let n = self.sent_ids.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(Message {
                    id: format!("srv-msg-{}", n),
                    content: content.to_string(),
                    sender_id: SELF_ID.to_string(),
                    conversation_id: conversation_id.to_string(),
                    attachments: attachments
                        .iter()
                        .enumerate()
                        .map(|(idx, a)| Attachment {
                            id: format!("srv-file-{}-{}", n, idx),
                            filename: a.filename.clone(),
                            url: format!("/media/{}", a.filename),
                            size_label: format_size_label(a.size()),
                        })
                        .collect(),
                    created_at: ts(3600),
                    updated_at: ts(3600),
                })
            }
        }
    }

    async fn mark_as_read(&self, _conversation_id: &str) -> Result<()> {
        self.record("mark_as_read");
        let reply = self.mark_read.lock().unwrap().clone();
        reply.get()
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        self.record("list_users");
        let reply = self.users.lock().unwrap().clone();
        reply.get()
    }
}

static INIT_LOGGER: Once = Once::new();

/// 测试日志（只初始化一次）
pub(crate) fn init_test_logger() {
    INIT_LOGGER.call_once(|| {
        use tracing_subscriber::prelude::*;
        use tracing_subscriber::EnvFilter;

        let filter_layer = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,chat_sync_core=debug"));

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_file(true) // 包含文件名
            .with_line_number(true) // 包含行号
            .with_target(false)
            .with_test_writer();

        let _ = tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .try_init();
    });
}
