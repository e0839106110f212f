//! 会话/消息同步引擎
//!
//! [`ChatClient`] 持有会话存储和消息存储，所有修改都通过这里的操作完成。
//! 远端调用成功时写入存储；404 时用本地合成数据走同一条写入路径；
//! 其他错误记录到 `error` 并返回给调用方，存储保持原状（消息列表清空）。
//! 两个轮询器复用同样的写入逻辑，但轮询遇到错误只记日志。

use crate::im::conversation::listener::{ConversationListener, EmptyConversationListener};
use crate::im::conversation::models::{Conversation, Participant};
use crate::im::identity::{CurrentUser, IdentityProvider};
use crate::im::message::listener::{EmptyMessageListener, MessageListener};
use crate::im::message::models::{Message, OutgoingAttachment};
use crate::im::message::store::FetchTicket;
use crate::im::mode::{self, ChatResource, Resolution, SyncMode};
use crate::im::poller::{PollTask, PollerState, Pollers, TickControl};
use crate::im::state::{ChatSnapshot, ChatState, LoadingFlags, LoadingKind};
use crate::im::synthetic;
use crate::im::transport::{ChatApi, HttpChatApi};
use crate::im::user::models::User;
use anyhow::Result;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// 客户端配置
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// HTTP API 基础地址
    pub api_base_url: String,
    /// 认证 token（为空时不带认证头）
    pub token: String,
    /// 当前会话消息轮询周期
    pub message_poll_interval: Duration,
    /// 会话列表轮询周期
    pub conversation_poll_interval: Duration,
    /// 单次请求超时（由 HTTP 客户端负责）
    pub request_timeout: Duration,
    /// 服务器列表刷新时是否保留本地合成的会话
    pub retain_local_conversations: bool,
}

impl ClientConfig {
    /// 创建默认配置
    pub fn new(api_base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            token: token.into(),
            message_poll_interval: Duration::from_millis(3000),
            conversation_poll_interval: Duration::from_millis(5000),
            request_timeout: Duration::from_secs(30),
            retain_local_conversations: false,
        }
    }

    pub fn with_message_poll_interval(mut self, interval: Duration) -> Self {
        self.message_poll_interval = interval;
        self
    }

    pub fn with_conversation_poll_interval(mut self, interval: Duration) -> Self {
        self.conversation_poll_interval = interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retain_local_conversations(mut self, retain: bool) -> Self {
        self.retain_local_conversations = retain;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:8000/api", "")
    }
}

/// 释放状态锁之后再分发给监听器的事件
enum ChatEvent {
    ConversationList(Vec<Conversation>),
    Selected(Option<Conversation>),
    TotalUnread(u32),
    MessageList(String, Vec<Message>),
    NewMessage(Message),
}

struct ClientInner {
    config: ClientConfig,
    api: Arc<dyn ChatApi>,
    identity: Arc<dyn IdentityProvider>,
    conversation_listener: Arc<dyn ConversationListener>,
    message_listener: Arc<dyn MessageListener>,
    state: Mutex<ChatState>,
    /// 加锁顺序固定为 state → pollers，选中状态和消息轮询目标在同一临界区内更新
    pollers: Mutex<Pollers>,
    /// 按对方用户 ID 串行化"查找或创建会话"
    creation_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

/// 聊天同步客户端
///
/// 克隆开销很小，所有克隆共享同一份状态。最后一个克隆释放时轮询任务随之停止。
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<ClientInner>,
}

impl ChatClient {
    /// 创建新的客户端（使用默认空监听器）
    pub fn new(
        config: ClientConfig,
        api: Arc<dyn ChatApi>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self::with_listeners(
            config,
            api,
            identity,
            Arc::new(EmptyConversationListener),
            Arc::new(EmptyMessageListener),
        )
    }

    /// 创建新的客户端（带自定义监听器）
    pub fn with_listeners(
        config: ClientConfig,
        api: Arc<dyn ChatApi>,
        identity: Arc<dyn IdentityProvider>,
        conversation_listener: Arc<dyn ConversationListener>,
        message_listener: Arc<dyn MessageListener>,
    ) -> Self {
        info!(
            "[ChatSync] 创建同步客户端，用户ID: {}, API: {}",
            identity.current_user().id,
            config.api_base_url
        );
        Self {
            inner: Arc::new(ClientInner {
                config,
                api,
                identity,
                conversation_listener,
                message_listener,
                state: Mutex::new(ChatState::default()),
                pollers: Mutex::new(Pollers::default()),
                creation_locks: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// 使用 HTTP 传输创建客户端
    pub fn connect(
        config: ClientConfig,
        identity: Arc<dyn IdentityProvider>,
        conversation_listener: Arc<dyn ConversationListener>,
        message_listener: Arc<dyn MessageListener>,
    ) -> Result<Self> {
        let api = HttpChatApi::connect(
            config.api_base_url.clone(),
            &config.token,
            config.request_timeout,
        )?;
        Ok(Self::with_listeners(
            config,
            Arc::new(api),
            identity,
            conversation_listener,
            message_listener,
        ))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn current_user(&self) -> CurrentUser {
        self.inner.identity.current_user()
    }

    // ========== 生命周期 ==========

    /// 启动会话列表轮询，并立即拉取一次会话列表
    pub async fn start(&self) -> Result<Vec<Conversation>> {
        self.start_conversation_poller().await;
        self.fetch_conversations().await
    }

    /// 停止所有轮询（进行中的请求不会中断，返回后按当前选中状态校验）
    pub async fn shutdown(&self) {
        self.inner.pollers.lock().await.stop_all();
        info!("[ChatSync] 已停止所有轮询");
    }

    // ========== 只读快照 ==========

    pub async fn snapshot(&self) -> ChatSnapshot {
        self.inner.state.lock().await.snapshot()
    }

    pub async fn conversations(&self) -> Vec<Conversation> {
        self.inner.state.lock().await.conversations.list().to_vec()
    }

    pub async fn selected_conversation(&self) -> Option<Conversation> {
        self.inner.state.lock().await.conversations.selected().cloned()
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.inner.state.lock().await.messages.messages().to_vec()
    }

    pub async fn users(&self) -> Vec<User> {
        self.inner.state.lock().await.users.clone()
    }

    pub async fn loading(&self) -> LoadingFlags {
        self.inner.state.lock().await.loading
    }

    pub async fn error(&self) -> Option<String> {
        self.inner.state.lock().await.sync.error.clone()
    }

    pub async fn mode(&self, resource: ChatResource) -> SyncMode {
        self.inner.state.lock().await.sync.modes.get(resource)
    }

    pub async fn total_unread_count(&self) -> u32 {
        self.inner.state.lock().await.conversations.total_unread()
    }

    pub async fn message_poller_state(&self) -> PollerState {
        self.inner.pollers.lock().await.message_state()
    }

    pub async fn conversation_poller_state(&self) -> PollerState {
        self.inner.pollers.lock().await.conversation_state()
    }

    // ========== 会话 ==========

    /// 拉取全部会话，成功时整体替换列表
    pub async fn fetch_conversations(&self) -> Result<Vec<Conversation>> {
        self.begin(LoadingKind::Conversations).await;
        let result = self.load_conversations().await;
        self.finish(LoadingKind::Conversations, result.as_ref().err())
            .await;
        result
    }

    async fn load_conversations(&self) -> Result<Vec<Conversation>> {
        match self.inner.api.list_conversations().await {
            Ok(list) => {
                info!("[ChatSync] 会话列表拉取成功，共 {} 个", list.len());
                Ok(self.apply_conversation_list(list, SyncMode::Live).await)
            }
            Err(err) => match mode::resolve(&err) {
                Resolution::Degrade => {
                    warn!("[ChatSync] 会话列表接口未实现（404），使用本地数据");
                    let list = synthetic::synthetic_conversations(&self.current_user());
                    Ok(self.apply_conversation_list(list, SyncMode::Degraded).await)
                }
                Resolution::Propagate => {
                    error!(
                        "[ChatSync] ❌ 会话列表拉取失败，保留现有列表: {:#}",
                        err
                    );
                    Err(err)
                }
            },
        }
    }

    /// 整体替换会话列表，返回替换后的列表
    async fn apply_conversation_list(
        &self,
        list: Vec<Conversation>,
        mode: SyncMode,
    ) -> Vec<Conversation> {
        let retain_local = self.inner.config.retain_local_conversations;
        let mut events = Vec::new();
        let snapshot = {
            let mut state = self.inner.state.lock().await;
            state.record_mode(ChatResource::Conversations, mode);
            let previous_selection = state.conversations.selected_id().map(str::to_string);
            let outcome = match mode {
                SyncMode::Live => state.conversations.replace_all(list, retain_local),
                SyncMode::Degraded => state.conversations.replace_with_local(list, retain_local),
            };
            if outcome.retained_local > 0 {
                debug!("[ChatSync] 保留 {} 个本地会话", outcome.retained_local);
            }

            if let Some(id) = previous_selection.filter(|_| outcome.selection_dropped) {
                warn!("[ChatSync] 选中的会话 {} 已不在列表中，取消选中", id);
                state.messages.reset();
                Self::stop_message_poller(&mut *self.inner.pollers.lock().await);
                events.push(ChatEvent::Selected(None));
                events.push(ChatEvent::MessageList(id, Vec::new()));
            }
            Self::push_conversation_events(&mut state, &mut events);
            state.conversations.list().to_vec()
        };

        self.emit(events).await;
        snapshot
    }

    /// 查找或创建与指定用户的单聊会话
    pub async fn get_or_create_conversation(&self, user_id: &str) -> Result<Conversation> {
        self.create_conversation(user_id, None).await
    }

    async fn create_conversation(
        &self,
        user_id: &str,
        known_peer: Option<Participant>,
    ) -> Result<Conversation> {
        match self.inner.api.get_or_create_conversation(user_id).await {
            Ok(conversation) => {
                let mut events = Vec::new();
                let stored = {
                    let mut state = self.inner.state.lock().await;
                    state.record_mode(ChatResource::ConversationCreation, SyncMode::Live);
                    let id = conversation.id.clone();
                    if state.conversations.insert_if_absent(conversation.clone()) {
                        info!("[ChatSync] 🆕 新会话: {}", id);
                        Self::push_conversation_events(&mut state, &mut events);
                    }
                    state.conversations.get(&id).cloned().unwrap_or(conversation)
                };
                self.emit(events).await;
                Ok(stored)
            }
            Err(err) => match mode::resolve(&err) {
                Resolution::Degrade => {
                    warn!("[ChatSync] 创建会话接口未实现（404），本地合成会话");
                    let me = self.current_user();
                    let mut events = Vec::new();
                    let conversation = {
                        let mut state = self.inner.state.lock().await;
                        state.record_mode(ChatResource::ConversationCreation, SyncMode::Degraded);
                        match state.conversations.find_by_participant(user_id).cloned() {
                            Some(existing) => {
                                debug!(
                                    "[ChatSync] 已有包含用户 {} 的会话: {}",
                                    user_id, existing.id
                                );
                                existing
                            }
                            None => {
                                let peer = known_peer
                                    .or_else(|| {
                                        state
                                            .users
                                            .iter()
                                            .find(|u| u.id == user_id)
                                            .map(Participant::from)
                                    })
                                    .unwrap_or_else(|| synthetic::placeholder_participant(user_id));
                                let conversation =
                                    synthetic::synthetic_conversation(&me, peer, Utc::now());
                                state.conversations.insert_local(conversation.clone());
                                info!("[ChatSync] 🆕 本地会话: {}", conversation.id);
                                Self::push_conversation_events(&mut state, &mut events);
                                conversation
                            }
                        }
                    };
                    self.emit(events).await;
                    Ok(conversation)
                }
                Resolution::Propagate => {
                    error!("[ChatSync] ❌ 创建会话失败: {:#}", err);
                    self.record_error(&err).await;
                    Err(err)
                }
            },
        }
    }

    /// 选中会话并拉取其消息；传 None 取消选中（消息列表保持不变）
    pub async fn select_conversation(&self, conversation: Option<Conversation>) -> Result<()> {
        let Some(conversation) = conversation else {
            {
                let mut state = self.inner.state.lock().await;
                state.conversations.select(None);
                state.messages.detach();
                Self::stop_message_poller(&mut *self.inner.pollers.lock().await);
            }
            self.emit(vec![ChatEvent::Selected(None)]).await;
            return Ok(());
        };

        let id = conversation.id.clone();
        let mut events = Vec::new();
        let unread = {
            let mut state = self.inner.state.lock().await;
            if state.conversations.insert_if_absent(conversation) {
                debug!("[ChatSync] 选中的会话不在列表中，已插入: {}", id);
                Self::push_conversation_events(&mut state, &mut events);
            }
            let changed = state.conversations.selected_id() != Some(id.as_str());
            state.conversations.select(Some(&id));
            if changed {
                state.messages.retarget(&id);
                events.push(ChatEvent::MessageList(id.clone(), Vec::new()));
            }
            let selected = state.conversations.selected().cloned();
            let unread = selected.as_ref().map(|c| c.unread_count).unwrap_or(0);
            events.push(ChatEvent::Selected(selected));

            let mut pollers = self.inner.pollers.lock().await;
            let poller_on_target = pollers.message_target() == Some(id.as_str())
                && pollers.message_state() == PollerState::Running;
            if changed || !poller_on_target {
                // 替换旧任务时旧任务随之取消
                pollers.message = Some((id.clone(), self.spawn_message_poller(&id)));
            }
            unread
        };
        info!("[ChatSync] 选中会话: {}, 未读: {}", id, unread);
        self.emit(events).await;

        let read = async {
            if unread > 0 {
                self.mark_as_read(&id).await;
            }
        };
        let (_, fetched) = tokio::join!(read, self.fetch_messages(&id));
        fetched.map(|_| ())
    }

    /// 打开与某个用户的会话：已有则直接选中，否则先查找或创建
    ///
    /// 同一用户的并发调用会串行执行，后到的调用复用先前创建的会话。
    pub async fn select_user(&self, user: &User) -> Result<Conversation> {
        let lock = {
            let mut locks = self.inner.creation_locks.lock().await;
            locks
                .entry(user.id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        let conversation = {
            let _guard = lock.lock().await;
            let existing = {
                let state = self.inner.state.lock().await;
                state.conversations.find_by_participant(&user.id).cloned()
            };
            match existing {
                Some(conversation) => conversation,
                None => {
                    self.create_conversation(&user.id, Some(Participant::from(user)))
                        .await?
                }
            }
        };

        self.select_conversation(Some(conversation.clone())).await?;
        Ok(self
            .selected_conversation()
            .await
            .unwrap_or(conversation))
    }

    /// 标记会话已读；失败只记日志，返回是否成功
    pub async fn mark_as_read(&self, conversation_id: &str) -> bool {
        match self.inner.api.mark_as_read(conversation_id).await {
            Ok(()) => {
                let mut events = Vec::new();
                {
                    let mut state = self.inner.state.lock().await;
                    if state.conversations.reset_unread(conversation_id) {
                        Self::push_conversation_events(&mut state, &mut events);
                    }
                }
                debug!("[ChatSync] 会话 {} 已标记已读", conversation_id);
                self.emit(events).await;
                true
            }
            Err(err) => {
                warn!(
                    "[ChatSync] 标记已读失败（忽略），会话ID: {}, 错误: {:#}",
                    conversation_id, err
                );
                false
            }
        }
    }

    // ========== 用户 ==========

    /// 拉取用户列表（排除自己），没有降级逻辑
    pub async fn fetch_users(&self) -> Result<Vec<User>> {
        self.begin(LoadingKind::Users).await;
        let result = self.load_users().await;
        self.finish(LoadingKind::Users, result.as_ref().err()).await;
        result
    }

    async fn load_users(&self) -> Result<Vec<User>> {
        let me = self.current_user();
        let users: Vec<User> = match self.inner.api.list_users().await {
            Ok(users) => users.into_iter().filter(|u| u.id != me.id).collect(),
            Err(err) => {
                error!("[ChatSync] ❌ 用户列表拉取失败: {:#}", err);
                return Err(err);
            }
        };
        info!("[ChatSync] 用户列表拉取成功，共 {} 个", users.len());
        self.inner.state.lock().await.users = users.clone();
        Ok(users)
    }

    // ========== 消息 ==========

    /// 拉取指定会话的消息
    ///
    /// 会话 ID 为空时不做任何事。只有当该会话仍是当前选中会话时才写入存储，
    /// 否则只把结果返回给调用方。
    pub async fn fetch_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        if conversation_id.trim().is_empty() {
            debug!("[ChatSync] 会话ID为空，跳过消息拉取");
            return Ok(Vec::new());
        }

        let ticket = self.inner.state.lock().await.messages.ticket(conversation_id);
        self.begin(LoadingKind::Messages).await;
        let result = self.load_messages(conversation_id, ticket.as_ref()).await;
        self.finish(LoadingKind::Messages, result.as_ref().err()).await;
        result
    }

    /// 重新拉取当前选中会话的消息
    pub async fn refresh_messages(&self) -> Result<Vec<Message>> {
        let selected = self
            .inner
            .state
            .lock()
            .await
            .conversations
            .selected_id()
            .map(str::to_string);
        match selected {
            Some(id) => self.fetch_messages(&id).await,
            None => Ok(Vec::new()),
        }
    }

    async fn load_messages(
        &self,
        conversation_id: &str,
        ticket: Option<&FetchTicket>,
    ) -> Result<Vec<Message>> {
        match self.inner.api.list_messages(conversation_id).await {
            Ok(list) => {
                debug!(
                    "[ChatSync] 消息拉取成功，会话ID: {}, 共 {} 条",
                    conversation_id,
                    list.len()
                );
                self.apply_message_list(ticket, list.clone(), SyncMode::Live)
                    .await;
                Ok(list)
            }
            Err(err) => match mode::resolve(&err) {
                Resolution::Degrade => {
                    warn!(
                        "[ChatSync] 消息接口未实现（404），使用本地数据，会话ID: {}",
                        conversation_id
                    );
                    let list =
                        synthetic::synthetic_messages(conversation_id, &self.current_user().id);
                    self.apply_message_list(ticket, list.clone(), SyncMode::Degraded)
                        .await;
                    Ok(list)
                }
                Resolution::Propagate => {
                    error!(
                        "[ChatSync] ❌ 消息拉取失败，会话ID: {}, 错误: {:#}",
                        conversation_id, err
                    );
                    let cleared = match ticket {
                        Some(ticket) => self.inner.state.lock().await.messages.clear(ticket),
                        None => false,
                    };
                    if cleared {
                        self.emit(vec![ChatEvent::MessageList(
                            conversation_id.to_string(),
                            Vec::new(),
                        )])
                        .await;
                    }
                    Err(err)
                }
            },
        }
    }

    async fn apply_message_list(
        &self,
        ticket: Option<&FetchTicket>,
        list: Vec<Message>,
        mode: SyncMode,
    ) {
        let event = {
            let mut state = self.inner.state.lock().await;
            state.record_mode(ChatResource::Messages, mode);
            match ticket {
                Some(ticket) if state.messages.replace(ticket, list.clone()) => Some(
                    ChatEvent::MessageList(ticket.conversation_id.clone(), list),
                ),
                Some(ticket) => {
                    debug!(
                        "[ChatSync] 会话已切换，丢弃过期的消息响应: {} (代数 {} ≠ {})",
                        ticket.conversation_id,
                        ticket.generation,
                        state.messages.generation()
                    );
                    None
                }
                None => {
                    debug!("[ChatSync] 非当前选中会话，消息不写入存储");
                    None
                }
            }
        };
        if let Some(event) = event {
            self.emit(vec![event]).await;
        }
    }

    /// 发送消息
    ///
    /// 内容去掉首尾空白后为空且没有附件时不发送，返回 `Ok(None)`。
    /// 失败时返回错误，调用方应保留输入框内容以便重试。
    pub async fn send_message(
        &self,
        conversation_id: &str,
        content: &str,
        attachments: Vec<OutgoingAttachment>,
    ) -> Result<Option<Message>> {
        let content = content.trim();
        if content.is_empty() && attachments.is_empty() {
            debug!("[ChatSync] 消息内容和附件都为空，不发送");
            return Ok(None);
        }

        self.begin(LoadingKind::Sending).await;
        let result = self
            .deliver_message(conversation_id, content, &attachments)
            .await;
        self.finish(LoadingKind::Sending, result.as_ref().err()).await;
        result.map(Some)
    }

    async fn deliver_message(
        &self,
        conversation_id: &str,
        content: &str,
        attachments: &[OutgoingAttachment],
    ) -> Result<Message> {
        match self
            .inner
            .api
            .send_message(conversation_id, content, attachments)
            .await
        {
            Ok(msg) => {
                info!("[ChatSync] 📤 消息发送成功: {}", msg.id);
                Ok(self
                    .apply_sent_message(conversation_id, msg, SyncMode::Live)
                    .await)
            }
            Err(err) => match mode::resolve(&err) {
                Resolution::Degrade => {
                    warn!("[ChatSync] 发送接口未实现（404），本地合成消息");
                    let msg = synthetic::synthetic_message(
                        conversation_id,
                        &self.current_user().id,
                        content,
                        attachments,
                        Utc::now(),
                    );
                    Ok(self
                        .apply_sent_message(conversation_id, msg, SyncMode::Degraded)
                        .await)
                }
                Resolution::Propagate => {
                    error!("[ChatSync] ❌ 消息发送失败: {:#}", err);
                    Err(err)
                }
            },
        }
    }

    /// 追加到消息列表（仅当仍在该会话时）并更新会话的最新消息
    async fn apply_sent_message(
        &self,
        conversation_id: &str,
        msg: Message,
        mode: SyncMode,
    ) -> Message {
        let mut events = Vec::new();
        {
            let mut state = self.inner.state.lock().await;
            state.record_mode(ChatResource::Send, mode);
            if state.messages.conversation_id() == Some(conversation_id) {
                if state.messages.append(msg.clone()) {
                    events.push(ChatEvent::NewMessage(msg.clone()));
                }
            } else {
                debug!(
                    "[ChatSync] 已离开会话 {}，新消息只更新会话摘要",
                    conversation_id
                );
            }
            if state.conversations.apply_last_message(conversation_id, &msg) {
                Self::push_conversation_events(&mut state, &mut events);
            }
        }
        self.emit(events).await;
        msg
    }

    // ========== 轮询 ==========

    async fn start_conversation_poller(&self) {
        let weak = Arc::downgrade(&self.inner);
        let period = self.inner.config.conversation_poll_interval;
        let task = PollTask::spawn("会话列表", period, move || {
            let weak = weak.clone();
            async move {
                match Self::upgrade(&weak) {
                    Some(client) => client.poll_conversations_once().await,
                    None => TickControl::Stop,
                }
            }
        });
        self.inner.pollers.lock().await.conversation = Some(task);
    }

    fn spawn_message_poller(&self, conversation_id: &str) -> PollTask {
        let weak = Arc::downgrade(&self.inner);
        let period = self.inner.config.message_poll_interval;
        let target = conversation_id.to_string();
        PollTask::spawn("消息", period, move || {
            let weak = weak.clone();
            let target = target.clone();
            async move {
                match Self::upgrade(&weak) {
                    Some(client) => client.poll_messages_once(&target).await,
                    None => TickControl::Stop,
                }
            }
        })
    }

    /// 调用方须已持有 state 锁
    fn stop_message_poller(pollers: &mut Pollers) {
        if let Some((id, task)) = pollers.message.take() {
            debug!("[Poller] 停止{}轮询，会话: {}", task.name(), id);
            task.cancel();
        }
    }

    fn upgrade(weak: &Weak<ClientInner>) -> Option<ChatClient> {
        weak.upgrade().map(|inner| ChatClient { inner })
    }

    /// 会话列表轮询一次：成功整体替换，404 忽略，其他错误只记日志
    async fn poll_conversations_once(&self) -> TickControl {
        match self.inner.api.list_conversations().await {
            Ok(list) => {
                debug!("[Poller] 会话列表轮询返回 {} 个", list.len());
                self.apply_conversation_list(list, SyncMode::Live).await;
            }
            Err(err) if mode::resolve(&err) == Resolution::Degrade => {
                debug!("[Poller] 会话列表接口未实现，本次轮询跳过");
            }
            Err(err) => {
                warn!("[Poller] 会话列表轮询失败（忽略）: {:#}", err);
            }
        }
        TickControl::Continue
    }

    /// 消息轮询一次：只有条数增加时才替换
    async fn poll_messages_once(&self, conversation_id: &str) -> TickControl {
        let Some(ticket) = self.inner.state.lock().await.messages.ticket(conversation_id) else {
            debug!(
                "[Poller] 会话 {} 已不是当前会话，停止消息轮询",
                conversation_id
            );
            return TickControl::Stop;
        };

        match self.inner.api.list_messages(conversation_id).await {
            Ok(list) => {
                let count = list.len();
                let applied = self
                    .inner
                    .state
                    .lock()
                    .await
                    .messages
                    .replace_if_grown(&ticket, list.clone());
                if applied {
                    debug!("[Poller] 会话 {} 有新消息，共 {} 条", conversation_id, count);
                    self.emit(vec![ChatEvent::MessageList(
                        conversation_id.to_string(),
                        list,
                    )])
                    .await;
                }
            }
            Err(err) if mode::resolve(&err) == Resolution::Degrade => {
                debug!("[Poller] 消息接口未实现，本次轮询跳过");
            }
            Err(err) => {
                warn!(
                    "[Poller] 消息轮询失败（忽略），会话ID: {}, 错误: {:#}",
                    conversation_id, err
                );
            }
        }
        TickControl::Continue
    }

    // ========== 内部工具 ==========

    async fn begin(&self, kind: LoadingKind) {
        let mut state = self.inner.state.lock().await;
        state.begin_loading(kind);
        state.sync.error = None;
    }

    /// 每个出口都会经过这里，同类请求全部结束后加载标记才复位
    async fn finish(&self, kind: LoadingKind, err: Option<&anyhow::Error>) {
        let mut state = self.inner.state.lock().await;
        state.end_loading(kind);
        if let Some(err) = err {
            state.sync.error = Some(format!("{:#}", err));
        }
    }

    async fn record_error(&self, err: &anyhow::Error) {
        self.inner.state.lock().await.sync.error = Some(format!("{:#}", err));
    }

    fn push_conversation_events(state: &mut ChatState, events: &mut Vec<ChatEvent>) {
        events.push(ChatEvent::ConversationList(
            state.conversations.list().to_vec(),
        ));
        if let Some(total) = state.take_unread_change() {
            events.push(ChatEvent::TotalUnread(total));
        }
    }

    async fn emit(&self, events: Vec<ChatEvent>) {
        let conversations = &self.inner.conversation_listener;
        let messages = &self.inner.message_listener;
        for event in events {
            match event {
                ChatEvent::ConversationList(list) => {
                    conversations.on_conversation_list_changed(list).await
                }
                ChatEvent::Selected(selected) => {
                    conversations.on_selected_conversation_changed(selected).await
                }
                ChatEvent::TotalUnread(total) => {
                    conversations.on_total_unread_count_changed(total).await
                }
                ChatEvent::MessageList(id, list) => {
                    messages.on_message_list_changed(id, list).await
                }
                ChatEvent::NewMessage(msg) => messages.on_new_message(msg).await,
            }
        }
    }
}
