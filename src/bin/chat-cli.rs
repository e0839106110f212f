//! 聊天同步 CLI 客户端（测试版）
//!
//! 非交互式 CLI，用于测试和展示同步引擎
//! 启动时通过命令行参数指定用户和 API 地址，拉取会话后进入轮询，只展示收到的变更

use anyhow::Result;
use chat_sync_core::im::client::{ChatClient, ClientConfig};
use chat_sync_core::im::conversation::listener::ConversationListener;
use chat_sync_core::im::conversation::models::Conversation;
use chat_sync_core::im::identity::{CurrentUser, StaticIdentity};
use chat_sync_core::im::message::listener::MessageListener;
use chat_sync_core::im::message::models::{Message, OutgoingAttachment};
use chat_sync_core::im::mode::ChatResource;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

/// 聊天同步 CLI 客户端
#[derive(Parser, Debug)]
#[command(name = "chat-cli")]
#[command(about = "聊天同步 CLI 客户端 - 用于测试和展示会话/消息同步", long_about = None)]
struct Args {
    /// API 基础地址
    #[arg(long, default_value = "http://localhost:8000/api")]
    api_base_url: String,

    /// 认证 token（为空时不带认证头）
    #[arg(long, default_value = "")]
    token: String,

    /// 当前用户 ID
    #[arg(short, long, default_value = "1")]
    user_id: String,

    /// 当前用户名称
    #[arg(long, default_value = "CLI User")]
    user_name: String,

    /// 启动后选中的会话 ID
    #[arg(short, long)]
    conversation: Option<String>,

    /// 启动后打开与该用户的会话（查找或创建）
    #[arg(long)]
    peer: Option<String>,

    /// 选中会话后发送的文本
    #[arg(long)]
    send: Option<String>,

    /// 随消息发送的附件文件
    #[arg(long)]
    attach: Vec<PathBuf>,

    /// 运行时长（秒），0 表示持续运行
    #[arg(short, long, default_value = "0")]
    duration: u64,

    /// 日志级别（默认: info,chat_sync_core=debug）
    #[arg(long, default_value = "info,chat_sync_core=debug")]
    log_level: String,
}

/// 初始化日志（同时输出到 stdout 和文件）
fn init_logger(log_level: &str) -> Result<()> {
    use std::fs::OpenOptions;
    use std::io;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    // 优先使用环境变量 RUST_LOG（如果设置了），否则使用命令行参数
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    // 创建日志文件（追加模式）
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .map_err(|e| anyhow::anyhow!("无法创建日志文件 debug.log: {}", e))?;

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(true);

    // 文件不需要颜色
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    info!("[CLI] 📝 日志已同时输出到控制台和文件: debug.log");
    Ok(())
}

struct CliConversationListener;

#[async_trait::async_trait]
impl ConversationListener for CliConversationListener {
    async fn on_conversation_list_changed(&self, conversations: Vec<Conversation>) {
        info!("[CLI/Conversation] 🔄 会话列表变更，共 {} 个", conversations.len());
    }

    async fn on_selected_conversation_changed(&self, conversation: Option<Conversation>) {
        match conversation {
            Some(conv) => info!(
                "[CLI/Conversation] 👉 选中会话: {} | 未读: {}",
                conv.id, conv.unread_count
            ),
            None => info!("[CLI/Conversation] 👉 取消选中"),
        }
    }

    async fn on_total_unread_count_changed(&self, total_unread_count: u32) {
        info!("[CLI/Conversation] 📬 总未读数: {}", total_unread_count);
    }
}

struct CliMessageListener;

#[async_trait::async_trait]
impl MessageListener for CliMessageListener {
    async fn on_message_list_changed(&self, conversation_id: String, messages: Vec<Message>) {
        info!(
            "[CLI/Message] 📨 会话 {} 消息列表更新，共 {} 条",
            conversation_id,
            messages.len()
        );
        if let Some(last) = messages.last() {
            info!("[CLI/Message]   最新: {} | {}", last.sender_id, preview(&last.content));
        }
    }

    async fn on_new_message(&self, message: Message) {
        info!(
            "[CLI/Message] 📤 新消息: {} | 附件: {}",
            preview(&message.content),
            message.attachments.len()
        );
    }
}

fn preview(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(30).collect();
    if chars.next().is_some() {
        format!("{}…", head)
    } else {
        head
    }
}

fn read_attachments(paths: &[PathBuf]) -> Result<Vec<OutgoingAttachment>> {
    paths
        .iter()
        .map(|path| {
            let data = std::fs::read(path)
                .map_err(|e| anyhow::anyhow!("读取附件失败 {}: {}", path.display(), e))?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "attachment".to_string());
            Ok(OutgoingAttachment::new(filename, data))
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logger(&args.log_level)?;

    info!("[CLI] 🚀 聊天同步 CLI 客户端（测试模式）");
    info!("[CLI] 👤 用户: {} ({})", args.user_name, args.user_id);
    info!("[CLI] 🌐 API: {}", args.api_base_url);
    info!("[CLI] ⏱️  运行时长: {} 秒（0=持续运行）", args.duration);

    let config = ClientConfig::new(args.api_base_url.clone(), args.token.clone());
    let identity = Arc::new(StaticIdentity::new(CurrentUser::new(
        args.user_id.clone(),
        args.user_name.clone(),
    )));
    let client = ChatClient::connect(
        config,
        identity,
        Arc::new(CliConversationListener),
        Arc::new(CliMessageListener),
    )?;

    // 启动会话轮询并拉取一次会话列表
    match client.start().await {
        Ok(conversations) => {
            info!("[CLI] 📋 会话列表（共 {} 个）:", conversations.len());
            for conv in conversations.iter().take(5) {
                let latest = conv
                    .last_message
                    .as_ref()
                    .map(|m| preview(&m.content))
                    .unwrap_or_default();
                let peer = conv
                    .peer(&args.user_id)
                    .map(|p| p.name.as_str())
                    .unwrap_or("-");
                info!(
                    "[CLI]   - {} | {} | 未读: {} | 最新: {}",
                    conv.id, peer, conv.unread_count, latest
                );
            }
        }
        Err(e) => error!("[CLI] ❌ 会话列表拉取失败: {:#}", e),
    }

    match client.fetch_users().await {
        Ok(users) => info!("[CLI] 👥 用户列表（共 {} 个）", users.len()),
        Err(e) => warn!("[CLI] 用户列表拉取失败: {:#}", e),
    }

    // 选中会话
    let selected = if let Some(peer_id) = &args.peer {
        let peer = client
            .users()
            .await
            .into_iter()
            .find(|u| &u.id == peer_id);
        match peer {
            Some(user) => client.select_user(&user).await.map(Some),
            None => match client.get_or_create_conversation(peer_id).await {
                Ok(conv) => client
                    .select_conversation(Some(conv.clone()))
                    .await
                    .map(|_| Some(conv)),
                Err(e) => Err(e),
            },
        }
    } else if let Some(conversation_id) = &args.conversation {
        let conv = client
            .conversations()
            .await
            .into_iter()
            .find(|c| &c.id == conversation_id);
        match conv {
            Some(conv) => client
                .select_conversation(Some(conv.clone()))
                .await
                .map(|_| Some(conv)),
            None => {
                warn!("[CLI] 会话 {} 不在列表中", conversation_id);
                Ok(None)
            }
        }
    } else {
        Ok(None)
    };

    let selected = match selected {
        Ok(selected) => selected,
        Err(e) => {
            error!("[CLI] ❌ 打开会话失败: {:#}", e);
            None
        }
    };

    if let (Some(conv), Some(text)) = (&selected, &args.send) {
        let attachments = read_attachments(&args.attach)?;
        match client.send_message(&conv.id, text, attachments).await {
            Ok(Some(msg)) => info!("[CLI] ✅ 已发送: {}", msg.id),
            Ok(None) => warn!("[CLI] 内容为空，未发送"),
            Err(e) => error!("[CLI] ❌ 发送失败: {:#}", e),
        }
    }

    for resource in ChatResource::ALL {
        info!("[CLI] 🔌 {}: {:?}", resource, client.mode(resource).await);
    }

    info!("[CLI] 📥 开始轮询...");
    if args.duration > 0 {
        info!("[CLI] ⏰ {} 秒后自动退出", args.duration);
        sleep(Duration::from_secs(args.duration)).await;
    } else {
        info!("[CLI] ⏰ 持续运行中，按 Ctrl+C 退出");
        tokio::signal::ctrl_c().await?;
    }

    client.shutdown().await;
    info!("[CLI] 👋 程序退出");
    Ok(())
}
