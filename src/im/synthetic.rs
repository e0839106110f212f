//! 本地合成数据
//!
//! 远端接口返回 404 时使用的固定数据：一组固定会话，以及按会话 ID 确定的固定消息序列。
//! 同样的输入总是得到同样的输出（本地新建会话/消息的 ID 除外）。

use crate::im::conversation::models::{Conversation, MessagePreview, Participant};
use crate::im::identity::CurrentUser;
use crate::im::message::models::{Attachment, Message, OutgoingAttachment};
use crate::im::serialization::{format_size_label, generate_local_id};
use chrono::{DateTime, Duration, Utc};

/// 合成数据的时间基准：2024-01-15T09:00:00Z
const BASE_TIMESTAMP: i64 = 1_705_309_200;

/// 本地会话 ID 前缀
pub const LOCAL_CONVERSATION_PREFIX: &str = "local-conv";
/// 本地消息 ID 前缀
pub const LOCAL_MESSAGE_PREFIX: &str = "local-msg";

/// 固定的对方用户：(ID, 名称)
const DEMO_PEERS: [(&str, &str); 3] = [
    ("demo-user-1", "Dr. Sarah Chen"),
    ("demo-user-2", "Marcus Webb"),
    ("demo-user-3", "Priya Nair"),
];

/// 每个会话的未读数
const DEMO_UNREAD: [u32; 3] = [2, 0, 1];

/// 消息模板，`true` 表示由对方发送
const THREAD_TEMPLATES: [&[(bool, &str)]; 3] = [
    &[
        (true, "Hi! Did the new stock of amoxicillin arrive?"),
        (false, "Yes, it came in this morning."),
        (true, "Great, can you reserve two boxes for me?"),
        (true, "I'll pick them up this afternoon."),
    ],
    &[
        (false, "The quarterly inventory report is ready."),
        (true, "Thanks, I'll review it today."),
        (false, "Let me know if anything looks off."),
    ],
    &[
        (true, "Is the follow-up with the new lead still on for Friday?"),
        (false, "Yes, 10am at their office."),
        (true, "Perfect, I'll bring the product samples."),
    ],
];

fn base_time() -> DateTime<Utc> {
    DateTime::from_timestamp(BASE_TIMESTAMP, 0).unwrap_or_default()
}

/// 固定的会话目录（当前用户 + 一个固定对方）
pub fn synthetic_conversations(me: &CurrentUser) -> Vec<Conversation> {
    DEMO_PEERS
        .iter()
        .enumerate()
        .map(|(idx, (peer_id, peer_name))| {
            let id = format!("demo-conv-{}", idx + 1);
            let messages = synthetic_messages(&id, &me.id);
            let created_at = base_time() + Duration::days(idx as i64);
            let updated_at = messages
                .last()
                .map(|m| m.created_at)
                .unwrap_or(created_at);
            Conversation {
                participants: vec![
                    me.as_participant(),
                    Participant {
                        id: peer_id.to_string(),
                        name: peer_name.to_string(),
                        avatar_url: None,
                    },
                ],
                last_message: messages.last().map(MessagePreview::from),
                unread_count: DEMO_UNREAD[idx],
                updated_at,
                created_at,
                id,
            }
        })
        .collect()
}

/// 按会话 ID 选择模板（字节和取模，跨进程稳定）
fn template_for(conversation_id: &str) -> &'static [(bool, &'static str)] {
    if let Some(n) = conversation_id
        .strip_prefix("demo-conv-")
        .and_then(|s| s.parse::<usize>().ok())
    {
        if (1..=THREAD_TEMPLATES.len()).contains(&n) {
            return THREAD_TEMPLATES[n - 1];
        }
    }
    let sum: usize = conversation_id.bytes().map(usize::from).sum();
    THREAD_TEMPLATES[sum % THREAD_TEMPLATES.len()]
}

/// 某个会话的固定消息序列
///
/// 对方发送的消息，发送者 ID 取 demo 会话对应的固定用户；其他会话统一为 `demo-peer`。
pub fn synthetic_messages(conversation_id: &str, self_id: &str) -> Vec<Message> {
    let peer_id = conversation_id
        .strip_prefix("demo-conv-")
        .and_then(|s| s.parse::<usize>().ok())
        .and_then(|n| n.checked_sub(1))
        .and_then(|idx| DEMO_PEERS.get(idx))
        .map(|(id, _)| id.to_string())
        .unwrap_or_else(|| "demo-peer".to_string());

    let start = base_time() + Duration::hours(1);
    template_for(conversation_id)
        .iter()
        .enumerate()
        .map(|(idx, (from_peer, content))| {
            let created_at = start + Duration::minutes(5 * idx as i64);
            Message {
                id: format!("{}-msg-{}", conversation_id, idx + 1),
                content: content.to_string(),
                sender_id: if *from_peer {
                    peer_id.clone()
                } else {
                    self_id.to_string()
                },
                conversation_id: conversation_id.to_string(),
                attachments: Vec::new(),
                created_at,
                updated_at: created_at,
            }
        })
        .collect()
}

/// 本地合成与指定用户的单聊会话
pub fn synthetic_conversation(
    me: &CurrentUser,
    peer: Participant,
    now: DateTime<Utc>,
) -> Conversation {
    Conversation {
        id: generate_local_id(LOCAL_CONVERSATION_PREFIX),
        participants: vec![me.as_participant(), peer],
        last_message: None,
        unread_count: 0,
        updated_at: now,
        created_at: now,
    }
}

/// 对方用户未知时的占位参与者
pub fn placeholder_participant(user_id: &str) -> Participant {
    Participant {
        id: user_id.to_string(),
        name: format!("User {}", user_id),
        avatar_url: None,
    }
}

/// 本地合成一条已发送的消息，附件地址为本地临时引用
pub fn synthetic_message(
    conversation_id: &str,
    sender_id: &str,
    content: &str,
    attachments: &[OutgoingAttachment],
    now: DateTime<Utc>,
) -> Message {
    let id = generate_local_id(LOCAL_MESSAGE_PREFIX);
    let attachments = attachments
        .iter()
        .map(|a| {
            let attachment_id = generate_local_id("local-file");
            Attachment {
                url: format!("blob:local/{}/{}", attachment_id, a.filename),
                id: attachment_id,
                filename: a.filename.clone(),
                size_label: format_size_label(a.size()),
            }
        })
        .collect();

    Message {
        id,
        content: content.to_string(),
        sender_id: sender_id.to_string(),
        conversation_id: conversation_id.to_string(),
        attachments,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn me() -> CurrentUser {
        CurrentUser::new("me", "Me")
    }

    #[test]
    fn catalogue_is_deterministic() {
        let a = synthetic_conversations(&me());
        let b = synthetic_conversations(&me());
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
        assert_eq!(
            a.iter().map(|c| c.unread_count).collect::<Vec<_>>(),
            vec![2, 0, 1]
        );
        for conv in &a {
            assert!(conv.has_participant("me"));
            assert_eq!(conv.participants.len(), 2);
            let preview = conv.last_message.as_ref().unwrap();
            let thread = synthetic_messages(&conv.id, "me");
            assert_eq!(Some(&preview.content), thread.last().map(|m| &m.content));
        }
    }

    #[test]
    fn messages_belong_to_conversation() {
        let thread = synthetic_messages("demo-conv-1", "me");
        assert_eq!(thread.len(), 4);
        assert!(thread.iter().all(|m| m.conversation_id == "demo-conv-1"));
        assert_eq!(thread[0].sender_id, "demo-user-1");
        assert_eq!(thread[1].sender_id, "me");
        assert!(thread.windows(2).all(|w| w[0].created_at < w[1].created_at));

        let other = synthetic_messages("local-conv-abc", "me");
        assert_eq!(other, synthetic_messages("local-conv-abc", "me"));
        assert!(other.iter().all(|m| m.conversation_id == "local-conv-abc"));
    }

    #[test]
    fn synthetic_message_keeps_attachment_order() {
        let files = vec![
            OutgoingAttachment::new("first.png", vec![0u8; 2048]),
            OutgoingAttachment::new("second.pdf", vec![0u8; 10]),
        ];
        let msg = synthetic_message("c1", "me", "look", &files, Utc::now());
        assert!(msg.id.starts_with(LOCAL_MESSAGE_PREFIX));
        assert_eq!(msg.attachments.len(), 2);
        assert_eq!(msg.attachments[0].filename, "first.png");
        assert_eq!(msg.attachments[0].size_label, "2.0 KB");
        assert_eq!(msg.attachments[1].filename, "second.pdf");
        assert!(msg.attachments.iter().all(|a| a.url.starts_with("blob:")));
    }

    #[test]
    fn synthetic_conversation_has_self_and_peer() {
        let now = Utc::now();
        let conv = synthetic_conversation(&me(), placeholder_participant("42"), now);
        assert!(conv.id.starts_with(LOCAL_CONVERSATION_PREFIX));
        assert_eq!(conv.participants[0].id, "me");
        assert_eq!(conv.participants[1].id, "42");
        assert_eq!(conv.participants[1].name, "User 42");
        assert_eq!(conv.unread_count, 0);
        assert_eq!(conv.created_at, now);
    }
}
