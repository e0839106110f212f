pub mod im;

// 重新导出常用类型，方便外部使用
pub use im::{
    client::{ChatClient, ClientConfig},
    conversation::{Conversation, ConversationListener, EmptyConversationListener, Participant},
    error::ChatError,
    identity::{CurrentUser, IdentityProvider, StaticIdentity},
    message::{Attachment, EmptyMessageListener, Message, MessageListener, OutgoingAttachment},
    mode::{ChatResource, SyncMode},
    state::{ChatSnapshot, LoadingFlags},
    transport::{ChatApi, HttpChatApi},
    user::User,
};
