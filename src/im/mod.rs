pub mod client;
pub mod conversation;
pub mod error;
pub mod identity;
pub mod message;
pub mod mode;
pub mod poller;
pub mod serialization;
pub mod state;
pub mod synthetic;
pub mod transport;
pub mod types;
pub mod user;

#[cfg(test)]
pub(crate) mod testing;

// 重新导出同步引擎相关类型
pub use client::{ChatClient, ClientConfig};
pub use error::ChatError;
pub use identity::{CurrentUser, IdentityProvider, StaticIdentity};
pub use mode::{ChatResource, SyncMode};
pub use state::{ChatSnapshot, LoadingFlags, SyncState};
pub use transport::{ChatApi, HttpChatApi};
