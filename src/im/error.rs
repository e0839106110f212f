//! 聊天同步错误类型
//!
//! 所有 API 调用返回 `anyhow::Result`，具体失败原因以 [`ChatError`] 的形式
//! 包装在 `anyhow::Error` 中，上层通过 `downcast_ref` 判断是否为 404。

use thiserror::Error;

/// 传输层失败分类
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// 非 2xx 响应，携带 HTTP 状态码
    #[error("HTTP 错误 {status}: {body}")]
    Http {
        /// HTTP 状态码
        status: u16,
        /// 原始响应内容
        body: String,
    },

    /// 请求未能发出或响应读取失败
    #[error("网络错误: {0}")]
    Network(String),

    /// 响应不是预期的 JSON 结构
    #[error("反序列化响应失败: {0}")]
    Decode(String),

    /// 响应包装中的业务错误码
    #[error("服务器错误 {code}: {message}")]
    Server {
        /// 错误码
        code: i32,
        /// 错误信息
        message: String,
    },
}

impl ChatError {
    /// 接口尚未实现（HTTP 404），触发本次调用的降级逻辑
    pub fn is_route_not_implemented(&self) -> bool {
        matches!(self, ChatError::Http { status: 404, .. })
    }

    /// HTTP 状态码（仅 `Http` 变体有）
    pub fn status(&self) -> Option<u16> {
        match self {
            ChatError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ChatError::Decode(err.to_string())
        } else {
            ChatError::Network(err.to_string())
        }
    }
}

/// 判断任意错误是否为 404
pub fn is_route_not_implemented(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ChatError>()
        .map(ChatError::is_route_not_implemented)
        .unwrap_or(false)
}
