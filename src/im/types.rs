use crate::im::error::ChatError;
use serde::Deserialize;
use tracing::{debug, error};

/// 统一的 API 响应结构
///
/// 服务器可能直接返回数据本身，也可能包一层 `{ data, errCode, errMsg }`。
/// 先尝试包装格式（要求存在 data 字段），失败再按裸数据解析。
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ApiResponse<T> {
    /// 带包装的响应
    Wrapped {
        data: T,
        #[serde(rename = "errCode", default)]
        err_code: i32,
        #[serde(rename = "errMsg", default)]
        err_msg: String,
    },
    /// 裸数据
    Bare(T),
}

impl<T> ApiResponse<T> {
    /// 取出数据，包装中的错误码非 0 时返回服务器错误
    pub fn into_data(self) -> Result<T, ChatError> {
        match self {
            ApiResponse::Wrapped {
                data,
                err_code,
                err_msg,
            } => {
                if err_code != 0 {
                    return Err(ChatError::Server {
                        code: err_code,
                        message: err_msg,
                    });
                }
                Ok(data)
            }
            ApiResponse::Bare(data) => Ok(data),
        }
    }
}

/// 通用 HTTP 响应处理函数：校验状态码并反序列化为业务结构体
///
/// 非 2xx 时返回 [`ChatError::Http`]，调用方据此区分 404 降级和普通错误
pub async fn handle_http_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    operation_name: &str,
) -> anyhow::Result<T> {
    let status = response.status();

    // 读取 body bytes（只能读取一次）
    let body_bytes = response.bytes().await.map_err(ChatError::from)?;
    let body_str = String::from_utf8_lossy(&body_bytes);
    debug!("[HTTP] {}响应 Body: {}", operation_name, body_str);

    if !status.is_success() {
        error!(
            "[HTTP] {}请求失败，HTTP状态: {}, 响应: {}",
            operation_name, status, body_str
        );
        return Err(ChatError::Http {
            status: status.as_u16(),
            body: body_str.into_owned(),
        }
        .into());
    }
    debug!("[HTTP] {}请求成功，HTTP状态: {}", operation_name, status);

    let api_resp: ApiResponse<T> = serde_json::from_slice(&body_bytes).map_err(|e| {
        error!(
            "[HTTP] {}反序列化失败: {:?}\n原始响应: {}",
            operation_name, e, body_str
        );
        ChatError::Decode(e.to_string())
    })?;

    let data = api_resp.into_data().map_err(|e| {
        error!("[HTTP] {}服务器错误: {}", operation_name, e);
        e
    })?;

    Ok(data)
}

/// 只校验状态码，忽略响应内容
pub async fn ensure_success(
    response: reqwest::Response,
    operation_name: &str,
) -> anyhow::Result<()> {
    let status = response.status();
    if status.is_success() {
        debug!("[HTTP] {}请求成功，HTTP状态: {}", operation_name, status);
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    error!(
        "[HTTP] {}请求失败，HTTP状态: {}, 响应: {}",
        operation_name, status, body
    );
    Err(ChatError::Http {
        status: status.as_u16(),
        body,
    }
    .into())
}
