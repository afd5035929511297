//! 统一响应信封
//! `{success, message?, data?, error?}`

use serde::Serialize;

use crate::error::ErrorDetail;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应（带数据）
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            error: None,
        }
    }

    /// 失败响应
    pub fn failure(message: impl Into<String>, error: ErrorDetail) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            error: Some(error),
        }
    }
}

impl ApiResponse<()> {
    /// 成功响应（仅消息）
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_only_envelope_omits_data() {
        let value = serde_json::to_value(ApiResponse::message("ok")).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["message"], "ok");
        assert!(value.get("data").is_none());
        assert!(value.get("error").is_none());
    }
}
