//! 统一错误模型
//! 定义所有错误类型和错误响应格式

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::models::response::ApiResponse;

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;

/// 认证网关拒绝原因
///
/// 每种原因都有独立且稳定的用户提示信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// 缺少 Authorization 头或格式错误
    MissingToken,
    /// 签名错误、会话不存在或用户不匹配
    InvalidToken,
    /// 令牌已过期
    TokenExpired,
    /// 令牌结构无法解析
    MalformedToken,
}

impl AuthRejection {
    pub fn message(&self) -> &'static str {
        match self {
            AuthRejection::MissingToken => "unauthorized: token is required",
            AuthRejection::InvalidToken => "unauthorized: invalid token",
            AuthRejection::TokenExpired => "unauthorized: token expired",
            AuthRejection::MalformedToken => "unauthorized: malformed token",
        }
    }
}

impl fmt::Display for AuthRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    Unauthenticated(AuthRejection),

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Token signing error: {0}")]
    Signing(String),

    #[error("Hashing error: {0}")]
    Hashing(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// 获取 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) | AppError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Database(_)
            | AppError::Config(_)
            | AppError::Signing(_)
            | AppError::Hashing(_)
            | AppError::Notification(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 获取用户友好的错误消息（不包含敏感信息）
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::Unauthenticated(reason) => reason.message().to_string(),
            AppError::InvalidCredentials => "invalid username or password".to_string(),
            AppError::Timeout(_) => "request timed out".to_string(),
            AppError::Notification(_) => "failed to send email".to_string(),
            AppError::Database(_) => "Database error occurred".to_string(),
            AppError::Config(_) => "Configuration error".to_string(),
            AppError::Signing(_) | AppError::Hashing(_) | AppError::Internal(_) => {
                "internal server error".to_string()
            }
        }
    }

    /// 获取错误码
    pub fn code(&self) -> u16 {
        self.status_code().as_u16()
    }

    pub fn not_found(msg: &str) -> Self {
        AppError::NotFound(msg.to_string())
    }

    pub fn forbidden(msg: &str) -> Self {
        AppError::Forbidden(msg.to_string())
    }

    pub fn validation(msg: &str) -> Self {
        AppError::Validation(msg.to_string())
    }

    pub fn conflict(msg: &str) -> Self {
        AppError::Conflict(msg.to_string())
    }
}

/// 错误详情
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: u16,
    pub message: String,
    pub request_id: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let request_id = uuid::Uuid::new_v4().to_string();
        let message = self.user_message();

        if status.is_server_error() {
            tracing::error!(
                code = self.code(),
                error = %self,
                request_id = %request_id,
                "Application error"
            );
        } else {
            tracing::debug!(
                code = self.code(),
                error = %self,
                request_id = %request_id,
                "Request rejected"
            );
        }

        let body = ApiResponse::<()>::failure(
            message.clone(),
            ErrorDetail {
                code: self.code(),
                message,
                request_id,
            },
        );

        (status, Json(body)).into_response()
    }
}

/// 从 config::ConfigError 转换
impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}
