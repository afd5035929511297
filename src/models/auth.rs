//! Authentication-related models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 签发结果：签名令牌 + 会话标识 + 过期时间
#[derive(Debug, Clone, Serialize)]
pub struct AccessTokenDetails {
    pub access_token: String,
    #[serde(skip_serializing)]
    pub access_uuid: Uuid,
    /// 过期时间（Unix 秒）
    pub at_expires: i64,
}

/// 持久化的会话记录，每个用户至多一条
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct AccessDetails {
    pub id: Uuid,
    pub access_uuid: Uuid,
    pub user_id: Uuid,
    pub expire_at: DateTime<Utc>,
}

/// 从令牌声明中提取的会话元数据
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenMetadata {
    pub access_uuid: Uuid,
    pub user_id: Uuid,
}

/// 验证令牌（只保存哈希值）
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VerificationToken {
    pub id: Uuid,
    pub email: String,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "invalid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: super::user::Account,
    pub token_details: AccessTokenDetails,
}

/// Forgot password request
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "invalid email"))]
    pub email: String,
}

/// Reset password request
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(email(message = "invalid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
    #[validate(length(min = 1, message = "token is required"))]
    pub token: String,
}

/// `GET /verify/{token}?email=`
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyQuery {
    #[validate(email(message = "invalid email"))]
    pub email: String,
}
