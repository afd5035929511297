//! 邮箱验证令牌
//! 用于注册确认和重置密码，只保存哈希值

use crate::{
    auth::password::PasswordHasher,
    config::SecurityConfig,
    error::{AppError, Result},
    models::VerificationToken,
    repository::VerificationTokenRepository,
};
use chrono::{Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use reqwest::Url;
use std::sync::Arc;
use uuid::Uuid;

/// 令牌字节数（256 位）
const TOKEN_BYTES: usize = 32;

/// 令牌用途，只决定有效期，不落库
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    SignUp,
    PasswordReset,
}

impl TokenPurpose {
    /// 邮件链接中的路径段
    pub fn link_path(&self) -> &'static str {
        match self {
            TokenPurpose::SignUp => "verify",
            TokenPurpose::PasswordReset => "verify-reset-token",
        }
    }
}

/// 生成原始令牌（十六进制）
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// 拼接验证链接：`<base>/<path>/<token>?email=<email>`
pub fn build_link(base_url: &str, path: &str, raw_token: &str, email: &str) -> Result<String> {
    let mut url = Url::parse(base_url)
        .map_err(|e| AppError::Config(format!("invalid base url {}: {}", base_url, e)))?;

    url.path_segments_mut()
        .map_err(|_| AppError::Config(format!("base url cannot be a base: {}", base_url)))?
        .pop_if_empty()
        .push(path)
        .push(raw_token);

    url.query_pairs_mut().clear().append_pair("email", email);

    Ok(url.to_string())
}

pub struct VerificationTokenManager {
    repo: Arc<dyn VerificationTokenRepository>,
    hasher: PasswordHasher,
    signup_ttl: Duration,
    reset_ttl: Duration,
}

impl VerificationTokenManager {
    pub fn new(
        repo: Arc<dyn VerificationTokenRepository>,
        hasher: PasswordHasher,
        signup_ttl: Duration,
        reset_ttl: Duration,
    ) -> Self {
        Self {
            repo,
            hasher,
            signup_ttl,
            reset_ttl,
        }
    }

    pub fn from_config(
        repo: Arc<dyn VerificationTokenRepository>,
        hasher: PasswordHasher,
        config: &SecurityConfig,
    ) -> Self {
        Self::new(
            repo,
            hasher,
            Duration::seconds(config.signup_token_ttl_secs as i64),
            Duration::seconds(config.reset_token_ttl_secs as i64),
        )
    }

    fn ttl(&self, purpose: TokenPurpose) -> Duration {
        match purpose {
            TokenPurpose::SignUp => self.signup_ttl,
            TokenPurpose::PasswordReset => self.reset_ttl,
        }
    }

    /// 哈希后保存令牌
    pub async fn issue_and_store(
        &self,
        email: &str,
        raw_token: &str,
        purpose: TokenPurpose,
    ) -> Result<()> {
        let token_hash = self.hasher.hash(raw_token)?;
        let now = Utc::now();

        self.repo
            .insert(VerificationToken {
                id: Uuid::new_v4(),
                email: email.to_string(),
                token_hash,
                expires_at: now + self.ttl(purpose),
                created_at: now,
            })
            .await?;

        tracing::debug!(email = %email, purpose = ?purpose, "Verification token stored");
        Ok(())
    }

    /// 校验该邮箱最新的令牌
    ///
    /// 没有令牌返回 `Ok(false)`；校验成功后令牌不会被删除，过期前可重复使用
    pub async fn validate(&self, email: &str, raw_token: &str) -> Result<bool> {
        let Some(stored) = self.repo.find_latest_by_email(email).await? else {
            tracing::debug!(email = %email, "No verification token on record");
            return Ok(false);
        };

        Ok(self.hasher.verify(raw_token, &stored.token_hash))
    }
}
