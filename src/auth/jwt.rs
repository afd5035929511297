//! JWT access token generation and validation
//! 每个用户保留一条持久化会话，令牌必须与会话记录一致才有效

use crate::{
    config::AppConfig,
    error::{AppError, Result},
    models::{AccessDetails, AccessTokenDetails, TokenMetadata},
    repository::SessionRepository,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// JWT claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    /// 用户 ID
    #[serde(default)]
    pub user_id: Option<String>,

    /// 会话 ID
    #[serde(default)]
    pub access_uuid: Option<String>,

    /// Expiration
    pub exp: i64,

    #[serde(default)]
    pub authorized: bool,
}

/// 令牌校验失败原因
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("signature invalid")]
    SignatureInvalid,

    #[error("token expired")]
    Expired,

    #[error("malformed token")]
    Malformed,

    #[error("token validation failed: {0}")]
    Other(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName => TokenError::SignatureInvalid,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_)
            | ErrorKind::MissingRequiredClaim(_) => TokenError::Malformed,
            _ => TokenError::Other(e.to_string()),
        }
    }
}

/// 访问令牌管理：签发、持久化、校验、吊销
pub struct AccessTokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validity: Duration,
    sessions: Arc<dyn SessionRepository>,
}

impl AccessTokenManager {
    pub fn new(secret: &str, validity: Duration, sessions: Arc<dyn SessionRepository>) -> Result<Self> {
        // HS256 至少 32 字节密钥
        if secret.len() < 32 {
            return Err(AppError::Config("JWT secret too short (min 32 chars)".to_string()));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validity,
            sessions,
        })
    }

    /// Create manager from config
    pub fn from_config(config: &AppConfig, sessions: Arc<dyn SessionRepository>) -> Result<Self> {
        Self::new(
            config.security.jwt_secret.expose_secret(),
            Duration::seconds(config.security.access_token_exp_secs as i64),
            sessions,
        )
    }

    /// 替换有效期，测试中用于签发已过期的令牌
    pub fn with_validity(mut self, validity: Duration) -> Self {
        self.validity = validity;
        self
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// 签发访问令牌
    pub fn issue(&self, user_id: Uuid) -> Result<AccessTokenDetails> {
        let access_uuid = Uuid::new_v4();
        let at_expires = (Utc::now() + self.validity).timestamp();

        let claims = AccessClaims {
            user_id: Some(user_id.to_string()),
            access_uuid: Some(access_uuid.to_string()),
            exp: at_expires,
            authorized: true,
        };

        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| {
                tracing::error!("Failed to encode access token: {:?}", e);
                AppError::Signing(e.to_string())
            })?;

        if access_token.is_empty() {
            return Err(AppError::Signing("empty token produced".to_string()));
        }

        Ok(AccessTokenDetails {
            access_token,
            access_uuid,
            at_expires,
        })
    }

    /// 持久化会话，覆盖该用户之前的会话
    pub async fn persist(&self, user_id: Uuid, details: &AccessTokenDetails) -> Result<()> {
        let expire_at = DateTime::<Utc>::from_timestamp(details.at_expires, 0)
            .ok_or_else(|| AppError::Internal("token expiry out of range".to_string()))?;

        self.sessions
            .replace_for_user(AccessDetails {
                id: Uuid::new_v4(),
                access_uuid: details.access_uuid,
                user_id,
                expire_at,
            })
            .await
    }

    /// 吊销会话（登出），不存在时不报错
    pub async fn revoke(&self, access_uuid: Uuid) -> Result<()> {
        let removed = self.sessions.delete_by_access_uuid(access_uuid).await?;
        tracing::debug!(access_uuid = %access_uuid, removed, "Session revoked");
        Ok(())
    }

    /// 校验签名与过期时间
    pub fn validate(&self, token: &str) -> std::result::Result<AccessClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(TokenError::from)
    }

    /// 从声明中提取会话元数据
    pub fn extract_metadata(&self, claims: &AccessClaims) -> std::result::Result<TokenMetadata, TokenError> {
        let access_uuid = claims
            .access_uuid
            .as_deref()
            .filter(|s| !s.is_empty())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or(TokenError::Malformed)?;

        let user_id = claims
            .user_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or(TokenError::Malformed)?;

        Ok(TokenMetadata { access_uuid, user_id })
    }

    /// 查找持久化会话
    pub async fn find_persisted(&self, access_uuid: Uuid) -> Result<AccessDetails> {
        self.sessions
            .find_by_access_uuid(access_uuid)
            .await?
            .ok_or_else(|| AppError::not_found("session not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;

    const SECRET: &str = "test-secret-key-at-least-32-characters-long";

    fn manager(secret: &str) -> AccessTokenManager {
        AccessTokenManager::new(secret, Duration::days(7), Arc::new(MemoryStore::new())).unwrap()
    }

    #[test]
    fn test_short_secret_rejected() {
        let result = AccessTokenManager::new("short", Duration::days(7), Arc::new(MemoryStore::new()));
        assert!(result.is_err());
    }

    #[test]
    fn test_issue_and_validate() {
        let manager = manager(SECRET);
        let user_id = Uuid::new_v4();
        let details = manager.issue(user_id).unwrap();

        let claims = manager.validate(&details.access_token).unwrap();
        assert!(claims.authorized);
        assert_eq!(claims.exp, details.at_expires);

        let meta = manager.extract_metadata(&claims).unwrap();
        assert_eq!(meta.user_id, user_id);
        assert_eq!(meta.access_uuid, details.access_uuid);
    }

    #[test]
    fn test_expiry_is_seven_days() {
        let manager = manager(SECRET);
        let details = manager.issue(Uuid::new_v4()).unwrap();
        let expected = (Utc::now() + Duration::days(7)).timestamp();
        assert!((details.at_expires - expected).abs() <= 2);
    }

    #[test]
    fn test_wrong_secret_is_signature_invalid() {
        let issuer = manager(SECRET);
        let other = manager("another-secret-key-that-is-also-32-chars!!");
        let details = issuer.issue(Uuid::new_v4()).unwrap();

        assert_eq!(
            other.validate(&details.access_token).unwrap_err(),
            TokenError::SignatureInvalid
        );
    }

    #[test]
    fn test_expired_token() {
        let manager = manager(SECRET).with_validity(Duration::seconds(-60));
        let details = manager.issue(Uuid::new_v4()).unwrap();

        assert_eq!(manager.validate(&details.access_token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn test_garbage_is_malformed() {
        let manager = manager(SECRET);
        assert_eq!(manager.validate("not-a-jwt").unwrap_err(), TokenError::Malformed);
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let manager = manager(SECRET);
        let claims = AccessClaims {
            user_id: Some(Uuid::new_v4().to_string()),
            access_uuid: Some(Uuid::new_v4().to_string()),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
            authorized: true,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(manager.validate(&token).unwrap_err(), TokenError::SignatureInvalid);
    }

    #[test]
    fn test_metadata_requires_claims() {
        let manager = manager(SECRET);
        let claims = AccessClaims {
            user_id: Some("not-a-uuid".to_string()),
            access_uuid: Some(Uuid::new_v4().to_string()),
            exp: 0,
            authorized: true,
        };
        assert_eq!(manager.extract_metadata(&claims).unwrap_err(), TokenError::Malformed);

        let claims = AccessClaims {
            user_id: Some(Uuid::new_v4().to_string()),
            access_uuid: Some(String::new()),
            exp: 0,
            authorized: true,
        };
        assert_eq!(manager.extract_metadata(&claims).unwrap_err(), TokenError::Malformed);
    }

    #[tokio::test]
    async fn test_persist_replaces_previous_session() {
        let manager = manager(SECRET);
        let user_id = Uuid::new_v4();

        let d1 = manager.issue(user_id).unwrap();
        manager.persist(user_id, &d1).await.unwrap();
        let d2 = manager.issue(user_id).unwrap();
        manager.persist(user_id, &d2).await.unwrap();

        assert!(manager.find_persisted(d1.access_uuid).await.is_err());
        let stored = manager.find_persisted(d2.access_uuid).await.unwrap();
        assert_eq!(stored.user_id, user_id);
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let manager = manager(SECRET);
        let user_id = Uuid::new_v4();
        let details = manager.issue(user_id).unwrap();
        manager.persist(user_id, &details).await.unwrap();

        manager.revoke(details.access_uuid).await.unwrap();
        manager.revoke(details.access_uuid).await.unwrap();
        assert!(matches!(
            manager.find_persisted(details.access_uuid).await,
            Err(AppError::NotFound(_))
        ));
    }
}
