//! JWT 认证中间件

use crate::{
    auth::jwt::{AccessTokenManager, TokenError},
    error::{AppError, AuthRejection, Result},
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

/// 认证上下文（附加到请求扩展）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub access_uuid: Uuid,
}

// 实现 FromRequestParts 以便在 handler 中直接提取 AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .ok_or(AppError::Unauthenticated(AuthRejection::MissingToken))
    }
}

/// 从 Authorization 头提取令牌
///
/// 必须恰好是 `Bearer <token>` 两段
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_bearer)
}

fn parse_bearer(value: &str) -> Option<&str> {
    let mut parts = value.split(' ');
    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() || token.is_empty() || !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token)
}

fn reject(reason: AuthRejection) -> AppError {
    metrics::counter!("auth_rejections_total", "reason" => rejection_label(reason)).increment(1);
    AppError::Unauthenticated(reason)
}

fn rejection_label(reason: AuthRejection) -> &'static str {
    match reason {
        AuthRejection::MissingToken => "missing",
        AuthRejection::InvalidToken => "invalid",
        AuthRejection::TokenExpired => "expired",
        AuthRejection::MalformedToken => "malformed",
    }
}

/// 认证一个 bearer 令牌
///
/// 签名、过期、声明、持久化会话、用户 ID 全部一致才通过
pub async fn authenticate(tokens: &AccessTokenManager, token: Option<&str>) -> Result<AuthContext> {
    let token = token.ok_or_else(|| reject(AuthRejection::MissingToken))?;

    let claims = tokens.validate(token).map_err(|e| match e {
        TokenError::SignatureInvalid => reject(AuthRejection::InvalidToken),
        TokenError::Expired => reject(AuthRejection::TokenExpired),
        TokenError::Malformed => reject(AuthRejection::MalformedToken),
        TokenError::Other(detail) => {
            tracing::error!(error = %detail, "Unexpected token validation failure");
            AppError::Internal(detail)
        }
    })?;

    let metadata = tokens
        .extract_metadata(&claims)
        .map_err(|_| reject(AuthRejection::InvalidToken))?;

    let persisted = tokens
        .find_persisted(metadata.access_uuid)
        .await
        .map_err(|e| {
            if !matches!(e, AppError::NotFound(_)) {
                tracing::warn!(error = %e, "Session lookup failed");
            }
            reject(AuthRejection::InvalidToken)
        })?;

    if persisted.user_id != metadata.user_id {
        tracing::warn!(
            access_uuid = %metadata.access_uuid,
            "Session user does not match token claims"
        );
        return Err(reject(AuthRejection::InvalidToken));
    }

    Ok(AuthContext {
        user_id: metadata.user_id,
        access_uuid: metadata.access_uuid,
    })
}

/// JWT 认证中间件 - 必须认证
pub async fn jwt_auth_middleware(
    State(tokens): State<Arc<AccessTokenManager>>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let auth_context = authenticate(&tokens, extract_token(req.headers())).await?;

    tracing::debug!(user_id = %auth_context.user_id, "Request authenticated");

    // 附加到请求扩展
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
