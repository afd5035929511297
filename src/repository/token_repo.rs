//! 验证令牌与会话仓储

use super::{SessionRepository, VerificationTokenRepository};
use crate::{
    db::with_timeout,
    error::Result,
    models::{AccessDetails, VerificationToken},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

pub struct PgVerificationTokenRepository {
    db: PgPool,
    timeout: Duration,
}

impl PgVerificationTokenRepository {
    pub fn new(db: PgPool, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

#[async_trait]
impl VerificationTokenRepository for PgVerificationTokenRepository {
    async fn insert(&self, token: VerificationToken) -> Result<()> {
        with_timeout(
            self.timeout,
            "verification_tokens.insert",
            sqlx::query(
                r#"
                INSERT INTO verification_tokens (id, email, token_hash, expires_at, created_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(token.id)
            .bind(&token.email)
            .bind(&token.token_hash)
            .bind(token.expires_at)
            .bind(token.created_at)
            .execute(&self.db),
        )
        .await?;

        Ok(())
    }

    async fn find_latest_by_email(&self, email: &str) -> Result<Option<VerificationToken>> {
        // 过期行在清理前也视为不存在
        with_timeout(
            self.timeout,
            "verification_tokens.find_latest_by_email",
            sqlx::query_as::<_, VerificationToken>(
                r#"
                SELECT * FROM verification_tokens
                WHERE email = $1 AND expires_at > NOW()
                ORDER BY created_at DESC
                LIMIT 1
                "#,
            )
            .bind(email)
            .fetch_optional(&self.db),
        )
        .await
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = with_timeout(
            self.timeout,
            "verification_tokens.delete_expired",
            sqlx::query("DELETE FROM verification_tokens WHERE expires_at <= $1")
                .bind(now)
                .execute(&self.db),
        )
        .await?;

        Ok(result.rows_affected())
    }
}

pub struct PgSessionRepository {
    db: PgPool,
    timeout: Duration,
}

impl PgSessionRepository {
    pub fn new(db: PgPool, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn replace_for_user(&self, session: AccessDetails) -> Result<()> {
        // user_id 唯一，单条语句完成替换
        with_timeout(
            self.timeout,
            "sessions.replace_for_user",
            sqlx::query(
                r#"
                INSERT INTO sessions (id, access_uuid, user_id, expire_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (user_id) DO UPDATE
                SET id = EXCLUDED.id,
                    access_uuid = EXCLUDED.access_uuid,
                    expire_at = EXCLUDED.expire_at
                "#,
            )
            .bind(session.id)
            .bind(session.access_uuid)
            .bind(session.user_id)
            .bind(session.expire_at)
            .execute(&self.db),
        )
        .await?;

        Ok(())
    }

    async fn find_by_access_uuid(&self, access_uuid: Uuid) -> Result<Option<AccessDetails>> {
        with_timeout(
            self.timeout,
            "sessions.find_by_access_uuid",
            sqlx::query_as::<_, AccessDetails>("SELECT * FROM sessions WHERE access_uuid = $1")
                .bind(access_uuid)
                .fetch_optional(&self.db),
        )
        .await
    }

    async fn delete_by_access_uuid(&self, access_uuid: Uuid) -> Result<u64> {
        let result = with_timeout(
            self.timeout,
            "sessions.delete_by_access_uuid",
            sqlx::query("DELETE FROM sessions WHERE access_uuid = $1")
                .bind(access_uuid)
                .execute(&self.db),
        )
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = with_timeout(
            self.timeout,
            "sessions.delete_expired",
            sqlx::query("DELETE FROM sessions WHERE expire_at <= $1")
                .bind(now)
                .execute(&self.db),
        )
        .await?;

        Ok(result.rows_affected())
    }
}
