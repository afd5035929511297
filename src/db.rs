//! 数据库连接池与迁移管理
//! 提供 PostgreSQL 连接池、迁移执行、调用超时和过期数据清理

use crate::{
    config::{DatabaseConfig, StorageBackend},
    error::AppError,
    repository::Repositories,
};
use secrecy::ExposeSecret;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{future::Future, time::Duration};
use tokio::task::JoinHandle;

/// 创建数据库连接池
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, DbError> {
    let db_url = config.url.expose_secret();

    tracing::debug!("Creating database connection pool...");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .test_before_acquire(true)
        .connect(db_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create database pool: {}", e);
            DbError::ConnectionFailed(e.to_string())
        })?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database pool created successfully"
    );

    Ok(pool)
}

/// 运行数据库迁移
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!("Running database migrations...");

    sqlx::migrate!("./migrations").run(pool).await.map_err(|e| {
        tracing::error!("Migration failed: {}", e);
        DbError::MigrationFailed(e.to_string())
    })?;

    tracing::info!("Migrations completed successfully");
    Ok(())
}

/// 存储后端句柄
#[derive(Clone)]
pub enum Storage {
    Postgres(PgPool),
    Memory,
}

impl Storage {
    /// 按配置建立存储（Postgres 会执行迁移）
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbError> {
        match config.backend {
            StorageBackend::Postgres => {
                let pool = create_pool(config).await?;
                run_migrations(&pool).await?;
                Ok(Storage::Postgres(pool))
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage, data is lost on restart");
                Ok(Storage::Memory)
            }
        }
    }

    /// 构建仓储集合
    pub fn repositories(&self, query_timeout: Duration) -> Repositories {
        match self {
            Storage::Postgres(pool) => Repositories::postgres(pool.clone(), query_timeout),
            Storage::Memory => Repositories::in_memory(),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Storage::Postgres(_) => "postgres",
            Storage::Memory => "memory",
        }
    }

    /// 存储健康检查
    pub async fn health_check(&self) -> HealthStatus {
        match self {
            Storage::Postgres(pool) => health_check(pool).await,
            Storage::Memory => HealthStatus::Healthy,
        }
    }

    pub fn record_pool_metrics(&self) {
        if let Storage::Postgres(pool) = self {
            record_pool_metrics(pool);
        }
    }
}

/// 数据库健康检查
pub async fn health_check(pool: &PgPool) -> HealthStatus {
    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => {
            tracing::debug!("Database health check: OK");
            HealthStatus::Healthy
        }
        Err(e) => {
            tracing::warn!("Database health check failed: {}", e);
            HealthStatus::Unhealthy(e.to_string())
        }
    }
}

/// 记录数据库连接池指标
pub fn record_pool_metrics(pool: &PgPool) {
    metrics::gauge!("db_pool_size").set(pool.size() as f64);
    metrics::gauge!("db_pool_idle").set(pool.num_idle() as f64);
}

/// 为单次数据库调用加上超时
///
/// 超时映射为 `AppError::Timeout`，唯一约束冲突映射为 `AppError::Conflict`
pub async fn with_timeout<T, F>(limit: Duration, op: &'static str, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(map_db_error(op, e)),
        Err(_) => {
            tracing::warn!(op, timeout_ms = limit.as_millis() as u64, "Database call timed out");
            Err(AppError::Timeout(op.to_string()))
        }
    }
}

fn map_db_error(op: &'static str, e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            tracing::debug!(op, "Unique constraint violated");
            return AppError::conflict("resource already exists");
        }
    }
    AppError::Database(e)
}

/// 启动过期令牌与会话的后台清理任务
pub fn spawn_expiry_sweeper(repos: Repositories, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            sweep_expired(&repos).await;
        }
    })
}

/// 执行一次清理，失败只记录日志
pub async fn sweep_expired(repos: &Repositories) {
    let now = chrono::Utc::now();

    match repos.verification_tokens.delete_expired(now).await {
        Ok(0) => {}
        Ok(removed) => tracing::debug!(removed, "Expired verification tokens removed"),
        Err(e) => tracing::warn!(error = %e, "Failed to sweep verification tokens"),
    }

    match repos.sessions.delete_expired(now).await {
        Ok(0) => {}
        Ok(removed) => tracing::debug!(removed, "Expired sessions removed"),
        Err(e) => tracing::warn!(error = %e, "Failed to sweep sessions"),
    }
}

/// 数据库错误类型
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

/// 健康状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}
