//! 配置系统
//! 从环境变量加载所有配置，使用 Secret 包装敏感信息

use config::{Config, ConfigError, Environment};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址，例如 "0.0.0.0:8000"
    pub addr: String,
    /// 优雅关闭超时时间（秒）
    pub graceful_shutdown_timeout_secs: u64,
    /// 对外访问地址，用于拼接邮件中的验证链接
    pub public_base_url: String,
}

impl ServerConfig {
    /// API 根路径（邮件链接基于此构建）
    pub fn api_base_url(&self) -> String {
        format!("{}/api/v1", self.public_base_url.trim_end_matches('/'))
    }
}

/// 存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 存储后端: postgres, memory
    pub backend: StorageBackend,
    /// 数据库连接 URL（使用 Secret 包装，防止日志泄露）
    pub url: Secret<String>,
    /// 最大连接数
    pub max_connections: u32,
    /// 最小连接数
    pub min_connections: u32,
    /// 获取连接超时时间（秒）
    pub acquire_timeout_secs: u64,
    /// 空闲连接超时时间（秒）
    pub idle_timeout_secs: u64,
    /// 连接最大生命周期（秒）
    pub max_lifetime_secs: u64,
    /// 单次数据库调用超时（秒）
    pub query_timeout_secs: u64,
    /// 过期令牌清理间隔（秒）
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// JWT 密钥（使用 Secret 包装，防止日志泄露）
    pub jwt_secret: Secret<String>,
    /// 访问令牌过期时间（秒）
    pub access_token_exp_secs: u64,
    /// 注册验证令牌有效期（秒）
    pub signup_token_ttl_secs: u64,
    /// 重置密码令牌有效期（秒）
    pub reset_token_ttl_secs: u64,
    /// 密码最小长度
    pub password_min_length: usize,
    /// Argon2 内存开销（KiB）
    pub argon2_memory_kib: u32,
    /// Argon2 迭代次数
    pub argon2_iterations: u32,
    /// Argon2 并行度
    pub argon2_parallelism: u32,
}

/// 邮件服务提供方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailProvider {
    /// 仅写日志（开发环境）
    Log,
    /// SendGrid HTTP API
    Sendgrid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub provider: EmailProvider,
    /// 第三方 API 密钥
    pub api_key: Secret<String>,
    /// 发送接口地址
    pub api_url: String,
    pub sender_name: String,
    pub sender_address: String,
    /// 发送请求超时（秒）
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubjectsConfig {
    /// 启动时确保存在的必修科目
    pub compulsory: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub email: EmailConfig,
    pub subjects: SubjectsConfig,
}

const MAX_ACCESS_TOKEN_EXP_SECS: u64 = 30 * 24 * 3600;

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        // 添加默认配置
        settings = settings
            .set_default("server.addr", "0.0.0.0:8000")?
            .set_default("server.graceful_shutdown_timeout_secs", 30)?
            .set_default("server.public_base_url", "http://localhost:8000")?
            .set_default("database.backend", "postgres")?
            .set_default("database.url", "")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("database.idle_timeout_secs", 600)?
            .set_default("database.max_lifetime_secs", 1800)?
            .set_default("database.query_timeout_secs", 5)?
            .set_default("database.sweep_interval_secs", 60)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("security.jwt_secret", "change-this-secret-in-production-min-32-chars!")?
            .set_default("security.access_token_exp_secs", 604800)?
            .set_default("security.signup_token_ttl_secs", 604800)?
            .set_default("security.reset_token_ttl_secs", 604800)?
            .set_default("security.password_min_length", 3)?
            .set_default("security.argon2_memory_kib", 19456)?
            .set_default("security.argon2_iterations", 2)?
            .set_default("security.argon2_parallelism", 1)?
            .set_default("email.provider", "log")?
            .set_default("email.api_key", "")?
            .set_default("email.api_url", "https://api.sendgrid.com/v3/mail/send")?
            .set_default("email.sender_name", "Edutech")?
            .set_default("email.sender_address", "")?
            .set_default("email.request_timeout_secs", 10)?
            .set_default("subjects.compulsory", vec!["English"])?;

        // 从环境变量加载配置（前缀为 EDU_）
        settings = settings.add_source(
            Environment::with_prefix("EDU")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("subjects.compulsory")
                .try_parsing(true),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;

        // 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 验证端口范围
        if let Some(port_str) = self.server.addr.split(':').next_back() {
            if let Ok(port) = port_str.parse::<u16>() {
                if port != 0 && port < 1024 {
                    return Err(ConfigError::Message("Server port should be >= 1024".to_string()));
                }
            }
        }

        // 验证日志级别
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        // 验证日志格式
        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        if self.database.backend == StorageBackend::Postgres
            && self.database.url.expose_secret().is_empty()
        {
            return Err(ConfigError::Message(
                "database.url is required for the postgres backend".to_string(),
            ));
        }

        // 验证数据库连接池配置
        if self.database.max_connections < self.database.min_connections {
            return Err(ConfigError::Message(
                "max_connections must be >= min_connections".to_string(),
            ));
        }

        if self.database.query_timeout_secs == 0 {
            return Err(ConfigError::Message("query_timeout_secs must be > 0".to_string()));
        }

        if self.database.sweep_interval_secs == 0 {
            return Err(ConfigError::Message("sweep_interval_secs must be > 0".to_string()));
        }

        // 验证 JWT 密钥长度（至少 32 字符）
        if self.security.jwt_secret.expose_secret().len() < 32 {
            return Err(ConfigError::Message(
                "JWT secret must be at least 32 characters long".to_string(),
            ));
        }

        // 验证令牌过期时间
        if self.security.access_token_exp_secs < 60
            || self.security.access_token_exp_secs > MAX_ACCESS_TOKEN_EXP_SECS
        {
            return Err(ConfigError::Message(
                "access_token_exp_secs must be between 60 and 2592000 (1 minute to 30 days)"
                    .to_string(),
            ));
        }

        if self.security.signup_token_ttl_secs < 60 || self.security.reset_token_ttl_secs < 60 {
            return Err(ConfigError::Message(
                "verification token ttl must be at least 60 seconds".to_string(),
            ));
        }

        // 验证密码策略
        if self.security.password_min_length < 1 || self.security.password_min_length > 128 {
            return Err(ConfigError::Message(
                "password_min_length must be between 1 and 128".to_string(),
            ));
        }

        if self.email.provider == EmailProvider::Sendgrid {
            if self.email.api_key.expose_secret().is_empty() {
                return Err(ConfigError::Message(
                    "email.api_key is required for the sendgrid provider".to_string(),
                ));
            }
            if !self.email.sender_address.contains('@') {
                return Err(ConfigError::Message(
                    "email.sender_address must be a valid address".to_string(),
                ));
            }
        }

        Ok(())
    }
}
