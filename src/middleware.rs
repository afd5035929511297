//! HTTP 中间件与应用状态
//! 请求追踪：trace_id / request_id、访问日志、请求指标

use crate::{
    auth::{AccessTokenManager, IdentityResolver, PasswordHasher, RoleGate, VerificationTokenManager},
    config::AppConfig,
    db::Storage,
    error::Result,
    models::Role,
    notify::Notifier,
    repository::Repositories,
    services::{AccountService, AuthService, StudentService, SubjectService, TutorService},
};
use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;
use uuid::Uuid;

/// 应用状态
///
/// 服务以 Arc 共享，Clone 只是指针拷贝
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: Storage,
    pub repos: Repositories,
    pub tokens: Arc<AccessTokenManager>,
    pub resolver: IdentityResolver,
    pub account_service: Arc<AccountService>,
    pub auth_service: Arc<AuthService>,
    pub student_service: Arc<StudentService>,
    pub tutor_service: Arc<TutorService>,
    pub subject_service: Arc<SubjectService>,
}

impl AppState {
    /// 按配置装配全部服务
    pub fn new(config: AppConfig, storage: Storage, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let repos =
            storage.repositories(Duration::from_secs(config.database.query_timeout_secs));
        let hasher = PasswordHasher::from_config(&config.security)?;
        let tokens = Arc::new(AccessTokenManager::from_config(&config, repos.sessions.clone())?);
        let verification = Arc::new(VerificationTokenManager::from_config(
            repos.verification_tokens.clone(),
            hasher.clone(),
            &config.security,
        ));
        let resolver = IdentityResolver::new(repos.tutors.clone(), repos.students.clone());
        let api_base_url = config.server.api_base_url();
        let password_min_length = config.security.password_min_length;

        let account_service = Arc::new(AccountService::new(
            resolver.clone(),
            repos.tutors.clone(),
            repos.students.clone(),
            hasher.clone(),
            verification.clone(),
            notifier.clone(),
            api_base_url.clone(),
            password_min_length,
        ));

        let auth_service = Arc::new(AuthService::new(
            resolver.clone(),
            repos.tutors.clone(),
            repos.students.clone(),
            repos.subjects.clone(),
            hasher,
            tokens.clone(),
            verification,
            notifier,
            api_base_url,
            password_min_length,
        ));

        let student_service = Arc::new(StudentService::new(
            repos.students.clone(),
            repos.tutors.clone(),
            repos.subjects.clone(),
            repos.enrollments.clone(),
        ));
        let tutor_service = Arc::new(TutorService::new(repos.tutors.clone(), repos.subjects.clone()));
        let subject_service = Arc::new(SubjectService::new(repos.subjects.clone()));

        Ok(Self {
            config: Arc::new(config),
            storage,
            repos,
            tokens,
            resolver,
            account_service,
            auth_service,
            student_service,
            tutor_service,
            subject_service,
        })
    }

    /// 指定角色的路由门禁
    pub fn role_gate(&self, role: Role) -> RoleGate {
        RoleGate::new(self.resolver.clone(), role)
    }
}

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().clone();
    // 只记录路径，查询参数中可能带有令牌
    let path = req.uri().path().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        path = %path,
    );

    async move {
        let start = Instant::now();

        let mut response = next.run(req).await;

        let elapsed = start.elapsed();
        let status = response.status().as_u16();

        metrics::counter!(
            "http_requests_total",
            "method" => method_label(method.as_str()),
            "status" => status_label(status)
        )
        .increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            status = status,
            elapsed_ms = elapsed.as_millis() as u64,
            "Request completed"
        );

        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

fn method_label(method: &str) -> &'static str {
    match method {
        "GET" => "GET",
        "POST" => "POST",
        "PUT" => "PUT",
        "DELETE" => "DELETE",
        "PATCH" => "PATCH",
        "OPTIONS" => "OPTIONS",
        _ => "UNKNOWN",
    }
}

fn status_label(status: u16) -> &'static str {
    match status {
        200 => "200",
        201 => "201",
        204 => "204",
        400 => "400",
        401 => "401",
        403 => "403",
        404 => "404",
        409 => "409",
        500 => "500",
        504 => "504",
        _ => "other",
    }
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty() && s.len() <= 128)
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
