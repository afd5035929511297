//! 健康检查处理器
//! 提供 /health、/ready 和欢迎信息端点

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::{db, error::AppError, middleware::AppState, models::ApiResponse};

/// 存活探针响应
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// 就绪探针响应
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub checks: Vec<HealthCheck>,
}

/// 健康检查项
#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

static APP_START_TIME: OnceCell<Instant> = OnceCell::new();

/// 设置应用启动时间（main 中调用一次）
pub fn set_start_time() {
    let _ = APP_START_TIME.set(Instant::now());
}

/// 获取应用运行时间（秒）
pub fn get_uptime() -> u64 {
    APP_START_TIME.get().map_or(0, |start| start.elapsed().as_secs())
}

/// 存活探针
/// 快速响应，不检查依赖
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: get_uptime(),
    })
}

/// 就绪探针
/// 检查存储后端
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let storage_health = state.storage.health_check().await;
    state.storage.record_pool_metrics();

    let (status, message) = match storage_health {
        db::HealthStatus::Healthy => ("healthy".to_string(), None),
        db::HealthStatus::Unhealthy(msg) => ("unhealthy".to_string(), Some(msg)),
    };

    let checks = vec![HealthCheck {
        name: state.storage.backend_name().to_string(),
        status,
        message,
    }];

    let ready = checks.iter().all(|c| c.status == "healthy");
    let code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(ReadinessResponse { ready, checks }))
}

/// `GET /`
pub async fn root() -> Json<ApiResponse<()>> {
    Json(ApiResponse::message("Welcome to the edu service"))
}

/// `GET /api/v1/`
pub async fn api_root() -> Json<ApiResponse<()>> {
    Json(ApiResponse::message("Welcome to the edu service API v1"))
}

/// 未匹配路由
pub async fn not_found() -> AppError {
    AppError::not_found("route not found")
}
