//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::{
    auth::{jwt_auth_middleware, role_gate_middleware},
    handlers,
    middleware::AppState,
    models::Role,
};

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点（健康检查）
    let public_routes = Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/api/v1/", get(handlers::health::api_root));

    // 账户与认证（无需认证）
    let auth_routes = Router::new()
        .route("/api/v1/students", post(handlers::auth::sign_up_student))
        .route(
            "/api/v1/tutors",
            post(handlers::auth::sign_up_tutor).get(handlers::tutor::list_tutors),
        )
        .route("/api/v1/verify/{token}", get(handlers::auth::verify))
        .route("/api/v1/login", post(handlers::auth::login))
        .route("/api/v1/forgot-password", post(handlers::auth::forgot_password))
        .route("/api/v1/reset-password", post(handlers::auth::reset_password))
        .route(
            "/api/v1/subjects",
            get(handlers::subject::list_subjects).post(handlers::subject::create_subject),
        );

    // 需要认证的路由
    let session_routes = Router::new()
        .route("/api/v1/logout", delete(handlers::auth::logout))
        .route_layer(from_fn_with_state(state.tokens.clone(), jwt_auth_middleware));

    // 学生路由：先认证，再校验角色
    let student_routes = Router::new()
        .route("/api/v1/students/profile", get(handlers::student::profile))
        .route(
            "/api/v1/students/subjects",
            get(handlers::student::list_subjects).post(handlers::student::register_subject),
        )
        .route("/api/v1/students/tutors", get(handlers::student::list_tutors))
        .route(
            "/api/v1/students/tutors/register",
            post(handlers::student::register_tutor),
        )
        .route_layer(from_fn_with_state(
            state.role_gate(Role::Student),
            role_gate_middleware,
        ))
        .route_layer(from_fn_with_state(state.tokens.clone(), jwt_auth_middleware));

    // 导师路由
    let tutor_routes = Router::new()
        .route("/api/v1/tutors/profile", get(handlers::tutor::profile))
        .route("/api/v1/tutors/subject", put(handlers::tutor::set_subject))
        .route_layer(from_fn_with_state(
            state.role_gate(Role::Tutor),
            role_gate_middleware,
        ))
        .route_layer(from_fn_with_state(state.tokens.clone(), jwt_auth_middleware));

    // 组合所有路由
    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(session_routes)
        .merge(student_routes)
        .merge(tutor_routes)
        .fallback(handlers::health::not_found)
        .layer(CorsLayer::permissive())
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
        .with_state(state)
}
