//! 认证相关的 HTTP 处理器
//! 注册、邮箱验证、登录、登出、找回与重置密码

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    handlers::{ValidatedJson, ValidatedQuery},
    middleware::AppState,
    models::{
        auth::{ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, VerifyQuery},
        user::SignUpRequest,
        AccountKind, ApiResponse,
    },
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

/// 学生注册
pub async fn sign_up_student(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<SignUpRequest>,
) -> Result<impl IntoResponse, AppError> {
    let account = state
        .account_service
        .sign_up(AccountKind::Student, req)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            account,
            "student created successfully...check email for verification link",
        )),
    ))
}

/// 导师注册
pub async fn sign_up_tutor(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<SignUpRequest>,
) -> Result<impl IntoResponse, AppError> {
    let account = state
        .account_service
        .sign_up(AccountKind::Tutor, req)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            account,
            "tutor created successfully...check email for verification link",
        )),
    ))
}

/// 邮箱验证
pub async fn verify(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    ValidatedQuery(query): ValidatedQuery<VerifyQuery>,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.verify(&token, &query.email).await?;
    Ok(Json(ApiResponse::message("user verified successfully")))
}

/// 用户登录
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.login(req).await?;
    Ok(Json(ApiResponse::success(response, "user successfully logged in")))
}

/// 用户登出
pub async fn logout(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.logout(&auth_context).await?;
    Ok(Json(ApiResponse::message("user successfully logged out")))
}

/// 找回密码
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.forgot_password(&req.email).await?;
    Ok(Json(ApiResponse::message("password reset token sent successfully")))
}

/// 重置密码
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.reset_password(req).await?;
    Ok(Json(ApiResponse::message("password reset successfully")))
}
