//! 科目处理器

use crate::{
    error::AppError,
    handlers::ValidatedJson,
    middleware::AppState,
    models::{subject::CreateSubjectRequest, ApiResponse},
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

pub async fn create_subject(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateSubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    let subject = state.subject_service.create(&req.name).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(subject, "subject successfully created")),
    ))
}

pub async fn list_subjects(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let subjects = state.subject_service.list().await?;
    Ok(Json(ApiResponse::success(subjects, "subjects retrieved successfully")))
}
