//! 导师路由处理器

use crate::{
    auth::CurrentTutor,
    error::AppError,
    handlers::{ValidatedJson, ValidatedQuery},
    middleware::AppState,
    models::{
        subject::{SubjectRefRequest, TutorFilter},
        ApiResponse,
    },
};
use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

pub async fn profile(CurrentTutor(tutor): CurrentTutor) -> impl IntoResponse {
    Json(ApiResponse::success(tutor, "tutor retrieved successfully"))
}

/// 设置导师教授的科目
pub async fn set_subject(
    State(state): State<Arc<AppState>>,
    CurrentTutor(tutor): CurrentTutor,
    ValidatedJson(req): ValidatedJson<SubjectRefRequest>,
) -> Result<impl IntoResponse, AppError> {
    let subject_id = req.parse_id()?;
    let updated = state.tutor_service.assign_subject(&tutor, subject_id).await?;
    Ok(Json(ApiResponse::success(updated, "tutor's subject updated successfully")))
}

/// 公开的导师目录
pub async fn list_tutors(
    State(state): State<Arc<AppState>>,
    ValidatedQuery(filter): ValidatedQuery<TutorFilter>,
) -> Result<impl IntoResponse, AppError> {
    let tutors = state.tutor_service.list(filter.subject_id).await?;
    Ok(Json(ApiResponse::success(tutors, "tutors retrieved successfully")))
}
