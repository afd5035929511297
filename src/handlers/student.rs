//! 学生路由处理器（需学生角色）

use crate::{
    auth::CurrentStudent,
    error::AppError,
    handlers::ValidatedJson,
    middleware::AppState,
    models::{
        subject::{SubjectRefRequest, TutorRefRequest},
        ApiResponse,
    },
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

pub async fn profile(CurrentStudent(student): CurrentStudent) -> impl IntoResponse {
    Json(ApiResponse::success(student, "student retrieved successfully"))
}

pub async fn register_subject(
    State(state): State<Arc<AppState>>,
    CurrentStudent(student): CurrentStudent,
    ValidatedJson(req): ValidatedJson<SubjectRefRequest>,
) -> Result<impl IntoResponse, AppError> {
    let subject_id = req.parse_id()?;
    state
        .student_service
        .register_subject(&student, subject_id)
        .await?;

    Ok(Json(ApiResponse::message("subject registered successfully")))
}

pub async fn list_subjects(
    State(state): State<Arc<AppState>>,
    CurrentStudent(student): CurrentStudent,
) -> Result<impl IntoResponse, AppError> {
    let subjects = state.student_service.list_subjects(&student).await?;
    Ok(Json(ApiResponse::success(
        subjects,
        "student's subjects retrieved successfully",
    )))
}

pub async fn register_tutor(
    State(state): State<Arc<AppState>>,
    CurrentStudent(student): CurrentStudent,
    ValidatedJson(req): ValidatedJson<TutorRefRequest>,
) -> Result<impl IntoResponse, AppError> {
    let tutor_id = req.parse_id()?;
    let enrollment = state
        .student_service
        .register_tutor(&student, tutor_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(enrollment, "tutor registered successfully")),
    ))
}

pub async fn list_tutors(
    State(state): State<Arc<AppState>>,
    CurrentStudent(student): CurrentStudent,
) -> Result<impl IntoResponse, AppError> {
    let tutors = state.student_service.list_tutors(&student).await?;
    Ok(Json(ApiResponse::success(
        tutors,
        "student's tutors retrieved successfully",
    )))
}
