//! 错误处理单元测试
//!
//! 测试应用错误类型的状态码、用户消息和响应格式

use axum::{http::StatusCode, response::IntoResponse};
use edu_service::error::{AppError, AuthRejection};
use http_body_util::BodyExt;

// ==================== 错误状态码测试 ====================

#[test]
fn test_error_status_codes() {
    assert_eq!(
        AppError::Unauthenticated(AuthRejection::TokenExpired).status_code(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(AppError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::forbidden("no").status_code(), StatusCode::FORBIDDEN);
    assert_eq!(AppError::not_found("resource").status_code(), StatusCode::NOT_FOUND);
    assert_eq!(AppError::validation("invalid").status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(AppError::conflict("dup").status_code(), StatusCode::CONFLICT);
    assert_eq!(
        AppError::Timeout("tutors.find_by_email".to_string()).status_code(),
        StatusCode::GATEWAY_TIMEOUT
    );
}

#[test]
fn test_infrastructure_errors_are_500() {
    for error in [
        AppError::Database(sqlx::Error::RowNotFound),
        AppError::Config("Invalid config".to_string()),
        AppError::Signing("key".to_string()),
        AppError::Hashing("salt".to_string()),
        AppError::Notification("provider down".to_string()),
        AppError::Internal("Something went wrong".to_string()),
    ] {
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR, "{error}");
    }
}

// ==================== 用户消息测试 ====================

#[test]
fn test_user_messages_no_sensitive_info() {
    let db_error = AppError::Database(sqlx::Error::RowNotFound);
    let message = db_error.user_message();
    assert_eq!(message, "Database error occurred");
    assert!(!message.to_lowercase().contains("sqlx"));

    let config_error = AppError::Config("Missing API key".to_string());
    assert_eq!(config_error.user_message(), "Configuration error");

    let notify_error = AppError::Notification("401 from provider: bad key".to_string());
    assert!(!notify_error.user_message().contains("key"));
}

#[test]
fn test_rejection_messages() {
    assert_eq!(
        AppError::Unauthenticated(AuthRejection::MissingToken).user_message(),
        "unauthorized: token is required"
    );
    assert_eq!(
        AppError::Unauthenticated(AuthRejection::InvalidToken).user_message(),
        "unauthorized: invalid token"
    );
    assert_eq!(
        AppError::Unauthenticated(AuthRejection::TokenExpired).user_message(),
        "unauthorized: token expired"
    );
    assert_eq!(
        AppError::InvalidCredentials.user_message(),
        "invalid username or password"
    );
}

// ==================== 响应格式测试 ====================

#[tokio::test]
async fn test_error_response_envelope() {
    let response = AppError::conflict("student already exists").into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "student already exists");
    assert_eq!(json["error"]["code"], 409);
    assert_eq!(json["error"]["message"], "student already exists");
    assert!(json["error"]["request_id"].is_string());
    assert!(json.get("data").is_none());
}

#[test]
fn test_validation_errors_convert() {
    use validator::Validate;

    let req = edu_service::models::auth::ForgotPasswordRequest {
        email: "nope".to_string(),
    };
    let error: AppError = req.validate().unwrap_err().into();
    assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    assert!(error.user_message().contains("invalid email"));
}
