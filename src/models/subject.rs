//! 科目与选课关系模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

/// 科目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subject {
    pub id: Uuid,
    pub name: String,
    /// 必修科目在学生完成验证时自动登记
    pub compulsory: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subject {
    pub fn new(name: impl Into<String>, compulsory: bool) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            compulsory,
            created_at: now,
            updated_at: now,
        }
    }
}

/// 学生登记导师的记录
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Enrollment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub tutor_id: Uuid,
    pub subject_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 学生视角的已登记导师
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RegisteredTutor {
    pub tutor_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub subject_id: Uuid,
    pub registered_at: DateTime<Utc>,
}

/// Create subject request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubjectRequest {
    #[validate(length(min = 1, max = 100, message = "name is required"))]
    pub name: String,
}

/// 学生登记科目 / 导师设置科目
#[derive(Debug, Deserialize, Validate)]
pub struct SubjectRefRequest {
    #[validate(length(min = 1, message = "subject_id is required"))]
    pub subject_id: String,
}

impl SubjectRefRequest {
    pub fn parse_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(self.subject_id.trim()).map_err(|_| AppError::validation("invalid subject id"))
    }
}

/// 学生登记导师
#[derive(Debug, Deserialize, Validate)]
pub struct TutorRefRequest {
    #[validate(length(min = 1, message = "tutor_id is required"))]
    pub tutor_id: String,
}

impl TutorRefRequest {
    pub fn parse_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(self.tutor_id.trim()).map_err(|_| AppError::validation("invalid tutor id"))
    }
}

/// `GET /tutors?subject_id=`
#[derive(Debug, Default, Deserialize, Validate)]
pub struct TutorFilter {
    pub subject_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subject_id() {
        let id = Uuid::new_v4();
        let req = SubjectRefRequest { subject_id: id.to_string() };
        assert_eq!(req.parse_id().unwrap(), id);

        let req = SubjectRefRequest { subject_id: "not-a-uuid".to_string() };
        let err = req.parse_id().unwrap_err();
        assert_eq!(err.user_message(), "invalid subject id");
    }
}
