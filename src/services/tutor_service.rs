//! 导师服务

use crate::{
    error::{AppError, Result},
    models::Tutor,
    repository::{SubjectRepository, TutorRepository},
};
use std::sync::Arc;
use uuid::Uuid;

pub struct TutorService {
    tutors: Arc<dyn TutorRepository>,
    subjects: Arc<dyn SubjectRepository>,
}

impl TutorService {
    pub fn new(tutors: Arc<dyn TutorRepository>, subjects: Arc<dyn SubjectRepository>) -> Self {
        Self { tutors, subjects }
    }

    /// 设置导师教授的科目（覆盖原有科目）
    pub async fn assign_subject(&self, tutor: &Tutor, subject_id: Uuid) -> Result<Tutor> {
        if self.subjects.find_by_id(subject_id).await?.is_none() {
            return Err(AppError::not_found("subject does not exist"));
        }

        let updated = self
            .tutors
            .set_subject(tutor.id, subject_id)
            .await?
            .ok_or_else(|| AppError::not_found("tutor not found"))?;

        tracing::info!(tutor_id = %tutor.id, subject_id = %subject_id, "Tutor subject set");
        Ok(updated)
    }

    /// 导师目录，可按科目过滤
    pub async fn list(&self, subject_id: Option<Uuid>) -> Result<Vec<Tutor>> {
        self.tutors.list(subject_id).await
    }
}
