//! 科目服务

use crate::{
    error::{AppError, Result},
    models::Subject,
    repository::SubjectRepository,
};
use std::sync::Arc;

pub struct SubjectService {
    subjects: Arc<dyn SubjectRepository>,
}

impl SubjectService {
    pub fn new(subjects: Arc<dyn SubjectRepository>) -> Self {
        Self { subjects }
    }

    /// 启动时补齐缺失的必修科目，返回新插入的数量
    pub async fn seed_compulsory(&self, names: &[String]) -> Result<usize> {
        let mut missing = Vec::new();
        for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            if !self.subjects.exists_by_name(name).await?
                && !missing.iter().any(|s: &Subject| s.name == name)
            {
                missing.push(Subject::new(name, true));
            }
        }

        let inserted = missing.len();
        if inserted > 0 {
            self.subjects.create_many(missing).await?;
            tracing::info!(inserted, "Compulsory subjects seeded");
        }

        Ok(inserted)
    }

    pub async fn create(&self, name: &str) -> Result<Subject> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("name is required"));
        }

        if self.subjects.exists_by_name(name).await? {
            return Err(AppError::conflict("subject already exists"));
        }

        let subject = self.subjects.create(Subject::new(name, false)).await?;
        tracing::info!(subject_id = %subject.id, name = %subject.name, "Subject created");
        Ok(subject)
    }

    pub async fn list(&self) -> Result<Vec<Subject>> {
        self.subjects.list().await
    }
}
