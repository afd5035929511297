//! Enrollment repository (学生-导师登记关系)

use super::EnrollmentRepository;
use crate::{
    db::with_timeout,
    error::Result,
    models::{Enrollment, RegisteredTutor},
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

pub struct PgEnrollmentRepository {
    db: PgPool,
    timeout: Duration,
}

impl PgEnrollmentRepository {
    pub fn new(db: PgPool, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

#[async_trait]
impl EnrollmentRepository for PgEnrollmentRepository {
    async fn create(&self, enrollment: Enrollment) -> Result<Enrollment> {
        with_timeout(
            self.timeout,
            "enrollments.create",
            sqlx::query_as::<_, Enrollment>(
                r#"
                INSERT INTO enrollments (id, student_id, tutor_id, subject_id, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
                "#,
            )
            .bind(enrollment.id)
            .bind(enrollment.student_id)
            .bind(enrollment.tutor_id)
            .bind(enrollment.subject_id)
            .bind(enrollment.created_at)
            .bind(enrollment.updated_at)
            .fetch_one(&self.db),
        )
        .await
    }

    async fn exists(&self, student_id: Uuid, tutor_id: Uuid) -> Result<bool> {
        with_timeout(
            self.timeout,
            "enrollments.exists",
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM enrollments WHERE student_id = $1 AND tutor_id = $2)",
            )
            .bind(student_id)
            .bind(tutor_id)
            .fetch_one(&self.db),
        )
        .await
    }

    async fn list_by_student(&self, student_id: Uuid) -> Result<Vec<RegisteredTutor>> {
        with_timeout(
            self.timeout,
            "enrollments.list_by_student",
            sqlx::query_as::<_, RegisteredTutor>(
                r#"
                SELECT t.id AS tutor_id, t.email, t.first_name, t.last_name,
                       e.subject_id, e.created_at AS registered_at
                FROM enrollments e
                JOIN tutors t ON t.id = e.tutor_id
                WHERE e.student_id = $1
                ORDER BY e.created_at ASC
                "#,
            )
            .bind(student_id)
            .fetch_all(&self.db),
        )
        .await
    }
}
