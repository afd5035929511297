//! Student repository (数据库访问层)

use super::StudentRepository;
use crate::{
    db::with_timeout,
    error::Result,
    models::{user::NewAccount, Role, Student},
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

pub struct PgStudentRepository {
    db: PgPool,
    timeout: Duration,
}

impl PgStudentRepository {
    pub fn new(db: PgPool, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

#[async_trait]
impl StudentRepository for PgStudentRepository {
    async fn create(&self, account: NewAccount) -> Result<Student> {
        with_timeout(
            self.timeout,
            "students.create",
            sqlx::query_as::<_, Student>(
                r#"
                INSERT INTO students (id, email, password_hash, first_name, last_name, role)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(&account.first_name)
            .bind(&account.last_name)
            .bind(Role::Student)
            .fetch_one(&self.db),
        )
        .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Student>> {
        with_timeout(
            self.timeout,
            "students.find_by_email",
            sqlx::query_as::<_, Student>("SELECT * FROM students WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.db),
        )
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Student>> {
        with_timeout(
            self.timeout,
            "students.find_by_id",
            sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.db),
        )
        .await
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool> {
        with_timeout(
            self.timeout,
            "students.exists_by_email",
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM students WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.db),
        )
        .await
    }

    async fn mark_verified(&self, email: &str, subjects: &[Uuid]) -> Result<bool> {
        let result = with_timeout(
            self.timeout,
            "students.mark_verified",
            sqlx::query(
                r#"
                UPDATE students
                SET is_verified = TRUE, subjects = $2, updated_at = NOW()
                WHERE email = $1
                "#,
            )
            .bind(email)
            .bind(subjects)
            .execute(&self.db),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> Result<bool> {
        let result = with_timeout(
            self.timeout,
            "students.update_password",
            sqlx::query(
                "UPDATE students SET password_hash = $2, updated_at = NOW() WHERE email = $1",
            )
            .bind(email)
            .bind(password_hash)
            .execute(&self.db),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_subject(&self, id: Uuid, subject_id: Uuid) -> Result<bool> {
        // 条件更新，避免重复登记
        let result = with_timeout(
            self.timeout,
            "students.add_subject",
            sqlx::query(
                r#"
                UPDATE students
                SET subjects = array_append(subjects, $2), updated_at = NOW()
                WHERE id = $1 AND NOT ($2 = ANY(subjects))
                "#,
            )
            .bind(id)
            .bind(subject_id)
            .execute(&self.db),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
