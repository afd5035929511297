//! Tutor repository (数据库访问层)

use super::TutorRepository;
use crate::{
    db::with_timeout,
    error::Result,
    models::{user::NewAccount, Role, Tutor},
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

pub struct PgTutorRepository {
    db: PgPool,
    timeout: Duration,
}

impl PgTutorRepository {
    pub fn new(db: PgPool, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

#[async_trait]
impl TutorRepository for PgTutorRepository {
    async fn create(&self, account: NewAccount) -> Result<Tutor> {
        with_timeout(
            self.timeout,
            "tutors.create",
            sqlx::query_as::<_, Tutor>(
                r#"
                INSERT INTO tutors (id, email, password_hash, first_name, last_name, role)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(&account.first_name)
            .bind(&account.last_name)
            .bind(Role::Tutor)
            .fetch_one(&self.db),
        )
        .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Tutor>> {
        with_timeout(
            self.timeout,
            "tutors.find_by_email",
            sqlx::query_as::<_, Tutor>("SELECT * FROM tutors WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.db),
        )
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tutor>> {
        with_timeout(
            self.timeout,
            "tutors.find_by_id",
            sqlx::query_as::<_, Tutor>("SELECT * FROM tutors WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.db),
        )
        .await
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool> {
        with_timeout(
            self.timeout,
            "tutors.exists_by_email",
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM tutors WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.db),
        )
        .await
    }

    async fn mark_verified(&self, email: &str) -> Result<bool> {
        let result = with_timeout(
            self.timeout,
            "tutors.mark_verified",
            sqlx::query("UPDATE tutors SET is_verified = TRUE, updated_at = NOW() WHERE email = $1")
                .bind(email)
                .execute(&self.db),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> Result<bool> {
        let result = with_timeout(
            self.timeout,
            "tutors.update_password",
            sqlx::query(
                "UPDATE tutors SET password_hash = $2, updated_at = NOW() WHERE email = $1",
            )
            .bind(email)
            .bind(password_hash)
            .execute(&self.db),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_subject(&self, id: Uuid, subject_id: Uuid) -> Result<Option<Tutor>> {
        with_timeout(
            self.timeout,
            "tutors.set_subject",
            sqlx::query_as::<_, Tutor>(
                r#"
                UPDATE tutors
                SET subject_id = $2, updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(subject_id)
            .fetch_optional(&self.db),
        )
        .await
    }

    async fn list(&self, subject_id: Option<Uuid>) -> Result<Vec<Tutor>> {
        with_timeout(
            self.timeout,
            "tutors.list",
            sqlx::query_as::<_, Tutor>(
                r#"
                SELECT * FROM tutors
                WHERE ($1::uuid IS NULL OR subject_id = $1)
                ORDER BY created_at ASC
                "#,
            )
            .bind(subject_id)
            .fetch_all(&self.db),
        )
        .await
    }
}
