//! Subject repository (数据库访问层)

use super::SubjectRepository;
use crate::{db::with_timeout, error::Result, models::Subject};
use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

pub struct PgSubjectRepository {
    db: PgPool,
    timeout: Duration,
}

impl PgSubjectRepository {
    pub fn new(db: PgPool, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

#[async_trait]
impl SubjectRepository for PgSubjectRepository {
    async fn create(&self, subject: Subject) -> Result<Subject> {
        with_timeout(
            self.timeout,
            "subjects.create",
            sqlx::query_as::<_, Subject>(
                r#"
                INSERT INTO subjects (id, name, compulsory, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
                "#,
            )
            .bind(subject.id)
            .bind(&subject.name)
            .bind(subject.compulsory)
            .bind(subject.created_at)
            .bind(subject.updated_at)
            .fetch_one(&self.db),
        )
        .await
    }

    async fn create_many(&self, subjects: Vec<Subject>) -> Result<()> {
        if subjects.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = subjects.iter().map(|s| s.id).collect();
        let names: Vec<String> = subjects.iter().map(|s| s.name.clone()).collect();
        let compulsory: Vec<bool> = subjects.iter().map(|s| s.compulsory).collect();

        with_timeout(
            self.timeout,
            "subjects.create_many",
            sqlx::query(
                r#"
                INSERT INTO subjects (id, name, compulsory)
                SELECT * FROM UNNEST($1::uuid[], $2::text[], $3::bool[])
                ON CONFLICT (name) DO NOTHING
                "#,
            )
            .bind(&ids)
            .bind(&names)
            .bind(&compulsory)
            .execute(&self.db),
        )
        .await?;

        Ok(())
    }

    async fn exists_by_name(&self, name: &str) -> Result<bool> {
        with_timeout(
            self.timeout,
            "subjects.exists_by_name",
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM subjects WHERE name = $1)")
                .bind(name)
                .fetch_one(&self.db),
        )
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subject>> {
        with_timeout(
            self.timeout,
            "subjects.find_by_id",
            sqlx::query_as::<_, Subject>("SELECT * FROM subjects WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.db),
        )
        .await
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Subject>> {
        with_timeout(
            self.timeout,
            "subjects.find_by_ids",
            sqlx::query_as::<_, Subject>(
                "SELECT * FROM subjects WHERE id = ANY($1) ORDER BY name ASC",
            )
            .bind(ids)
            .fetch_all(&self.db),
        )
        .await
    }

    async fn list_compulsory(&self) -> Result<Vec<Subject>> {
        with_timeout(
            self.timeout,
            "subjects.list_compulsory",
            sqlx::query_as::<_, Subject>(
                "SELECT * FROM subjects WHERE compulsory = TRUE ORDER BY name ASC",
            )
            .fetch_all(&self.db),
        )
        .await
    }

    async fn list(&self) -> Result<Vec<Subject>> {
        with_timeout(
            self.timeout,
            "subjects.list",
            sqlx::query_as::<_, Subject>("SELECT * FROM subjects ORDER BY name ASC")
                .fetch_all(&self.db),
        )
        .await
    }
}
