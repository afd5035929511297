//! Database repository layer
//!
//! 所有仓储以 trait 形式暴露，提供 PostgreSQL 与内存两种实现。
//! "不存在" 用 `Ok(None)` / `Ok(false)` 表示，与存储故障区分。

pub mod enrollment_repo;
pub mod memory;
pub mod student_repo;
pub mod subject_repo;
pub mod token_repo;
pub mod tutor_repo;

use crate::{
    error::Result,
    models::{
        user::NewAccount, AccessDetails, Enrollment, RegisteredTutor, Student, Subject, Tutor,
        VerificationToken,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::{sync::Arc, time::Duration};
use uuid::Uuid;

pub use enrollment_repo::PgEnrollmentRepository;
pub use memory::MemoryStore;
pub use student_repo::PgStudentRepository;
pub use subject_repo::PgSubjectRepository;
pub use token_repo::{PgSessionRepository, PgVerificationTokenRepository};
pub use tutor_repo::PgTutorRepository;

#[async_trait]
pub trait TutorRepository: Send + Sync {
    async fn create(&self, account: NewAccount) -> Result<Tutor>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Tutor>>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tutor>>;
    async fn exists_by_email(&self, email: &str) -> Result<bool>;
    /// 返回是否有记录被更新
    async fn mark_verified(&self, email: &str) -> Result<bool>;
    async fn update_password(&self, email: &str, password_hash: &str) -> Result<bool>;
    async fn set_subject(&self, id: Uuid, subject_id: Uuid) -> Result<Option<Tutor>>;
    async fn list(&self, subject_id: Option<Uuid>) -> Result<Vec<Tutor>>;
}

#[async_trait]
pub trait StudentRepository: Send + Sync {
    async fn create(&self, account: NewAccount) -> Result<Student>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Student>>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Student>>;
    async fn exists_by_email(&self, email: &str) -> Result<bool>;
    /// 标记已验证并写入必修科目
    async fn mark_verified(&self, email: &str, subjects: &[Uuid]) -> Result<bool>;
    async fn update_password(&self, email: &str, password_hash: &str) -> Result<bool>;
    /// 科目已存在时返回 false
    async fn add_subject(&self, id: Uuid, subject_id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait SubjectRepository: Send + Sync {
    async fn create(&self, subject: Subject) -> Result<Subject>;
    async fn create_many(&self, subjects: Vec<Subject>) -> Result<()>;
    async fn exists_by_name(&self, name: &str) -> Result<bool>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subject>>;
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Subject>>;
    async fn list_compulsory(&self) -> Result<Vec<Subject>>;
    async fn list(&self) -> Result<Vec<Subject>>;
}

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    async fn create(&self, enrollment: Enrollment) -> Result<Enrollment>;
    async fn exists(&self, student_id: Uuid, tutor_id: Uuid) -> Result<bool>;
    async fn list_by_student(&self, student_id: Uuid) -> Result<Vec<RegisteredTutor>>;
}

#[async_trait]
pub trait VerificationTokenRepository: Send + Sync {
    async fn insert(&self, token: VerificationToken) -> Result<()>;
    /// 该邮箱最新且未过期的一条
    async fn find_latest_by_email(&self, email: &str) -> Result<Option<VerificationToken>>;
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// 用新会话原子替换该用户已有的会话
    async fn replace_for_user(&self, session: AccessDetails) -> Result<()>;
    async fn find_by_access_uuid(&self, access_uuid: Uuid) -> Result<Option<AccessDetails>>;
    async fn delete_by_access_uuid(&self, access_uuid: Uuid) -> Result<u64>;
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

/// 仓储集合，按后端统一构建
#[derive(Clone)]
pub struct Repositories {
    pub tutors: Arc<dyn TutorRepository>,
    pub students: Arc<dyn StudentRepository>,
    pub subjects: Arc<dyn SubjectRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub verification_tokens: Arc<dyn VerificationTokenRepository>,
    pub sessions: Arc<dyn SessionRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool, timeout: Duration) -> Self {
        Self {
            tutors: Arc::new(PgTutorRepository::new(pool.clone(), timeout)),
            students: Arc::new(PgStudentRepository::new(pool.clone(), timeout)),
            subjects: Arc::new(PgSubjectRepository::new(pool.clone(), timeout)),
            enrollments: Arc::new(PgEnrollmentRepository::new(pool.clone(), timeout)),
            verification_tokens: Arc::new(PgVerificationTokenRepository::new(pool.clone(), timeout)),
            sessions: Arc::new(PgSessionRepository::new(pool, timeout)),
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            tutors: store.clone(),
            students: store.clone(),
            subjects: store.clone(),
            enrollments: store.clone(),
            verification_tokens: store.clone(),
            sessions: store,
        }
    }
}
