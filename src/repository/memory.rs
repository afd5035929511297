//! 内存仓储
//! 本地运行与测试使用，所有集合放在同一把读写锁下

use super::{
    EnrollmentRepository, SessionRepository, StudentRepository, SubjectRepository,
    TutorRepository, VerificationTokenRepository,
};
use crate::{
    error::{AppError, Result},
    models::{
        user::NewAccount, AccessDetails, Enrollment, RegisteredTutor, Role, Student, Subject,
        Tutor, VerificationToken,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    tutors: HashMap<Uuid, Tutor>,
    students: HashMap<Uuid, Student>,
    subjects: HashMap<Uuid, Subject>,
    enrollments: Vec<Enrollment>,
    verification_tokens: Vec<VerificationToken>,
    /// user_id -> session
    sessions: HashMap<Uuid, AccessDetails>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_name(mut subjects: Vec<Subject>) -> Vec<Subject> {
    subjects.sort_by(|a, b| a.name.cmp(&b.name));
    subjects
}

#[async_trait]
impl TutorRepository for MemoryStore {
    async fn create(&self, account: NewAccount) -> Result<Tutor> {
        let mut tables = self.tables.write().await;
        if tables.tutors.values().any(|t| t.email == account.email) {
            return Err(AppError::conflict("resource already exists"));
        }

        let now = Utc::now();
        let tutor = Tutor {
            id: Uuid::new_v4(),
            email: account.email,
            password_hash: account.password_hash,
            first_name: account.first_name,
            last_name: account.last_name,
            is_verified: false,
            role: Role::Tutor,
            approved: false,
            subject_id: None,
            created_at: now,
            updated_at: now,
        };
        tables.tutors.insert(tutor.id, tutor.clone());
        Ok(tutor)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Tutor>> {
        let tables = self.tables.read().await;
        Ok(tables.tutors.values().find(|t| t.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tutor>> {
        Ok(self.tables.read().await.tutors.get(&id).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables.tutors.values().any(|t| t.email == email))
    }

    async fn mark_verified(&self, email: &str) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.tutors.values_mut().find(|t| t.email == email) {
            Some(tutor) => {
                tutor.is_verified = true;
                tutor.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.tutors.values_mut().find(|t| t.email == email) {
            Some(tutor) => {
                tutor.password_hash = password_hash.to_string();
                tutor.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_subject(&self, id: Uuid, subject_id: Uuid) -> Result<Option<Tutor>> {
        let mut tables = self.tables.write().await;
        Ok(tables.tutors.get_mut(&id).map(|tutor| {
            tutor.subject_id = Some(subject_id);
            tutor.updated_at = Utc::now();
            tutor.clone()
        }))
    }

    async fn list(&self, subject_id: Option<Uuid>) -> Result<Vec<Tutor>> {
        let tables = self.tables.read().await;
        let mut tutors: Vec<Tutor> = tables
            .tutors
            .values()
            .filter(|t| subject_id.is_none() || t.subject_id == subject_id)
            .cloned()
            .collect();
        tutors.sort_by_key(|t| t.created_at);
        Ok(tutors)
    }
}

#[async_trait]
impl StudentRepository for MemoryStore {
    async fn create(&self, account: NewAccount) -> Result<Student> {
        let mut tables = self.tables.write().await;
        if tables.students.values().any(|s| s.email == account.email) {
            return Err(AppError::conflict("resource already exists"));
        }

        let now = Utc::now();
        let student = Student {
            id: Uuid::new_v4(),
            email: account.email,
            password_hash: account.password_hash,
            first_name: account.first_name,
            last_name: account.last_name,
            is_verified: false,
            role: Role::Student,
            subjects: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        tables.students.insert(student.id, student.clone());
        Ok(student)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Student>> {
        let tables = self.tables.read().await;
        Ok(tables.students.values().find(|s| s.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Student>> {
        Ok(self.tables.read().await.students.get(&id).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables.students.values().any(|s| s.email == email))
    }

    async fn mark_verified(&self, email: &str, subjects: &[Uuid]) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.students.values_mut().find(|s| s.email == email) {
            Some(student) => {
                student.is_verified = true;
                student.subjects = subjects.to_vec();
                student.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.students.values_mut().find(|s| s.email == email) {
            Some(student) => {
                student.password_hash = password_hash.to_string();
                student.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn add_subject(&self, id: Uuid, subject_id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.students.get_mut(&id) {
            Some(student) if !student.subjects.contains(&subject_id) => {
                student.subjects.push(subject_id);
                student.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl SubjectRepository for MemoryStore {
    async fn create(&self, subject: Subject) -> Result<Subject> {
        let mut tables = self.tables.write().await;
        if tables.subjects.values().any(|s| s.name == subject.name) {
            return Err(AppError::conflict("resource already exists"));
        }
        tables.subjects.insert(subject.id, subject.clone());
        Ok(subject)
    }

    async fn create_many(&self, subjects: Vec<Subject>) -> Result<()> {
        let mut tables = self.tables.write().await;
        for subject in subjects {
            if !tables.subjects.values().any(|s| s.name == subject.name) {
                tables.subjects.insert(subject.id, subject);
            }
        }
        Ok(())
    }

    async fn exists_by_name(&self, name: &str) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables.subjects.values().any(|s| s.name == name))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subject>> {
        Ok(self.tables.read().await.subjects.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Subject>> {
        let tables = self.tables.read().await;
        let subjects = ids
            .iter()
            .filter_map(|id| tables.subjects.get(id).cloned())
            .collect();
        Ok(sorted_by_name(subjects))
    }

    async fn list_compulsory(&self) -> Result<Vec<Subject>> {
        let tables = self.tables.read().await;
        let subjects = tables.subjects.values().filter(|s| s.compulsory).cloned().collect();
        Ok(sorted_by_name(subjects))
    }

    async fn list(&self) -> Result<Vec<Subject>> {
        let tables = self.tables.read().await;
        Ok(sorted_by_name(tables.subjects.values().cloned().collect()))
    }
}

#[async_trait]
impl EnrollmentRepository for MemoryStore {
    async fn create(&self, enrollment: Enrollment) -> Result<Enrollment> {
        let mut tables = self.tables.write().await;
        if tables
            .enrollments
            .iter()
            .any(|e| e.student_id == enrollment.student_id && e.tutor_id == enrollment.tutor_id)
        {
            return Err(AppError::conflict("resource already exists"));
        }
        tables.enrollments.push(enrollment.clone());
        Ok(enrollment)
    }

    async fn exists(&self, student_id: Uuid, tutor_id: Uuid) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .enrollments
            .iter()
            .any(|e| e.student_id == student_id && e.tutor_id == tutor_id))
    }

    async fn list_by_student(&self, student_id: Uuid) -> Result<Vec<RegisteredTutor>> {
        let tables = self.tables.read().await;
        Ok(tables
            .enrollments
            .iter()
            .filter(|e| e.student_id == student_id)
            .filter_map(|e| {
                tables.tutors.get(&e.tutor_id).map(|t| RegisteredTutor {
                    tutor_id: t.id,
                    email: t.email.clone(),
                    first_name: t.first_name.clone(),
                    last_name: t.last_name.clone(),
                    subject_id: e.subject_id,
                    registered_at: e.created_at,
                })
            })
            .collect())
    }
}

#[async_trait]
impl VerificationTokenRepository for MemoryStore {
    async fn insert(&self, token: VerificationToken) -> Result<()> {
        self.tables.write().await.verification_tokens.push(token);
        Ok(())
    }

    async fn find_latest_by_email(&self, email: &str) -> Result<Option<VerificationToken>> {
        let now = Utc::now();
        let tables = self.tables.read().await;
        Ok(tables
            .verification_tokens
            .iter()
            .filter(|t| t.email == email && t.expires_at > now)
            .max_by_key(|t| t.created_at)
            .cloned())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.verification_tokens.len();
        tables.verification_tokens.retain(|t| t.expires_at > now);
        Ok((before - tables.verification_tokens.len()) as u64)
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn replace_for_user(&self, session: AccessDetails) -> Result<()> {
        self.tables.write().await.sessions.insert(session.user_id, session);
        Ok(())
    }

    async fn find_by_access_uuid(&self, access_uuid: Uuid) -> Result<Option<AccessDetails>> {
        let tables = self.tables.read().await;
        Ok(tables
            .sessions
            .values()
            .find(|s| s.access_uuid == access_uuid)
            .cloned())
    }

    async fn delete_by_access_uuid(&self, access_uuid: Uuid) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| s.access_uuid != access_uuid);
        Ok((before - tables.sessions.len()) as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| s.expire_at > now);
        Ok((before - tables.sessions.len()) as u64)
    }
}
