//! 学生服务：登记科目与导师

use crate::{
    error::{AppError, Result},
    models::{Enrollment, RegisteredTutor, Student, Subject},
    repository::{EnrollmentRepository, StudentRepository, SubjectRepository, TutorRepository},
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

pub struct StudentService {
    students: Arc<dyn StudentRepository>,
    tutors: Arc<dyn TutorRepository>,
    subjects: Arc<dyn SubjectRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
}

impl StudentService {
    pub fn new(
        students: Arc<dyn StudentRepository>,
        tutors: Arc<dyn TutorRepository>,
        subjects: Arc<dyn SubjectRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
    ) -> Self {
        Self {
            students,
            tutors,
            subjects,
            enrollments,
        }
    }

    /// 登记科目
    pub async fn register_subject(&self, student: &Student, subject_id: Uuid) -> Result<()> {
        if self.subjects.find_by_id(subject_id).await?.is_none() {
            return Err(AppError::not_found("subject does not exist"));
        }

        if student.subjects.contains(&subject_id)
            || !self.students.add_subject(student.id, subject_id).await?
        {
            return Err(AppError::conflict("subject already registered"));
        }

        tracing::info!(student_id = %student.id, subject_id = %subject_id, "Subject registered");
        Ok(())
    }

    /// 学生已登记的科目
    pub async fn list_subjects(&self, student: &Student) -> Result<Vec<Subject>> {
        if student.subjects.is_empty() {
            return Ok(Vec::new());
        }
        self.subjects.find_by_ids(&student.subjects).await
    }

    /// 登记导师，导师所教科目必须已被学生登记
    pub async fn register_tutor(&self, student: &Student, tutor_id: Uuid) -> Result<Enrollment> {
        let tutor = self
            .tutors
            .find_by_id(tutor_id)
            .await?
            .ok_or_else(|| AppError::not_found("tutor does not exist"))?;

        let subject_id = tutor
            .subject_id
            .filter(|id| student.subjects.contains(id))
            .ok_or_else(|| AppError::validation("tutor's subject not registered by student"))?;

        if self.enrollments.exists(student.id, tutor.id).await? {
            return Err(AppError::conflict("tutor already registered"));
        }

        let now = Utc::now();
        let enrollment = self
            .enrollments
            .create(Enrollment {
                id: Uuid::new_v4(),
                student_id: student.id,
                tutor_id: tutor.id,
                subject_id,
                created_at: now,
                updated_at: now,
            })
            .await
            .map_err(|e| match e {
                AppError::Conflict(_) => AppError::conflict("tutor already registered"),
                other => other,
            })?;

        tracing::info!(student_id = %student.id, tutor_id = %tutor.id, "Tutor registered");
        Ok(enrollment)
    }

    /// 学生已登记的导师
    pub async fn list_tutors(&self, student: &Student) -> Result<Vec<RegisteredTutor>> {
        self.enrollments.list_by_student(student.id).await
    }
}
