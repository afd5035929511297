//! 身份解析
//! 邮箱在导师、学生两个集合中依次查找，先查导师

use crate::{
    error::{AppError, Result},
    models::{Account, AccountKind},
    repository::{StudentRepository, TutorRepository},
};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct IdentityResolver {
    tutors: Arc<dyn TutorRepository>,
    students: Arc<dyn StudentRepository>,
}

impl IdentityResolver {
    pub fn new(tutors: Arc<dyn TutorRepository>, students: Arc<dyn StudentRepository>) -> Self {
        Self { tutors, students }
    }

    /// 按邮箱查找账户，两个集合都没有时返回 `Ok(None)`
    ///
    /// 同一邮箱同时存在于两个集合时总是返回导师
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        if let Some(tutor) = self.tutors.find_by_email(email).await? {
            return Ok(Some(Account::Tutor(tutor)));
        }

        Ok(self.students.find_by_email(email).await?.map(Account::Student))
    }

    pub async fn resolve_by_email(&self, email: &str) -> Result<Account> {
        self.find_by_email(email)
            .await?
            .ok_or_else(|| AppError::not_found("invalid email"))
    }

    pub async fn resolve_by_id(&self, id: Uuid, kind: AccountKind) -> Result<Account> {
        let account = match kind {
            AccountKind::Tutor => self.tutors.find_by_id(id).await?.map(Account::Tutor),
            AccountKind::Student => self.students.find_by_id(id).await?.map(Account::Student),
        };

        account.ok_or_else(|| AppError::NotFound(format!("{} not found", kind.label())))
    }

    /// 邮箱是否已被任一集合占用（先查导师）
    pub async fn email_taken(&self, email: &str) -> Result<Option<AccountKind>> {
        if self.tutors.exists_by_email(email).await? {
            return Ok(Some(AccountKind::Tutor));
        }
        if self.students.exists_by_email(email).await? {
            return Ok(Some(AccountKind::Student));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::user::NewAccount, repository::MemoryStore};

    fn account(email: &str) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
        }
    }

    #[tokio::test]
    async fn test_tutor_wins_duplicate_email() {
        let store = Arc::new(MemoryStore::new());
        let resolver = IdentityResolver::new(store.clone(), store.clone());

        StudentRepository::create(store.as_ref(), account("dup@x.com")).await.unwrap();
        TutorRepository::create(store.as_ref(), account("dup@x.com")).await.unwrap();

        let resolved = resolver.resolve_by_email("dup@x.com").await.unwrap();
        assert_eq!(resolved.kind(), AccountKind::Tutor);
        assert_eq!(resolver.email_taken("dup@x.com").await.unwrap(), Some(AccountKind::Tutor));
    }

    #[tokio::test]
    async fn test_unknown_email_not_found() {
        let store = Arc::new(MemoryStore::new());
        let resolver = IdentityResolver::new(store.clone(), store);

        let err = resolver.resolve_by_email("nobody@x.com").await.unwrap_err();
        assert_eq!(err.user_message(), "invalid email");
    }

    #[tokio::test]
    async fn test_resolve_by_id_respects_kind() {
        let store = Arc::new(MemoryStore::new());
        let resolver = IdentityResolver::new(store.clone(), store.clone());
        let student = StudentRepository::create(store.as_ref(), account("s@x.com")).await.unwrap();

        assert!(resolver.resolve_by_id(student.id, AccountKind::Student).await.is_ok());
        assert!(matches!(
            resolver.resolve_by_id(student.id, AccountKind::Tutor).await,
            Err(AppError::NotFound(_))
        ));
    }
}
