//! 账户注册服务

use crate::{
    auth::{
        build_link, generate_token, IdentityResolver, PasswordHasher, TokenPurpose,
        VerificationTokenManager,
    },
    error::{AppError, Result},
    models::{
        user::{NewAccount, SignUpRequest},
        Account, AccountKind,
    },
    notify::Notifier,
    repository::{StudentRepository, TutorRepository},
};
use std::sync::Arc;

pub struct AccountService {
    resolver: IdentityResolver,
    tutors: Arc<dyn TutorRepository>,
    students: Arc<dyn StudentRepository>,
    hasher: PasswordHasher,
    verification: Arc<VerificationTokenManager>,
    notifier: Arc<dyn Notifier>,
    api_base_url: String,
    password_min_length: usize,
}

impl AccountService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        resolver: IdentityResolver,
        tutors: Arc<dyn TutorRepository>,
        students: Arc<dyn StudentRepository>,
        hasher: PasswordHasher,
        verification: Arc<VerificationTokenManager>,
        notifier: Arc<dyn Notifier>,
        api_base_url: String,
        password_min_length: usize,
    ) -> Self {
        Self {
            resolver,
            tutors,
            students,
            hasher,
            verification,
            notifier,
            api_base_url,
            password_min_length,
        }
    }

    /// 注册账户并发送验证邮件
    ///
    /// 账户创建后的步骤失败不会回滚，需要重新触发验证
    pub async fn sign_up(&self, kind: AccountKind, req: SignUpRequest) -> Result<Account> {
        PasswordHasher::validate_password_policy(&req.password, self.password_min_length)?;

        // 两个集合依次检查，不是原子操作
        if self.resolver.email_taken(&req.email).await?.is_some() {
            tracing::debug!(email = %req.email, "Sign-up rejected, email in use");
            return Err(AppError::conflict(match kind {
                AccountKind::Student => "student already exists",
                AccountKind::Tutor => "user already exists",
            }));
        }

        let new_account = NewAccount {
            email: req.email,
            password_hash: self.hasher.hash(&req.password)?,
            first_name: req.first_name,
            last_name: req.last_name,
        };

        let account = match kind {
            AccountKind::Tutor => Account::Tutor(self.tutors.create(new_account).await?),
            AccountKind::Student => Account::Student(self.students.create(new_account).await?),
        };

        tracing::info!(
            user_id = %account.id(),
            kind = kind.label(),
            "Account created"
        );

        let raw_token = generate_token();
        self.verification
            .issue_and_store(account.email(), &raw_token, TokenPurpose::SignUp)
            .await?;

        let link = build_link(
            &self.api_base_url,
            TokenPurpose::SignUp.link_path(),
            &raw_token,
            account.email(),
        )?;

        self.notifier
            .send_sign_up_verification(account.email(), account.first_name(), &link)
            .await?;

        Ok(account)
    }
}
