//! 认证服务：邮箱验证、登录、登出、找回密码

use crate::{
    auth::{
        build_link, generate_token, AccessTokenManager, AuthContext, IdentityResolver,
        PasswordHasher, TokenPurpose, VerificationTokenManager,
    },
    error::{AppError, Result},
    models::{
        auth::{LoginRequest, LoginResponse, ResetPasswordRequest},
        Account,
    },
    notify::Notifier,
    repository::{StudentRepository, SubjectRepository, TutorRepository},
};
use std::sync::Arc;
use uuid::Uuid;

pub struct AuthService {
    resolver: IdentityResolver,
    tutors: Arc<dyn TutorRepository>,
    students: Arc<dyn StudentRepository>,
    subjects: Arc<dyn SubjectRepository>,
    hasher: PasswordHasher,
    tokens: Arc<AccessTokenManager>,
    verification: Arc<VerificationTokenManager>,
    notifier: Arc<dyn Notifier>,
    api_base_url: String,
    password_min_length: usize,
}

impl AuthService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        resolver: IdentityResolver,
        tutors: Arc<dyn TutorRepository>,
        students: Arc<dyn StudentRepository>,
        subjects: Arc<dyn SubjectRepository>,
        hasher: PasswordHasher,
        tokens: Arc<AccessTokenManager>,
        verification: Arc<VerificationTokenManager>,
        notifier: Arc<dyn Notifier>,
        api_base_url: String,
        password_min_length: usize,
    ) -> Self {
        Self {
            resolver,
            tutors,
            students,
            subjects,
            hasher,
            tokens,
            verification,
            notifier,
            api_base_url,
            password_min_length,
        }
    }

    /// 邮箱验证
    ///
    /// 学生验证时同时登记全部必修科目
    pub async fn verify(&self, raw_token: &str, email: &str) -> Result<()> {
        if !self.verification.validate(email, raw_token).await? {
            tracing::debug!(email = %email, "Verification token rejected");
            return Err(AppError::validation("invalid token"));
        }

        match self.resolver.resolve_by_email(email).await? {
            Account::Tutor(tutor) => {
                self.tutors.mark_verified(&tutor.email).await?;
            }
            Account::Student(student) => {
                let compulsory: Vec<Uuid> = self
                    .subjects
                    .list_compulsory()
                    .await?
                    .into_iter()
                    .map(|s| s.id)
                    .collect();
                self.students.mark_verified(&student.email, &compulsory).await?;
            }
        }

        tracing::info!(email = %email, "Account verified");
        Ok(())
    }

    /// 用户登录
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse> {
        let Some(account) = self.resolver.find_by_email(&req.email).await? else {
            record_login("unknown_email");
            return Err(AppError::InvalidCredentials);
        };

        if !account.is_verified() {
            record_login("unverified");
            return Err(AppError::Forbidden(format!(
                "{} not verified",
                account.kind().label()
            )));
        }

        if !self.hasher.verify(&req.password, account.password_hash()) {
            record_login("bad_password");
            tracing::debug!(user_id = %account.id(), "Login failed: wrong password");
            return Err(AppError::InvalidCredentials);
        }

        let token_details = self.tokens.issue(account.id())?;
        self.tokens.persist(account.id(), &token_details).await?;

        record_login("success");
        tracing::info!(
            user_id = %account.id(),
            kind = account.kind().label(),
            "User logged in"
        );

        Ok(LoginResponse {
            user: account,
            token_details,
        })
    }

    /// 用户登出，吊销当前会话
    pub async fn logout(&self, ctx: &AuthContext) -> Result<()> {
        self.tokens.revoke(ctx.access_uuid).await?;
        tracing::info!(user_id = %ctx.user_id, "User logged out");
        Ok(())
    }

    /// 发送重置密码邮件
    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        let account = self.resolver.resolve_by_email(email).await?;

        let raw_token = generate_token();
        self.verification
            .issue_and_store(account.email(), &raw_token, TokenPurpose::PasswordReset)
            .await?;

        let link = build_link(
            &self.api_base_url,
            TokenPurpose::PasswordReset.link_path(),
            &raw_token,
            account.email(),
        )?;

        self.notifier
            .send_password_reset(account.email(), account.first_name(), &link)
            .await?;

        tracing::info!(user_id = %account.id(), "Password reset token sent");
        Ok(())
    }

    /// 重置密码
    pub async fn reset_password(&self, req: ResetPasswordRequest) -> Result<()> {
        if !self.verification.validate(&req.email, &req.token).await? {
            return Err(AppError::validation("invalid or expired token"));
        }

        PasswordHasher::validate_password_policy(&req.password, self.password_min_length)?;
        let password_hash = self.hasher.hash(&req.password)?;

        let updated = match self.resolver.resolve_by_email(&req.email).await? {
            Account::Tutor(tutor) => self.tutors.update_password(&tutor.email, &password_hash).await?,
            Account::Student(student) => {
                self.students.update_password(&student.email, &password_hash).await?
            }
        };

        if !updated {
            return Err(AppError::not_found("invalid email"));
        }

        tracing::info!(email = %req.email, "Password reset");
        Ok(())
    }
}

fn record_login(outcome: &'static str) {
    metrics::counter!("auth_login_total", "outcome" => outcome).increment(1);
}
