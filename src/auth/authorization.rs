//! 角色授权
//! 按要求的角色重新查询调用者账户，角色必须完全一致

use crate::{
    auth::{identity::IdentityResolver, middleware::AuthContext},
    error::{AppError, AuthRejection, Result},
    models::{Account, AccountKind, Role, Student, Tutor},
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

const ROLE_MISMATCH: &str = "Forbidden: You are not authorized to access this resource";

/// 路由级角色门禁
#[derive(Clone)]
pub struct RoleGate {
    resolver: IdentityResolver,
    required: Role,
}

impl RoleGate {
    pub fn new(resolver: IdentityResolver, required: Role) -> Self {
        Self { resolver, required }
    }

    pub fn required(&self) -> Role {
        self.required
    }

    /// 校验用户是否具有所需角色，成功时返回其账户
    pub async fn authorize(&self, user_id: Uuid) -> Result<Account> {
        let Some(kind) = AccountKind::from_role(self.required) else {
            return Err(AppError::forbidden("invalid role"));
        };

        let account = self.resolver.resolve_by_id(user_id, kind).await.map_err(|e| {
            tracing::debug!(user_id = %user_id, error = %e, "Role lookup failed");
            AppError::Forbidden(format!(
                "{}: you are not authorized to access this resource",
                kind.label()
            ))
        })?;

        if account.role() != self.required {
            tracing::warn!(
                user_id = %user_id,
                required = %self.required,
                actual = %account.role(),
                "Role mismatch"
            );
            return Err(AppError::forbidden(ROLE_MISMATCH));
        }

        Ok(account)
    }
}

/// 角色授权中间件，须位于认证中间件之后
pub async fn role_gate_middleware(
    State(gate): State<RoleGate>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let ctx = req
        .extensions()
        .get::<AuthContext>()
        .copied()
        .ok_or(AppError::Unauthenticated(AuthRejection::MissingToken))?;

    let account = gate.authorize(ctx.user_id).await?;
    req.extensions_mut().insert(account);

    Ok(next.run(req).await)
}

fn current_account(parts: &Parts) -> Result<Account> {
    parts
        .extensions
        .get::<Account>()
        .cloned()
        .ok_or_else(|| AppError::forbidden(ROLE_MISMATCH))
}

/// 已通过导师门禁的调用者
#[derive(Debug, Clone)]
pub struct CurrentTutor(pub Tutor);

impl<S> FromRequestParts<S> for CurrentTutor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        match current_account(parts)? {
            Account::Tutor(tutor) => Ok(CurrentTutor(tutor)),
            Account::Student(_) => Err(AppError::forbidden(ROLE_MISMATCH)),
        }
    }
}

/// 已通过学生门禁的调用者
#[derive(Debug, Clone)]
pub struct CurrentStudent(pub Student);

impl<S> FromRequestParts<S> for CurrentStudent
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        match current_account(parts)? {
            Account::Student(student) => Ok(CurrentStudent(student)),
            Account::Tutor(_) => Err(AppError::forbidden(ROLE_MISMATCH)),
        }
    }
}
