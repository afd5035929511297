//! 账户模型
//! 导师与学生分别存放在两个集合中，通过 `Account` 统一表示

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 账户角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 保留角色，当前没有路由使用
    Admin,
    Tutor,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Tutor => "tutor",
            Role::Student => "student",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 账户种类（决定查找哪个集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountKind {
    Tutor,
    Student,
}

impl AccountKind {
    pub fn role(&self) -> Role {
        match self {
            AccountKind::Tutor => Role::Tutor,
            AccountKind::Student => Role::Student,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AccountKind::Tutor => "tutor",
            AccountKind::Student => "student",
        }
    }

    /// 由角色推导账户种类，Admin 没有对应集合
    pub fn from_role(role: Role) -> Option<Self> {
        match role {
            Role::Tutor => Some(AccountKind::Tutor),
            Role::Student => Some(AccountKind::Student),
            Role::Admin => None,
        }
    }
}

/// 导师
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tutor {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_verified: bool,
    pub role: Role,
    pub approved: bool,
    /// 导师只教授一个科目
    pub subject_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 学生
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_verified: bool,
    pub role: Role,
    pub subjects: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 已解析的账户
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Account {
    Tutor(Tutor),
    Student(Student),
}

impl Account {
    pub fn kind(&self) -> AccountKind {
        match self {
            Account::Tutor(_) => AccountKind::Tutor,
            Account::Student(_) => AccountKind::Student,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Account::Tutor(t) => t.id,
            Account::Student(s) => s.id,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Account::Tutor(t) => &t.email,
            Account::Student(s) => &s.email,
        }
    }

    pub fn first_name(&self) -> &str {
        match self {
            Account::Tutor(t) => &t.first_name,
            Account::Student(s) => &s.first_name,
        }
    }

    pub fn password_hash(&self) -> &str {
        match self {
            Account::Tutor(t) => &t.password_hash,
            Account::Student(s) => &s.password_hash,
        }
    }

    pub fn is_verified(&self) -> bool {
        match self {
            Account::Tutor(t) => t.is_verified,
            Account::Student(s) => s.is_verified,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Account::Tutor(t) => t.role,
            Account::Student(s) => s.role,
        }
    }
}

/// 注册请求（学生与导师共用）
#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(email(message = "invalid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "first_name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "last_name is required"))]
    pub last_name: String,
}

/// 新账户（写入仓储前）
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}
