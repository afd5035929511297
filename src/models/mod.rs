//! 数据模型模块
//! 账户（导师/学生）、认证令牌、科目与响应信封

pub mod auth;
pub mod response;
pub mod subject;
pub mod user;

pub use auth::{AccessDetails, AccessTokenDetails, TokenMetadata, VerificationToken};
pub use response::ApiResponse;
pub use subject::{Enrollment, RegisteredTutor, Subject};
pub use user::{Account, AccountKind, Role, Student, Tutor};
