//! Authentication and authorization module

pub mod authorization;
pub mod identity;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod verification;

pub use authorization::{role_gate_middleware, CurrentStudent, CurrentTutor, RoleGate};
pub use identity::IdentityResolver;
pub use jwt::{AccessClaims, AccessTokenManager, TokenError};
pub use middleware::{authenticate, extract_token, jwt_auth_middleware, AuthContext};
pub use password::PasswordHasher;
pub use verification::{build_link, generate_token, TokenPurpose, VerificationTokenManager};
