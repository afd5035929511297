//! Business logic services layer

pub mod account_service;
pub mod auth_service;
pub mod student_service;
pub mod subject_service;
pub mod tutor_service;

pub use account_service::AccountService;
pub use auth_service::AuthService;
pub use student_service::StudentService;
pub use subject_service::SubjectService;
pub use tutor_service::TutorService;
