//! 服务层集成测试（内存后端）
//!
//! 覆盖注册、验证、登录、登出、找回密码与选课流程

use edu_service::{
    auth::{authenticate, AuthContext},
    error::{AppError, AuthRejection},
    models::{
        auth::{LoginRequest, ResetPasswordRequest},
        user::{NewAccount, SignUpRequest},
        Account, AccountKind, Student, Tutor,
    },
    repository::{StudentRepository, TutorRepository},
};

mod common;
use common::{create_test_app, token_from_link, TestApp};

fn sign_up_request(email: &str, password: &str) -> SignUpRequest {
    SignUpRequest {
        email: email.to_string(),
        password: password.to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
    }
}

fn login_request(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

async fn sign_up_and_verify(app: &TestApp, kind: AccountKind, email: &str, password: &str) -> Account {
    app.state
        .account_service
        .sign_up(kind, sign_up_request(email, password))
        .await
        .unwrap();

    let link = app.notifier.last_link_for(email).unwrap();
    app.state
        .auth_service
        .verify(&token_from_link(&link), email)
        .await
        .unwrap();

    app.state.resolver.resolve_by_email(email).await.unwrap()
}

fn as_student(account: Account) -> Student {
    match account {
        Account::Student(student) => student,
        Account::Tutor(_) => panic!("expected student"),
    }
}

fn as_tutor(account: Account) -> Tutor {
    match account {
        Account::Tutor(tutor) => tutor,
        Account::Student(_) => panic!("expected tutor"),
    }
}

#[tokio::test]
async fn test_student_lifecycle_login_before_and_after_verify() {
    let app = create_test_app().await;
    let auth = &app.state.auth_service;

    app.state
        .account_service
        .sign_up(AccountKind::Student, sign_up_request("a@x.com", "pw1"))
        .await
        .unwrap();

    // 未验证时不能登录
    let err = auth.login(login_request("a@x.com", "pw1")).await.unwrap_err();
    assert_eq!(err.code(), 403);
    assert_eq!(err.user_message(), "student not verified");

    let link = app.notifier.last_link_for("a@x.com").unwrap();
    assert!(link.starts_with("http://localhost:8000/api/v1/verify/"));
    assert!(link.ends_with("?email=a%40x.com"));
    auth.verify(&token_from_link(&link), "a@x.com").await.unwrap();

    let response = auth.login(login_request("a@x.com", "pw1")).await.unwrap();
    let details = &response.token_details;
    let expected = (chrono::Utc::now() + chrono::Duration::days(7)).timestamp();
    assert!((details.at_expires - expected).abs() <= 5);

    let ctx = authenticate(&app.state.tokens, Some(&details.access_token)).await.unwrap();
    assert_eq!(ctx.user_id, response.user.id());

    auth.logout(&ctx).await.unwrap();

    let err = authenticate(&app.state.tokens, Some(&details.access_token))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthenticated(AuthRejection::InvalidToken)));
}

#[tokio::test]
async fn test_verified_student_gets_compulsory_subjects() {
    let app = create_test_app().await;
    let student = as_student(sign_up_and_verify(&app, AccountKind::Student, "s@x.com", "pw1").await);

    assert!(student.is_verified);
    let subjects = app.state.student_service.list_subjects(&student).await.unwrap();
    assert_eq!(subjects.len(), 1);
    assert_eq!(subjects[0].name, "English");
    assert!(subjects[0].compulsory);
}

#[tokio::test]
async fn test_verify_rejects_wrong_token() {
    let app = create_test_app().await;
    app.state
        .account_service
        .sign_up(AccountKind::Tutor, sign_up_request("t@x.com", "pw1"))
        .await
        .unwrap();

    let err = app.state.auth_service.verify("deadbeef", "t@x.com").await.unwrap_err();
    assert_eq!(err.code(), 400);
    assert_eq!(err.user_message(), "invalid token");
}

#[tokio::test]
async fn test_sign_up_duplicate_email_conflicts_across_kinds() {
    let app = create_test_app().await;
    let accounts = &app.state.account_service;

    accounts
        .sign_up(AccountKind::Tutor, sign_up_request("dup@x.com", "pw1"))
        .await
        .unwrap();

    let err = accounts
        .sign_up(AccountKind::Student, sign_up_request("dup@x.com", "pw1"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), 409);
    assert_eq!(err.user_message(), "student already exists");
}

#[tokio::test]
async fn test_sign_up_enforces_password_policy() {
    let app = create_test_app().await;
    let err = app
        .state
        .account_service
        .sign_up(AccountKind::Student, sign_up_request("a@x.com", "pw"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), 400);
    assert!(app.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_login_failures() {
    let app = create_test_app().await;
    sign_up_and_verify(&app, AccountKind::Tutor, "t@x.com", "pw1").await;
    let auth = &app.state.auth_service;

    let err = auth.login(login_request("t@x.com", "wrong")).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));

    let err = auth.login(login_request("nobody@x.com", "pw1")).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));
}

#[tokio::test]
async fn test_unverified_login_is_forbidden_before_password_check() {
    let app = create_test_app().await;
    app.state
        .account_service
        .sign_up(AccountKind::Student, sign_up_request("a@x.com", "pw1"))
        .await
        .unwrap();

    let err = app
        .state
        .auth_service
        .login(login_request("a@x.com", "wrong"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), 403);
    assert_eq!(err.user_message(), "student not verified");
}

#[tokio::test]
async fn test_duplicate_email_resolves_to_tutor() {
    let app = create_test_app().await;
    let hasher = edu_service::auth::PasswordHasher::from_config(&app.state.config.security).unwrap();

    // 绕过注册检查，直接写入两个集合
    let account = NewAccount {
        email: "both@x.com".to_string(),
        password_hash: hasher.hash("pw1").unwrap(),
        first_name: "Both".to_string(),
        last_name: "Kinds".to_string(),
    };
    StudentRepository::create(app.state.repos.students.as_ref(), account.clone())
        .await
        .unwrap();
    TutorRepository::create(app.state.repos.tutors.as_ref(), account)
        .await
        .unwrap();

    for _ in 0..3 {
        let resolved = app.state.resolver.resolve_by_email("both@x.com").await.unwrap();
        assert_eq!(resolved.kind(), AccountKind::Tutor);
    }

    // 登录同样落在导师账户上
    let err = app
        .state
        .auth_service
        .login(login_request("both@x.com", "pw1"))
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "tutor not verified");
}

#[tokio::test]
async fn test_second_login_revokes_first_session() {
    let app = create_test_app().await;
    sign_up_and_verify(&app, AccountKind::Student, "a@x.com", "pw1").await;
    let auth = &app.state.auth_service;

    let first = auth.login(login_request("a@x.com", "pw1")).await.unwrap();
    let second = auth.login(login_request("a@x.com", "pw1")).await.unwrap();

    let err = authenticate(&app.state.tokens, Some(&first.token_details.access_token))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthenticated(AuthRejection::InvalidToken)));

    let ctx: AuthContext = authenticate(&app.state.tokens, Some(&second.token_details.access_token))
        .await
        .unwrap();
    assert_eq!(ctx.access_uuid, second.token_details.access_uuid);
}

#[tokio::test]
async fn test_forgot_and_reset_password() {
    let app = create_test_app().await;
    sign_up_and_verify(&app, AccountKind::Tutor, "t@x.com", "pw1").await;
    let auth = &app.state.auth_service;

    auth.forgot_password("t@x.com").await.unwrap();
    let link = app.notifier.last_link_for("t@x.com").unwrap();
    assert!(link.contains("/api/v1/verify-reset-token/"));

    // 错误令牌
    let err = auth
        .reset_password(ResetPasswordRequest {
            email: "t@x.com".to_string(),
            password: "newpw".to_string(),
            token: "bogus".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "invalid or expired token");

    auth.reset_password(ResetPasswordRequest {
        email: "t@x.com".to_string(),
        password: "newpw".to_string(),
        token: token_from_link(&link),
    })
    .await
    .unwrap();

    assert!(auth.login(login_request("t@x.com", "pw1")).await.is_err());
    assert!(auth.login(login_request("t@x.com", "newpw")).await.is_ok());
}

#[tokio::test]
async fn test_forgot_password_unknown_email() {
    let app = create_test_app().await;
    let err = app.state.auth_service.forgot_password("nobody@x.com").await.unwrap_err();
    assert_eq!(err.code(), 404);
    assert_eq!(err.user_message(), "invalid email");
    assert!(app.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_register_tutor_for_non_compulsory_subject() {
    let app = create_test_app().await;
    let state = &app.state;

    let student = as_student(sign_up_and_verify(&app, AccountKind::Student, "s@x.com", "pw1").await);
    let tutor = as_tutor(sign_up_and_verify(&app, AccountKind::Tutor, "t@x.com", "pw1").await);

    let physics = state.subject_service.create("Physics").await.unwrap();
    assert!(!physics.compulsory);

    state.tutor_service.assign_subject(&tutor, physics.id).await.unwrap();

    // 学生尚未登记该科目
    let err = state.student_service.register_tutor(&student, tutor.id).await.unwrap_err();
    assert_eq!(err.user_message(), "tutor's subject not registered by student");

    state.student_service.register_subject(&student, physics.id).await.unwrap();
    let student = as_student(state.resolver.resolve_by_id(student.id, AccountKind::Student).await.unwrap());

    let enrollment = state.student_service.register_tutor(&student, tutor.id).await.unwrap();
    assert_eq!(enrollment.subject_id, physics.id);

    let err = state.student_service.register_tutor(&student, tutor.id).await.unwrap_err();
    assert_eq!(err.code(), 409);
    assert_eq!(err.user_message(), "tutor already registered");

    let tutors = state.student_service.list_tutors(&student).await.unwrap();
    assert_eq!(tutors.len(), 1);
    assert_eq!(tutors[0].tutor_id, tutor.id);
    assert_eq!(tutors[0].email, "t@x.com");
}

#[tokio::test]
async fn test_register_subject_errors() {
    let app = create_test_app().await;
    let state = &app.state;
    let student = as_student(sign_up_and_verify(&app, AccountKind::Student, "s@x.com", "pw1").await);

    let err = state
        .student_service
        .register_subject(&student, uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "subject does not exist");

    // 必修科目在验证时已登记
    let english = student.subjects[0];
    let err = state.student_service.register_subject(&student, english).await.unwrap_err();
    assert_eq!(err.code(), 409);
    assert_eq!(err.user_message(), "subject already registered");
}

#[tokio::test]
async fn test_tutor_directory_filter() {
    let app = create_test_app().await;
    let state = &app.state;
    let t1 = as_tutor(sign_up_and_verify(&app, AccountKind::Tutor, "t1@x.com", "pw1").await);
    sign_up_and_verify(&app, AccountKind::Tutor, "t2@x.com", "pw1").await;

    let chemistry = state.subject_service.create("Chemistry").await.unwrap();
    state.tutor_service.assign_subject(&t1, chemistry.id).await.unwrap();

    assert_eq!(state.tutor_service.list(None).await.unwrap().len(), 2);
    let filtered = state.tutor_service.list(Some(chemistry.id)).await.unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id, t1.id);
}
