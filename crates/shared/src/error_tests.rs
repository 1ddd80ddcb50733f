use rstest::rstest;

use super::*;

#[rstest]
#[case(AppError::Unauthorized("x".into()), 401, "UNAUTHORIZED")]
#[case(AppError::Forbidden("x".into()), 403, "FORBIDDEN")]
#[case(AppError::NotFound("x".into()), 404, "NOT_FOUND")]
#[case(AppError::Validation("x".into()), 400, "VALIDATION_ERROR")]
#[case(AppError::BusinessRule("x".into()), 422, "BUSINESS_RULE_VIOLATION")]
#[case(AppError::Conflict("x".into()), 409, "CONFLICT")]
#[case(AppError::Database("x".into()), 500, "DATABASE_ERROR")]
#[case(AppError::Internal("x".into()), 500, "INTERNAL_ERROR")]
fn test_status_and_code(#[case] err: AppError, #[case] status: u16, #[case] code: &str) {
    assert_eq!(err.status_code(), status);
    assert_eq!(err.error_code(), code);
}

#[test]
fn test_error_display() {
    assert_eq!(
        AppError::Unauthorized("msg".into()).to_string(),
        "Authentication failed: msg"
    );
    assert_eq!(
        AppError::Forbidden("msg".into()).to_string(),
        "Access denied: msg"
    );
    assert_eq!(
        AppError::Validation("msg".into()).to_string(),
        "Validation error: msg"
    );
}

#[test]
fn test_message_strips_prefix() {
    let err = AppError::Conflict("username taken".into());
    assert_eq!(err.message(), "username taken");
}

#[test]
fn test_server_errors_are_flagged() {
    assert!(AppError::Database("boom".into()).is_server_error());
    assert!(AppError::Internal("boom".into()).is_server_error());
    assert!(!AppError::NotFound("asset".into()).is_server_error());
}

#[test]
fn test_not_found_helper() {
    let err = AppError::not_found("asset", 42);
    assert_eq!(err.message(), "asset 42 not found");
    assert_eq!(err.status_code(), 404);
}

#[rstest]
#[case(400, "VALIDATION_ERROR")]
#[case(403, "FORBIDDEN")]
#[case(409, "CONFLICT")]
#[case(422, "BUSINESS_RULE_VIOLATION")]
#[case(500, "INTERNAL_ERROR")]
#[case(418, "INTERNAL_ERROR")]
fn test_from_status(#[case] status: u16, #[case] code: &str) {
    let err = AppError::from_status(status, "boom");
    assert_eq!(err.error_code(), code);
    assert_eq!(err.message(), "boom");
}
