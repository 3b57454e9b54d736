// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use streak_client::error::ApiError;

#[test]
fn test_business_rejections() {
    assert!(ApiError::AlreadyMember.is_business_rejection());
    assert!(ApiError::AlreadyCompleted.is_business_rejection());
    assert!(ApiError::NotMember.is_business_rejection());

    assert!(!ApiError::SessionExpired.is_business_rejection());
    let err = ApiError::Validation {
        status: 400,
        message: "Bad Request".to_string(),
    };
    assert!(!err.is_business_rejection());
}

#[test]
fn test_requires_login() {
    assert!(ApiError::Unauthenticated.requires_login());
    assert!(ApiError::SessionExpired.requires_login());

    assert!(!ApiError::InvalidCredentials("Invalid email or password".to_string()).requires_login());
    assert!(!ApiError::Timeout("server response").requires_login());
}

#[test]
fn test_status_codes() {
    let err = ApiError::Transient {
        status: None,
        message: "connection refused".to_string(),
    };
    assert_eq!(err.status(), None);

    let err = ApiError::Validation {
        status: 422,
        message: "field required".to_string(),
    };
    assert_eq!(err.status(), Some(422));
    assert_eq!(err.to_string(), "Request rejected (422): field required");
}
