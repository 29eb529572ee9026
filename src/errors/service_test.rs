#[cfg(test)]
mod tests {
    use crate::errors::internal::{DatabaseError, InternalError, TokenError, ValidationError};
    use crate::errors::{ErrorKind, ServiceError};

    #[test]
    fn test_validation_errors_become_bad_request() {
        let err = ServiceError::from_internal(
            "create_role",
            ValidationError::Empty { field: "name" }.into(),
        );

        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "Bad request: name must not be empty");
    }

    #[test]
    fn test_duplicate_and_not_found_keep_their_kinds() {
        let duplicate = ServiceError::from_internal(
            "create_user",
            InternalError::duplicate("user", "username", "alice"),
        );
        assert_eq!(duplicate.kind(), ErrorKind::DuplicateKey);
        assert_eq!(duplicate.status_code(), 409);
        assert!(duplicate.to_string().contains("alice"));

        let missing = ServiceError::from_internal("get_role", InternalError::not_found("role", 7));
        assert_eq!(missing.kind(), ErrorKind::NotFound);
        assert_eq!(missing.to_string(), "Not found: role not found: 7");
    }

    #[test]
    fn test_storage_failures_hide_engine_details() {
        let source = sea_orm::DbErr::Custom("disk I/O error at page 42".to_string());
        let err = ServiceError::from_internal("list_users", InternalError::database("list_users", source));

        assert_eq!(err, ServiceError::InternalServerError("list_users failed".to_string()));
        assert!(!err.to_string().contains("disk"));
    }

    #[test]
    fn test_transaction_begin_failure_is_classified() {
        let err = ServiceError::from_internal(
            "add_user_role",
            InternalError::Database(DatabaseError::TransactionBegin {
                source: sea_orm::DbErr::Custom("pool timed out".to_string()),
            }),
        );

        assert_eq!(err.kind(), ErrorKind::TransactionStartFailed);
        assert!(!err.to_string().contains("pool"));
    }

    #[test]
    fn test_token_errors_map_to_token_kinds() {
        let cases = [
            (TokenError::DecryptionFailed, ErrorKind::DecryptionFailed),
            (TokenError::Malformed("missing header"), ErrorKind::DecryptionFailed),
            (TokenError::KeyUnavailable, ErrorKind::DecryptionFailed),
            (TokenError::Expired { expires_at: 10, now: 11 }, ErrorKind::TokenExpired),
            (TokenError::NotYetValid { not_before: 10, now: 9 }, ErrorKind::TokenNotYetValid),
            (TokenError::KeySizeInvalid { expected: 32, actual: 16 }, ErrorKind::KeySizeInvalid),
        ];

        for (token_err, kind) in cases {
            let err = ServiceError::from_internal("verify_token", token_err.into());
            assert_eq!(err.kind(), kind);
        }
    }

    #[test]
    fn test_auth_failures_share_unauthorized_status() {
        assert_eq!(ServiceError::InvalidCredentials.status_code(), 401);
        assert_eq!(ServiceError::TokenExpired.status_code(), 401);
        assert_eq!(ServiceError::Forbidden("reports.read".to_string()).status_code(), 403);
        assert_eq!(ErrorKind::DuplicateKey.to_string(), "duplicate_key");
    }
}
