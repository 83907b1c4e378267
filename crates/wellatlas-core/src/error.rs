//! Error types for wellatlas.

use thiserror::Error;

/// Result type alias using wellatlas's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for wellatlas operations.
///
/// A duplicate customer name is deliberately absent from this taxonomy:
/// customer creation resolves to the existing row instead of failing.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Unknown id, unknown or stale share token, or a deleted target
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing required field or malformed value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for a `NotFound` naming the entity kind and id.
    pub fn not_found(kind: &str, id: impl std::fmt::Display) -> Self {
        Error::NotFound(format!("{} {} not found", kind, id))
    }

    /// Whether this error is a unique-constraint violation reported by the store.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("test resource".to_string());
        assert_eq!(err.to_string(), "Not found: test resource");
    }

    #[test]
    fn test_not_found_helper_names_kind_and_id() {
        let id = Uuid::nil();
        let err = Error::not_found("Site", id);
        assert_eq!(
            err.to_string(),
            format!("Not found: Site {} not found", id)
        );
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("customer_name is required".to_string());
        assert_eq!(err.to_string(), "Invalid input: customer_name is required");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("unknown SITE_LIST_ORDER".to_string());
        assert_eq!(err.to_string(), "Configuration error: unknown SITE_LIST_ORDER");
    }

    #[test]
    fn test_error_display_internal() {
        let err = Error::Internal("unexpected state".to_string());
        assert_eq!(err.to_string(), "Internal error: unexpected state");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_non_database_error_is_not_unique_violation() {
        assert!(!Error::NotFound("x".to_string()).is_unique_violation());
        assert!(!Error::Database(sqlx::Error::RowNotFound).is_unique_violation());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
