//! Unified error types for the data-access layer.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;

/// Unified error type for FleetDB.
///
/// Pagination input problems (`InvalidSortField`, `InvalidPageParams`) are
/// raised before any statement reaches the store. Store failures are carried
/// through unchanged in [`FleetError::Store`].
#[derive(Error, Debug)]
pub enum FleetError {
    // ============ Pagination Errors ============
    /// Requested order field is not in the entity's allow-list.
    #[error("Invalid sort field '{field}', expected one of: {}", .allowed.join(", "))]
    InvalidSortField { field: String, allowed: Vec<String> },

    /// Negative offset, non-positive limit, or malformed order direction.
    #[error("Invalid page parameters: {0}")]
    InvalidPageParams(String),

    // ============ Domain Errors ============
    /// Resource not found
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Conflict error (e.g., duplicate entry)
    #[error("Conflict: {0}")]
    Conflict(String),

    // ============ Infrastructure Errors ============
    /// Failure reported by the underlying store, passed through as-is.
    #[cfg(feature = "sqlx")]
    #[error(transparent)]
    Store(#[from] sqlx::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ============ Internal Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FleetError {
    /// Returns the HTTP status code an upper layer should use for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidSortField { .. } | Self::InvalidPageParams(_) | Self::Validation(_) => 400,
            Self::NotFound { .. } => 404,
            Self::Conflict(_) => 409,
            #[cfg(feature = "sqlx")]
            Self::Store(_) => 500,
            Self::Configuration(_) | Self::Internal(_) | Self::Other(_) => 500,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidSortField { .. } => "INVALID_SORT_FIELD",
            Self::InvalidPageParams(_) => "INVALID_PAGE_PARAMS",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            #[cfg(feature = "sqlx")]
            Self::Store(_) => "STORE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// True when the caller supplied bad input rather than the server failing.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Creates an invalid sort field error from the rejected field and its allow-list.
    #[must_use]
    pub fn invalid_sort_field(field: impl Into<String>, allowed: &[&str]) -> Self {
        Self::InvalidSortField {
            field: field.into(),
            allowed: allowed.iter().map(|f| (*f).to_string()).collect(),
        }
    }

    /// Creates an invalid page parameters error.
    #[must_use]
    pub fn invalid_page_params<T: Into<String>>(message: T) -> Self {
        Self::InvalidPageParams(message.into())
    }

    /// Creates a not found error for a resource.
    #[must_use]
    pub fn not_found<T: ToString>(resource_type: &'static str, id: T) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict<T: Into<String>>(message: T) -> Self {
        Self::Conflict(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }

    /// Converts a failed write into `Conflict` when it violated a unique constraint.
    ///
    /// Any other store error is returned unchanged.
    #[cfg(feature = "sqlx")]
    #[must_use]
    pub fn from_write_error(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            // PostgreSQL unique_violation
            if db_err.code().as_deref() == Some("23505") {
                return Self::Conflict(db_err.message().to_string());
            }
        }
        Self::Store(err)
    }
}

impl From<serde_json::Error> for FleetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON serialization error: {}", err))
    }
}

/// Serializable error response for upper layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional field-level errors for validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// Field-level validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name
    pub field: String,
    /// Error message
    pub message: String,
    /// Error code
    pub code: String,
}

impl ErrorResponse {
    /// Creates a new error response from a `FleetError`.
    #[must_use]
    pub fn from_error(error: &FleetError) -> Self {
        Self {
            code: error.error_code().to_string(),
            message: error.to_string(),
            details: None,
        }
    }

    /// Sets field-level validation errors.
    #[must_use]
    pub fn with_details(mut self, details: Vec<FieldError>) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<&FleetError> for ErrorResponse {
    fn from(error: &FleetError) -> Self {
        Self::from_error(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_errors_are_client_errors() {
        let err = FleetError::invalid_sort_field("password", &["name", "created"]);
        assert_eq!(err.status_code(), 400);
        assert!(err.is_client_error());
        assert_eq!(err.error_code(), "INVALID_SORT_FIELD");

        let err = FleetError::invalid_page_params("limit must be at least 1");
        assert_eq!(err.status_code(), 400);
        assert!(err.is_client_error());
        assert_eq!(err.error_code(), "INVALID_PAGE_PARAMS");
    }

    #[test]
    fn test_invalid_sort_field_message_lists_allowed_fields() {
        let err = FleetError::invalid_sort_field("password", &["name", "created"]);
        let message = err.to_string();
        assert!(message.contains("password"));
        assert!(message.contains("name, created"));
    }

    #[test]
    fn test_store_error_is_server_error() {
        let err = FleetError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(err.status_code(), 500);
        assert!(!err.is_client_error());
        assert_eq!(err.error_code(), "STORE_ERROR");
        assert!(matches!(err, FleetError::Store(sqlx::Error::PoolTimedOut)));
    }

    #[test]
    fn test_write_error_without_constraint_passes_through() {
        let err = FleetError::from_write_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, FleetError::Store(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(FleetError::not_found("SshKey", 1).status_code(), 404);
        assert_eq!(FleetError::validation("bad name").status_code(), 400);
        assert_eq!(FleetError::conflict("duplicate").status_code(), 409);
        assert_eq!(FleetError::internal("oops").status_code(), 500);
        assert_eq!(FleetError::Configuration("bad".to_string()).status_code(), 500);
    }

    #[test]
    fn test_client_error_covers_4xx_only() {
        assert!(FleetError::not_found("SshKey", 1).is_client_error());
        assert!(FleetError::conflict("duplicate").is_client_error());
        assert!(FleetError::validation("bad name").is_client_error());
        assert!(!FleetError::internal("oops").is_client_error());
        assert!(!FleetError::Configuration("bad".to_string()).is_client_error());
    }

    #[test]
    fn test_error_response_from_error() {
        let err = FleetError::not_found("Subnet", 7);
        let response = ErrorResponse::from_error(&err);
        assert_eq!(response.code, "NOT_FOUND");
        assert!(response.message.contains("Subnet"));
        assert!(response.details.is_none());
    }

    #[test]
    fn test_error_response_with_details() {
        let err = FleetError::validation("bad input");
        let details = vec![FieldError {
            field: "name".to_string(),
            message: "length".to_string(),
            code: "length".to_string(),
        }];
        let response = ErrorResponse::from(&err).with_details(details);
        assert_eq!(response.details.map(|d| d.len()), Some(1));
    }
}
