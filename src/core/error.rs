//! Typed error handling for bazaar
//!
//! Every failure the crate can surface to an HTTP client is expressed as a
//! [`BazaarError`], which knows its status code, its machine-readable code and
//! how to render itself as a JSON body.
//!
//! # Error Categories
//!
//! - [`ValidationError`]: rejected input (field errors, malformed JSON)
//! - [`RequestError`]: authorization and request-shape failures
//! - [`StorageError`]: backing store failures surfaced through HTTP
//! - [`ConfigError`]: configuration parsing and validation
//!
//! # Response shape
//!
//! ```json
//! { "error": "Validation Error", "message": "The given data was invalid", "errors": { "email": ["..."] } }
//! ```
//!
//! `errors` is only present for field validation failures.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

use crate::core::validation::ValidationErrors;

/// The main error type for bazaar
#[derive(Debug)]
pub enum BazaarError {
    /// Input validation errors
    Validation(ValidationError),

    /// HTTP/Request errors
    Request(RequestError),

    /// Backing store errors
    Storage(StorageError),

    /// Configuration errors
    Config(ConfigError),

    /// Unexpected failure; the message is logged, never sent to the client
    Internal(String),
}

impl fmt::Display for BazaarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BazaarError::Validation(e) => write!(f, "{}", e),
            BazaarError::Request(e) => write!(f, "{}", e),
            BazaarError::Storage(e) => write!(f, "{}", e),
            BazaarError::Config(e) => write!(f, "{}", e),
            BazaarError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for BazaarError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BazaarError::Validation(e) => Some(e),
            BazaarError::Request(e) => Some(e),
            BazaarError::Storage(e) => Some(e),
            BazaarError::Config(e) => Some(e),
            BazaarError::Internal(_) => None,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Short error title (e.g. "Forbidden")
    pub error: String,
    /// Human-readable message
    pub message: String,
    /// Field errors, only for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ValidationErrors>,
}

impl BazaarError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            BazaarError::Validation(e) => e.status_code(),
            BazaarError::Request(e) => e.status_code(),
            BazaarError::Storage(StorageError::NotFound { .. }) => StatusCode::NOT_FOUND,
            BazaarError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BazaarError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BazaarError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            BazaarError::Validation(e) => e.error_code(),
            BazaarError::Request(e) => e.error_code(),
            BazaarError::Storage(StorageError::NotFound { .. }) => "NOT_FOUND",
            BazaarError::Storage(_) => "STORAGE_ERROR",
            BazaarError::Config(_) => "CONFIG_ERROR",
            BazaarError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    ///
    /// Server-side failures get a generic message so internals never reach
    /// the client.
    pub fn to_response(&self) -> ErrorResponse {
        match self {
            BazaarError::Validation(ValidationError::FieldErrors(errors)) => ErrorResponse {
                error: "Validation Error".to_string(),
                message: "The given data was invalid".to_string(),
                errors: Some(errors.clone()),
            },
            BazaarError::Validation(e) => ErrorResponse {
                error: "Bad Request".to_string(),
                message: e.to_string(),
                errors: None,
            },
            BazaarError::Request(RequestError::Forbidden { message }) => ErrorResponse {
                error: "Forbidden".to_string(),
                message: message.clone(),
                errors: None,
            },
            BazaarError::Request(e) => ErrorResponse {
                error: "Bad Request".to_string(),
                message: e.to_string(),
                errors: None,
            },
            BazaarError::Storage(e @ StorageError::NotFound { .. }) => ErrorResponse {
                error: "Not Found".to_string(),
                message: e.to_string(),
                errors: None,
            },
            BazaarError::Storage(_) | BazaarError::Config(_) | BazaarError::Internal(_) => {
                ErrorResponse {
                    error: "Internal Server Error".to_string(),
                    message: "Internal server error".to_string(),
                    errors: None,
                }
            }
        }
    }

    /// Forbidden error with the default message
    pub fn forbidden() -> Self {
        BazaarError::Request(RequestError::Forbidden {
            message: "You are not allowed to perform this action".to_string(),
        })
    }
}

impl IntoResponse for BazaarError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to input validation
#[derive(Debug)]
pub enum ValidationError {
    /// One or more fields failed their rules
    FieldErrors(ValidationErrors),

    /// Request body is not valid JSON
    InvalidJson { message: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::FieldErrors(errors) => {
                let msgs: Vec<String> = errors
                    .iter()
                    .map(|(field, messages)| format!("{}: {}", field, messages.join("; ")))
                    .collect();
                write!(f, "Validation errors: {}", msgs.join(", "))
            }
            ValidationError::InvalidJson { message } => {
                write!(f, "Invalid JSON: {}", message)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ValidationError::FieldErrors(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ValidationError::InvalidJson { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::FieldErrors(_) => "VALIDATION_ERROR",
            ValidationError::InvalidJson { .. } => "INVALID_JSON",
        }
    }
}

impl From<ValidationError> for BazaarError {
    fn from(err: ValidationError) -> Self {
        BazaarError::Validation(err)
    }
}

// =============================================================================
// Request Errors
// =============================================================================

/// Errors related to HTTP requests
#[derive(Debug)]
pub enum RequestError {
    /// The caller may not perform this operation
    Forbidden { message: String },

    /// Query string could not be decoded
    InvalidQuery { message: String },

    /// Request body could not be read
    InvalidBody { message: String },
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Forbidden { message } => write!(f, "Forbidden: {}", message),
            RequestError::InvalidQuery { message } => {
                write!(f, "Invalid query string: {}", message)
            }
            RequestError::InvalidBody { message } => {
                write!(f, "Invalid request body: {}", message)
            }
        }
    }
}

impl std::error::Error for RequestError {}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::Forbidden { .. } => StatusCode::FORBIDDEN,
            RequestError::InvalidQuery { .. } => StatusCode::BAD_REQUEST,
            RequestError::InvalidBody { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RequestError::Forbidden { .. } => "FORBIDDEN",
            RequestError::InvalidQuery { .. } => "INVALID_QUERY",
            RequestError::InvalidBody { .. } => "INVALID_BODY",
        }
    }
}

impl From<RequestError> for BazaarError {
    fn from(err: RequestError) -> Self {
        BazaarError::Request(err)
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors related to the backing store
#[derive(Debug)]
pub enum StorageError {
    /// Query execution error
    QueryError { backend: String, message: String },

    /// Record not found by primary key
    NotFound { collection: String, id: i64 },

    /// Backend not available
    Unavailable { backend: String },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::QueryError { backend, message } => {
                write!(f, "{} query error: {}", backend, message)
            }
            StorageError::NotFound { collection, id } => {
                write!(f, "{} with id '{}' not found", collection, id)
            }
            StorageError::Unavailable { backend } => {
                write!(f, "Storage backend '{}' is unavailable", backend)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for BazaarError {
    fn from(err: StorageError) -> Self {
        BazaarError::Storage(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to parse configuration
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Invalid value in configuration
    InvalidValue { field: String, message: String },

    /// IO error while reading configuration
    IoError { message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError { file, message } => {
                if let Some(file) = file {
                    write!(f, "Failed to parse config file '{}': {}", file, message)
                } else {
                    write!(f, "Failed to parse config: {}", message)
                }
            }
            ConfigError::InvalidValue { field, message } => {
                write!(f, "Invalid value for field '{}': {}", field, message)
            }
            ConfigError::IoError { message } => write!(f, "IO error: {}", message),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for BazaarError {
    fn from(err: ConfigError) -> Self {
        BazaarError::Config(err)
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<serde_json::Error> for BazaarError {
    fn from(err: serde_json::Error) -> Self {
        BazaarError::Validation(ValidationError::InvalidJson {
            message: err.to_string(),
        })
    }
}

impl From<std::io::Error> for BazaarError {
    fn from(err: std::io::Error) -> Self {
        BazaarError::Config(ConfigError::IoError {
            message: err.to_string(),
        })
    }
}

impl From<serde_yaml::Error> for BazaarError {
    fn from(err: serde_yaml::Error) -> Self {
        BazaarError::Config(ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        })
    }
}

/// Store errors travel as `anyhow::Error`; keep typed ones when we can
impl From<anyhow::Error> for BazaarError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<StorageError>() {
            Ok(storage) => BazaarError::Storage(storage),
            Err(other) => BazaarError::Internal(format!("{:#}", other)),
        }
    }
}

/// A specialized Result type for bazaar operations
pub type BazaarResult<T> = Result<T, BazaarError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn field_errors() -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.add("name", "The name field is required");
        errors.add("email", "The email field must be a valid email address");
        errors
    }

    #[test]
    fn test_validation_error_multiple_fields() {
        let err = ValidationError::FieldErrors(field_errors());
        let display = err.to_string();
        assert!(display.contains("name"));
        assert!(display.contains("email"));
    }

    #[test]
    fn test_field_errors_return_422() {
        let err: BazaarError = ValidationError::FieldErrors(field_errors()).into();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_field_errors_response_carries_errors() {
        let err: BazaarError = ValidationError::FieldErrors(field_errors()).into();
        let response = err.to_response();
        assert_eq!(response.error, "Validation Error");
        let errors = response.errors.expect("errors should be present");
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_forbidden_returns_403_without_errors() {
        let err = BazaarError::forbidden();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        let response = err.to_response();
        assert_eq!(response.error, "Forbidden");
        assert!(response.errors.is_none());
    }

    #[test]
    fn test_internal_error_hides_details() {
        let err = BazaarError::Internal("db password leaked in panic".to_string());
        let response = err.to_response();
        assert_eq!(response.message, "Internal server error");
        assert!(!serde_json::to_string(&response).unwrap().contains("password"));
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::QueryError {
            backend: "in-memory".to_string(),
            message: "lock poisoned".to_string(),
        };
        assert!(err.to_string().contains("in-memory"));
        assert!(err.to_string().contains("lock poisoned"));
    }

    #[test]
    fn test_from_anyhow_keeps_storage_error() {
        let source = anyhow::Error::new(StorageError::NotFound {
            collection: "services".to_string(),
            id: 7,
        });
        let err: BazaarError = source.into();
        assert!(matches!(
            err,
            BazaarError::Storage(StorageError::NotFound { id: 7, .. })
        ));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_response().error, "Not Found");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: BazaarError = json_err.into();
        assert!(matches!(
            err,
            BazaarError::Validation(ValidationError::InvalidJson { .. })
        ));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::ParseError {
            file: Some("/etc/bazaar.yaml".to_string()),
            message: "bad indent".to_string(),
        };
        assert!(err.to_string().contains("/etc/bazaar.yaml"));
    }
}
