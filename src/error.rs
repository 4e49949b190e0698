// src/error.rs
//! Application error types with structured error handling.
//!
//! Error types form the vocabulary for failure modes in the system.
//! Each variant says what went wrong and where, so callers of the helper
//! can tell a bad configuration apart from a flaky API call.

use std::fmt;
use thiserror::Error;

/// Notion API error codes as a typed vocabulary.
///
/// Instead of matching against magic strings like `"rate_limited"`,
/// the codes reported in Notion error bodies are encoded in the type system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotionErrorCode {
    /// API rate limit exceeded, back off and retry
    RateLimited,
    /// The requested object does not exist or is inaccessible
    ObjectNotFound,
    /// API key is invalid or expired
    Unauthorized,
    /// API key lacks permission for this resource
    RestrictedResource,
    /// Request body contains invalid JSON
    InvalidJson,
    /// Request parameters failed Notion's validation
    ValidationFailed,
    /// Conflict with current state of the resource
    Conflict,
    /// Notion internal server error
    InternalError,
    /// Notion is temporarily unavailable
    ServiceUnavailable,
    /// HTTP status code fallback when the error body is unparseable
    HttpStatus(u16),
    /// An error code this client doesn't recognize yet
    Unknown(String),
}

impl NotionErrorCode {
    /// Parse a Notion API error code string into the typed vocabulary.
    pub fn from_api_response(code: &str) -> Self {
        match code {
            "rate_limited" => Self::RateLimited,
            "object_not_found" => Self::ObjectNotFound,
            "unauthorized" => Self::Unauthorized,
            "restricted_resource" => Self::RestrictedResource,
            "invalid_json" => Self::InvalidJson,
            "validation_error" => Self::ValidationFailed,
            "conflict_error" => Self::Conflict,
            "internal_server_error" => Self::InternalError,
            "service_unavailable" => Self::ServiceUnavailable,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Create from an HTTP status code when the error body is unparseable.
    pub fn from_http_status(status: u16) -> Self {
        Self::HttpStatus(status)
    }

    /// Whether this error is transient in nature.
    ///
    /// The helper retries every failure regardless; this is exposed for
    /// callers that want to report flaky runs differently.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited
                | Self::ServiceUnavailable
                | Self::InternalError
                | Self::Conflict
                | Self::HttpStatus(408 | 429 | 500..=599)
        )
    }

    /// Whether this error means the resource simply doesn't exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ObjectNotFound | Self::HttpStatus(404))
    }
}

impl fmt::Display for NotionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate_limited"),
            Self::ObjectNotFound => write!(f, "object_not_found"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::RestrictedResource => write!(f, "restricted_resource"),
            Self::InvalidJson => write!(f, "invalid_json"),
            Self::ValidationFailed => write!(f, "validation_error"),
            Self::Conflict => write!(f, "conflict_error"),
            Self::InternalError => write!(f, "internal_server_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
            Self::HttpStatus(code) => write!(f, "http_{}", code),
            Self::Unknown(code) => write!(f, "{}", code),
        }
    }
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("Notion API returned an error ({code}): {message}")]
    NotionService {
        code: NotionErrorCode,
        message: String,
        status: reqwest::StatusCode,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Database '{0}' was not found under the root page")]
    MissingDatabase(String),

    #[error("Schema mismatch on property '{property}': {reason}")]
    SchemaMismatch { property: String, reason: String },

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    ValidationError(#[from] crate::types::ValidationError),
}

impl AppError {
    /// The Notion error code, when the failure came from the API itself.
    pub fn notion_code(&self) -> Option<&NotionErrorCode> {
        match self {
            AppError::NotionService { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}
