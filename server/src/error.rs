//! Error types for the todolists server.
//!
//! # Error Types
//!
//! - [`ValidationError`] - A list or item title was rejected
//! - [`ServerError`] - Top-level error returned by route handlers
//!
//! `ServerError` implements [`IntoResponse`], so handlers can return
//! `Result<_, ServerError>` and use `?` freely.
//!
//! # Example
//!
//! ```rust
//! use todolists_server::error::{ServerError, ValidationError};
//!
//! let err = ServerError::validation(ValidationError::DuplicateTitle, "Groceries");
//! assert!(err.is_client_error());
//! assert_eq!(err.to_string(), "validation error: The title must be unique.");
//! ```

use std::error::Error;
use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use tracing::error;

use crate::config::ConfigError;
use crate::session::SessionError;

/// Which kind of record a title belongs to.
///
/// Only affects the wording of [`ValidationError::InvalidLength`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleSubject {
    List,
    Item,
}

/// A rejected title.
///
/// The `Display` output is the message shown to the user.
#[derive(ThisError, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Another list already uses exactly this title.
    #[error("The title must be unique.")]
    DuplicateTitle,

    /// The trimmed title is empty or longer than 100 characters.
    #[error("{}", length_message(*subject))]
    InvalidLength { subject: TitleSubject },
}

fn length_message(subject: TitleSubject) -> &'static str {
    match subject {
        TitleSubject::List => "The title must be between 1 and 100 characters.",
        TitleSubject::Item => "The title of the list item must be between 1 and 100 characters.",
    }
}

impl ValidationError {
    /// Machine-readable error code used in JSON responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateTitle => "duplicate_title",
            Self::InvalidLength { .. } => "invalid_length",
        }
    }
}

/// The record a failed lookup was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundKind {
    List,
    Item,
}

impl NotFoundKind {
    fn code(self) -> &'static str {
        match self {
            Self::List => "list_not_found",
            Self::Item => "item_not_found",
        }
    }
}

impl fmt::Display for NotFoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => f.write_str("List not found"),
            Self::Item => f.write_str("Todo not found"),
        }
    }
}

/// Top-level error type for request handling.
#[derive(Debug)]
pub enum ServerError {
    /// Configuration error during startup.
    Config(ConfigError),

    /// A submitted title failed validation.
    ///
    /// Carries the attempted input so the client can re-prompt with it.
    Validation {
        error: ValidationError,
        title: String,
    },

    /// A list or item identifier did not match anything in the session.
    NotFound(NotFoundKind),

    /// The session store rejected the operation.
    Session(SessionError),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "configuration error: {err}"),
            Self::Validation { error, .. } => write!(f, "validation error: {error}"),
            Self::NotFound(kind) => write!(f, "{kind}"),
            Self::Session(err) => write!(f, "session error: {err}"),
        }
    }
}

impl Error for ServerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Validation { error, .. } => Some(error),
            Self::Session(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<ConfigError> for ServerError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<SessionError> for ServerError {
    fn from(err: SessionError) -> Self {
        Self::Session(err)
    }
}

impl ServerError {
    /// Creates a validation error preserving the attempted title.
    pub fn validation(error: ValidationError, title: impl Into<String>) -> Self {
        Self::Validation {
            error,
            title: title.into(),
        }
    }

    pub fn list_not_found() -> Self {
        Self::NotFound(NotFoundKind::List)
    }

    pub fn item_not_found() -> Self {
        Self::NotFound(NotFoundKind::Item)
    }

    /// Returns `true` if this error was caused by the request.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::NotFound(_))
    }

    /// Returns `true` if this error indicates a server-side problem.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Session(SessionError::AtCapacity { .. })
        )
    }

    /// HTTP status code for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Session(SessionError::AtCapacity { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Session(SessionError::NotFound) => StatusCode::GONE,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Title the client submitted, echoed back on validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: None,
            title: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if matches!(self, Self::Config(_)) {
            error!(error = %self, "Request failed with server error");
        }

        let body = match self {
            Self::Validation { error, title } => ErrorResponse::new(error.to_string())
                .with_code(error.code())
                .with_title(title),
            Self::NotFound(kind) => ErrorResponse::new(kind.to_string()).with_code(kind.code()),
            Self::Session(SessionError::AtCapacity { .. }) => {
                ErrorResponse::new("too many active sessions").with_code("session_capacity")
            }
            Self::Session(SessionError::NotFound) => {
                ErrorResponse::new("session expired").with_code("session_expired")
            }
            Self::Config(_) => {
                ErrorResponse::new("internal server error").with_code("server_error")
            }
        };

        (status, Json(body)).into_response()
    }
}

/// A specialized Result type for request handling.
pub type Result<T> = std::result::Result<T, ServerError>;
