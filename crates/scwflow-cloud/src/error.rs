//! Error types shared by every controller

use std::time::Duration;
use thiserror::Error;

/// Classified error returned by the typed vendor clients
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("precondition failed, resource is busy: {0}")]
    Conflict(String),

    #[error("API responded with HTTP {status}: {message}")]
    Response { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),
}

impl ApiError {
    /// HTTP status carried by the error, when the backend answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound(_) => Some(404),
            ApiError::Conflict(_) => Some(409),
            ApiError::Response { status, .. } => Some(*status),
            ApiError::Transport(_) => None,
        }
    }
}

/// Returns true when the backend reported 404
pub fn is_404(err: &ApiError) -> bool {
    err.status() == Some(404)
}

/// Returns true when the backend reported 409
pub fn is_409(err: &ApiError) -> bool {
    err.status() == Some(409)
}

/// Coarse classification of [`CloudError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedId,
    NotFound,
    Conflict,
    Validation,
    Transport,
    WaitTimeout,
    Cancelled,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::MalformedId => write!(f, "malformed-id"),
            ErrorKind::NotFound => write!(f, "not-found"),
            ErrorKind::Conflict => write!(f, "conflict"),
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::Transport => write!(f, "transport"),
            ErrorKind::WaitTimeout => write!(f, "wait-timeout"),
            ErrorKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Provider errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("malformed ID {id:?}: {reason}")]
    MalformedId { id: String, reason: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("{message}")]
    Validation {
        attribute: Option<String>,
        message: String,
    },

    #[error("given {attribute} {value} has different locality than the resource {expected:?}")]
    LocalityMismatch {
        attribute: String,
        value: String,
        expected: String,
    },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("timeout while waiting for {resource} after {timeout:?}")]
    WaitTimeout { resource: String, timeout: Duration },

    #[error("operation cancelled: {0}")]
    Cancelled(String),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<CloudError>,
    },

    #[error("invalid attribute data: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    pub fn malformed_id(id: impl Into<String>, reason: impl Into<String>) -> Self {
        CloudError::MalformedId {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CloudError::Validation {
            attribute: None,
            message: message.into(),
        }
    }

    /// Validation error pinned to one attribute path
    pub fn invalid_attribute(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        CloudError::Validation {
            attribute: Some(attribute.into()),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CloudError::MalformedId { .. } => ErrorKind::MalformedId,
            CloudError::NotFound(_) => ErrorKind::NotFound,
            CloudError::Conflict(_) => ErrorKind::Conflict,
            CloudError::Validation { .. }
            | CloudError::LocalityMismatch { .. }
            | CloudError::Json(_) => ErrorKind::Validation,
            CloudError::Transport(_) => ErrorKind::Transport,
            CloudError::WaitTimeout { .. } => ErrorKind::WaitTimeout,
            CloudError::Cancelled(_) => ErrorKind::Cancelled,
            CloudError::Context { source, .. } => source.kind(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    /// Attribute path the error is pinned to, if any
    pub fn attribute(&self) -> Option<&str> {
        match self {
            CloudError::Validation { attribute, .. } => attribute.as_deref(),
            CloudError::LocalityMismatch { attribute, .. } => Some(attribute),
            CloudError::Context { source, .. } => source.attribute(),
            _ => None,
        }
    }

    pub fn with_context(self, context: impl Into<String>) -> Self {
        CloudError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

impl From<ApiError> for CloudError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotFound(msg) => CloudError::NotFound(msg),
            ApiError::Conflict(msg) => CloudError::Conflict(msg),
            other => CloudError::Transport(other.to_string()),
        }
    }
}

/// Adds a short prefix to an error without changing its kind
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<CloudError>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
