//! Unified error types for the orchestration core.
//!
//! Every fallible core operation surfaces one of the kinds below. The
//! transport mapping (HTTP status codes) lives here as data so that
//! adapter layers never need to match on variants themselves.

use std::fmt;

/// Result alias used throughout the core.
pub type CoreResult<T> = Result<T, CoreError>;

/// Unified error type for core operations.
///
/// # Kinds
///
/// - `MissingTenant`: no tenant in the request context (403)
/// - `CrossTenant`: an operation would touch another tenant's data (403)
/// - `NotFound`: referenced record or job key absent (404)
/// - `InvalidInput`: malformed or incomplete payload (400)
/// - `DependencyUnavailable`: completer or sink transport failure (503)
/// - `Internal`: any unclassified failure (500)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// No tenant identifier in the request context.
    MissingTenant { message: String },
    /// The operation would read or write another tenant's data.
    CrossTenant { message: String },
    /// A referenced source record, row, or job key does not exist.
    NotFound { message: String },
    /// Missing or malformed request fields.
    InvalidInput { message: String },
    /// An external collaborator failed at the transport level.
    DependencyUnavailable { message: String },
    /// Catch-all for unexpected failures.
    Internal { message: String },
}

impl CoreError {
    /// Create a missing-tenant error with the standard message.
    pub fn missing_tenant() -> Self {
        Self::MissingTenant {
            message: "no tenant in request context".to_string(),
        }
    }

    /// Create a cross-tenant violation error.
    pub fn cross_tenant(message: impl Into<String>) -> Self {
        Self::CrossTenant {
            message: message.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an invalid-input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a dependency-unavailable error.
    pub fn dependency(message: impl Into<String>) -> Self {
        Self::DependencyUnavailable {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the error message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::MissingTenant { message }
            | Self::CrossTenant { message }
            | Self::NotFound { message }
            | Self::InvalidInput { message }
            | Self::DependencyUnavailable { message }
            | Self::Internal { message } => message,
        }
    }

    /// Get the error kind name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingTenant { .. } => "MissingTenant",
            Self::CrossTenant { .. } => "CrossTenant",
            Self::NotFound { .. } => "NotFound",
            Self::InvalidInput { .. } => "InvalidInput",
            Self::DependencyUnavailable { .. } => "DependencyUnavailable",
            Self::Internal { .. } => "Internal",
        }
    }

    /// The HTTP status an adapter should map this error to.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::MissingTenant { .. } | Self::CrossTenant { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::InvalidInput { .. } => 400,
            Self::DependencyUnavailable { .. } => 503,
            Self::Internal { .. } => 500,
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind(), self.message())
    }
}

impl std::error::Error for CoreError {}

// Unclassified failures from anyhow-based boundaries land in Internal.
impl From<anyhow::Error> for CoreError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err.to_string())
    }
}

// Malformed JSON payloads are a caller problem, not an internal one.
impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_input(format!("malformed payload: {}", err))
    }
}
