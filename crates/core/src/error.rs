//! Domain error model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Why a bearer credential was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthFailure {
    /// No credential was presented.
    Missing,
    /// The token was well-formed but its validity window has passed.
    Expired,
    /// Signature, structure or claims could not be verified.
    Invalid,
}

impl core::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AuthFailure::Missing => f.write_str("login required"),
            AuthFailure::Expired => f.write_str("token expired"),
            AuthFailure::Invalid => f.write_str("token is invalid"),
        }
    }
}

/// Domain-level error.
///
/// Every variant except `Internal` is *operational*: an expected failure that
/// carries a status and a short machine-usable category. `Internal` marks a
/// defect and never exposes its message to callers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Missing or malformed input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Resource absent (or outside the caller's company).
    #[error("not found: {0}")]
    NotFound(String),

    /// Role or ownership check failed.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Duplicate email, duplicate paperwork window, duplicate review, immutable founder role.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The record's current state forbids the transition.
    #[error("invalid state: {0}")]
    State(String),

    /// An upstream collaborator (storage, hashing, tokens) failed.
    #[error("dependency failure: {0}")]
    Dependency(String),

    /// Bearer credential missing, expired or invalid.
    #[error("unauthenticated: {0}")]
    Unauthenticated(AuthFailure),

    /// Unexpected defect.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn permission(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    pub fn dependency(msg: impl Into<String>) -> Self {
        Self::Dependency(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP-style status code for transports.
    pub fn status_code(&self) -> u16 {
        match self {
            DomainError::Validation(_) => 400,
            DomainError::Unauthenticated(_) => 401,
            DomainError::PermissionDenied(_) => 403,
            DomainError::NotFound(_) => 404,
            DomainError::Conflict(_) => 409,
            DomainError::State(_) => 422,
            DomainError::Dependency(_) => 502,
            DomainError::Internal(_) => 500,
        }
    }

    /// Short machine-usable category.
    pub fn category(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_error",
            DomainError::NotFound(_) => "not_found",
            DomainError::PermissionDenied(_) => "permission_denied",
            DomainError::Conflict(_) => "conflict",
            DomainError::State(_) => "state_error",
            DomainError::Dependency(_) => "dependency_error",
            DomainError::Unauthenticated(_) => "unauthenticated",
            DomainError::Internal(_) => "internal_error",
        }
    }

    pub fn is_operational(&self) -> bool {
        !matches!(self, DomainError::Internal(_))
    }

    /// Message safe to show to the caller.
    pub fn public_message(&self) -> String {
        if self.is_operational() {
            self.to_string()
        } else {
            "internal server error".to_string()
        }
    }
}
