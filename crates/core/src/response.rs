//! Uniform response envelope handed to transports.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// `{success, data?, errors?, message}`.
///
/// An operation is reported as wholly applied or wholly rejected; there is no
/// partial-success shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ErrorBody>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: u16,
    pub category: String,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            errors: None,
            message: message.into(),
        }
    }

    pub fn failed(err: &DomainError) -> Self {
        Self {
            success: false,
            data: None,
            errors: Some(ErrorBody {
                status: err.status_code(),
                category: err.category().to_string(),
            }),
            message: err.public_message(),
        }
    }

    pub fn from_result(result: DomainResult<T>, success_message: impl Into<String>) -> Self {
        match result {
            Ok(data) => Self::ok(data, success_message),
            Err(err) => Self::failed(&err),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.errors.as_ref().map(|e| e.status).unwrap_or(200)
    }
}
