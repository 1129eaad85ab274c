//! API error types

use thiserror::Error;

use super::transport::HttpResponse;

/// Errors that can occur talking to the Jarvis API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {message}\nRequest: {request}")]
    BadRequest { message: String, request: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// Map a non-success response onto an error
    ///
    /// `resource` names what was asked for, `request` is the submitted payload
    /// (empty for reads) and is echoed back on 400 for diagnosis.
    pub fn from_response(response: &HttpResponse, resource: &str, request: &str) -> Self {
        let message = response.diagnostic();
        match response.status {
            400 => ApiError::BadRequest {
                message,
                request: request.to_string(),
            },
            404 => ApiError::NotFound {
                resource: resource.to_string(),
            },
            status => ApiError::Status { status, message },
        }
    }

    /// HTTP status behind this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::BadRequest { .. } => Some(400),
            ApiError::NotFound { .. } => Some(404),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            ApiError::InvalidResponse(_) | ApiError::Json(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}
