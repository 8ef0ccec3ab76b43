//! Error types for the Jotform API client.
//!
//! # Design
//! Transport failures are wrapped without interpretation. Non-2xx responses
//! become `Http` with enough context (method, URL, status, server message)
//! to debug the call. A form without a native PDF template gets its own
//! variant because callers usually fall back to the simple PDF rendering.

use crate::http::{HttpMethod, TransportError};

/// Errors returned by `JotformClient`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("{method} {url} failed with HTTP {status}: {message}")]
    Http {
        method: HttpMethod,
        url: String,
        status: u16,
        message: String,
    },

    #[error("form {form_id} does not have an associated PDF template")]
    NotImplemented { form_id: i64 },

    #[error("unexpected non-JSON response")]
    UnexpectedResponse,

    #[error("failed to encode request parameters: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// True for the "form has no PDF template" condition.
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, ApiError::NotImplemented { .. })
    }

    /// HTTP status of the failed response, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::NotImplemented { .. } => Some(400),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_names_method_url_and_status() {
        let err = ApiError::Http {
            method: HttpMethod::Get,
            url: "https://api.jotform.com/v1/generatePDF".to_string(),
            status: 401,
            message: "Authorization error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "GET https://api.jotform.com/v1/generatePDF failed with HTTP 401: Authorization error"
        );
        assert_eq!(err.status(), Some(401));
        assert!(!err.is_not_implemented());
    }

    #[test]
    fn not_implemented_is_distinguished() {
        let err = ApiError::NotImplemented { form_id: 123 };
        assert!(err.is_not_implemented());
        assert_eq!(
            err.to_string(),
            "form 123 does not have an associated PDF template"
        );
    }

    #[test]
    fn transport_errors_keep_their_message() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let err = ApiError::from(TransportError::from(io));
        assert_eq!(err.to_string(), "transport error: connection refused");
        assert_eq!(err.status(), None);
    }
}
