//! Error types for the Substack API client.
//!
//! # Design
//! Every variant carries `String` payloads so the enum is `Clone`: a query
//! that fails while several subscribers are coalesced onto it hands each of
//! them the same settled error. Nothing in the core handles or retries an
//! error; all of them reach the consumer verbatim.

use thiserror::Error;

/// Errors surfaced by query execution.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The host could not be reached (DNS/connection failure) or the
    /// response body could not be read.
    #[error("request failed: {0}")]
    Network(String),

    /// The server returned a non-2xx status. Carries the raw body for
    /// debugging.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body is not valid JSON or does not match the expected
    /// envelope shape.
    #[error("invalid response body: {0}")]
    Parse(String),
}

impl ApiError {
    /// The HTTP status code, when the server responded at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_displays_status_and_body() {
        let err = ApiError::Http {
            status: 404,
            body: "post not found".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 404: post not found");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn network_error_has_no_status() {
        let err = ApiError::Network("connection refused".to_string());
        assert_eq!(err.status(), None);
    }
}
