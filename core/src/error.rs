//! Error types for the REST client.
//!
//! # Design
//! `ServerDefined` is the case callers usually care about: the cluster
//! answered with a non-2xx status and a JSON body describing the problem.
//! The payload is kept as raw JSON since its shape belongs to the server.
//! `Transport` is reported when no response exists at all, so there is
//! never an attempt to parse a body that was not received.

use serde_json::Value;
use thiserror::Error;

/// Errors returned by `RestClient`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned a non-2xx status with a JSON error body.
    #[error("server error (HTTP {status}): {reason}")]
    ServerDefined { status: u16, reason: Value },

    /// The request never produced a response.
    #[error("transport failed: {0}")]
    Transport(String),

    /// A response body was not valid JSON.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// The server's error payload, if this error carries one.
    pub fn reason(&self) -> Option<&Value> {
        match self {
            ApiError::ServerDefined { reason, .. } => Some(reason),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::ServerDefined { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn server_defined_exposes_payload() {
        let err = ApiError::ServerDefined {
            status: 404,
            reason: json!({"error": "not found"}),
        };
        assert_eq!(err.reason(), Some(&json!({"error": "not found"})));
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), r#"server error (HTTP 404): {"error":"not found"}"#);
    }

    #[test]
    fn other_variants_have_no_payload() {
        let err = ApiError::Transport("connection refused".to_string());
        assert!(err.reason().is_none());
        assert!(err.status().is_none());
        assert_eq!(err.to_string(), "transport failed: connection refused");
    }
}
