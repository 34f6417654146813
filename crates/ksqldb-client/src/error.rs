//! Error types for the ksqlDB client.

use crate::decode::DecodeError;
use crate::sql::SqlSyntaxError;
use crate::types::ResponseError;
use std::time::Duration;

/// Error type transports use to report a failed call.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur when using the ksqlDB client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The transport failed to perform a GET.
    #[error("ksqldb get request failed: {0}")]
    GetRequest(#[source] BoxError),

    /// The transport failed to perform a generic request (query stream, command).
    #[error("can't do request: {0}")]
    DoRequest(#[source] BoxError),

    /// The outbound request could not be constructed.
    #[error("can't create new request with context: {0}")]
    RequestBuild(String),

    /// Draining a response body failed.
    #[error("could not read response body: {0}")]
    BodyRead(#[source] BoxError),

    /// Non-success status whose body is not a ksqlDB error document.
    #[error("ksqldb error: {0}")]
    ErrorBody(#[source] serde_json::Error),

    /// Error reported by the server, decoded from a non-success response.
    #[error(transparent)]
    Server(#[from] ResponseError),

    /// Response body is not JSON, or its root is not an object.
    #[error("could not parse the response:{0}")]
    Parse(String),

    /// Valid JSON whose shape does not match the expected record.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A streamed row frame could not be decoded.
    #[error("could not decode row frame: {0}")]
    Frame(#[source] serde_json::Error),

    /// The query text is empty after trimming.
    #[error("empty ksql query")]
    EmptyQuery,

    /// Pre-flight syntax check rejected the statement.
    #[error("{} sql syntax error(s) found", errors.len())]
    Syntax {
        /// Individual syntax errors, in the order they were reported
        errors: Vec<SqlSyntaxError>,
    },

    /// Request payload could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The call's context was cancelled.
    #[error("request cancelled")]
    Cancelled,

    /// The call's context deadline elapsed.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The client was closed before the call.
    #[error("client is closed")]
    Closed,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Returns true for errors detected before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::EmptyQuery | ClientError::Syntax { .. })
    }

    /// Returns true if the call stopped because of cancellation or its deadline.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ClientError::Cancelled | ClientError::Timeout(_))
    }

    /// Returns the server-reported error, if this is one.
    pub fn server_error(&self) -> Option<&ResponseError> {
        match self {
            ClientError::Server(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_messages() {
        let get = ClientError::GetRequest("error".into());
        assert_eq!(get.to_string(), "ksqldb get request failed: error");

        let r#do = ClientError::DoRequest("error".into());
        assert_eq!(r#do.to_string(), "can't do request: error");
    }

    #[test]
    fn test_validation_errors() {
        assert_eq!(ClientError::EmptyQuery.to_string(), "empty ksql query");
        assert!(ClientError::EmptyQuery.is_validation());

        let syntax = ClientError::Syntax {
            errors: vec![SqlSyntaxError::new("missing ';'")],
        };
        assert_eq!(syntax.to_string(), "1 sql syntax error(s) found");
        assert!(syntax.is_validation());
        assert!(!ClientError::Cancelled.is_validation());
    }

    #[test]
    fn test_server_error_extraction() {
        let err = ClientError::from(ResponseError {
            error_code: 40001,
            message: "line 1:1: mismatched input".to_string(),
            ..Default::default()
        });
        assert_eq!(err.server_error().map(|e| e.error_code), Some(40001));
        assert_eq!(err.to_string(), "ksqldb error 40001: line 1:1: mismatched input");

        assert!(ClientError::Closed.server_error().is_none());
    }

    #[test]
    fn test_cancellation_errors() {
        assert!(ClientError::Cancelled.is_cancellation());
        assert!(ClientError::Timeout(Duration::from_secs(1)).is_cancellation());
        assert!(!ClientError::EmptyQuery.is_cancellation());
    }
}
