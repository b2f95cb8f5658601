//! Streaming error taxonomy.
//!
//! Every failure of a streaming session falls into one of the variants below.
//! Cancellation is deliberately its own variant so callers (and the UI layer)
//! can tell a user-initiated abort apart from a transport failure.

use std::fmt;

use crate::traits::HttpError;

/// Errors produced by a streaming estimate session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// Could not reach the agent endpoint (connect, DNS, socket errors).
    Connection { message: String },

    /// The server answered with a non-success HTTP status.
    HttpStatus { status: u16, message: String },

    /// The server accepted the request but returned no readable body.
    MissingBody,

    /// The stream was aborted by the caller.
    Cancelled,

    /// The request payload could not be serialized, or another local fault.
    Other { message: String },
}

impl StreamError {
    /// Whether this error was caused by an explicit `cancel()` call.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StreamError::Cancelled)
    }

    /// Whether retrying the stream is likely to help.
    pub fn is_retryable(&self) -> bool {
        match self {
            StreamError::Connection { .. } => true,
            StreamError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            StreamError::MissingBody => true,
            StreamError::Cancelled => false,
            StreamError::Other { .. } => false,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            StreamError::Connection { .. } => {
                "Unable to reach the estimate service. Please check your connection and try again."
                    .to_string()
            }
            StreamError::HttpStatus { status, .. } => match *status {
                401 => "Your session has expired. Please sign in again.".to_string(),
                403 => "You don't have permission to generate estimates.".to_string(),
                429 => "Too many requests. Please wait a moment and try again.".to_string(),
                500..=599 => {
                    "The estimate service is experiencing issues. Please try again later."
                        .to_string()
                }
                _ => format!("The server returned an error (HTTP {}).", status),
            },
            StreamError::MissingBody => {
                "The server accepted the request but sent no data. Please try again.".to_string()
            }
            StreamError::Cancelled => "Estimate generation was cancelled.".to_string(),
            StreamError::Other { message } => format!("Streaming error: {}", message),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            StreamError::Connection { .. } => "E_STREAM_CONN",
            StreamError::HttpStatus { .. } => "E_STREAM_HTTP",
            StreamError::MissingBody => "E_STREAM_NOBODY",
            StreamError::Cancelled => "E_STREAM_CANCEL",
            StreamError::Other { .. } => "E_STREAM_OTHER",
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::Connection { message } => {
                write!(f, "Connection failed: {}", message)
            }
            StreamError::HttpStatus { status, message } => {
                write!(f, "Stream request failed: {} {}", status, message)
            }
            StreamError::MissingBody => write!(f, "Response body is not readable"),
            StreamError::Cancelled => write!(f, "Stream cancelled by user"),
            StreamError::Other { message } => write!(f, "Stream error: {}", message),
        }
    }
}

impl std::error::Error for StreamError {}

impl From<HttpError> for StreamError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::ConnectionFailed(message) | HttpError::Timeout(message) => {
                StreamError::Connection { message }
            }
            HttpError::ServerError { status, message } => {
                StreamError::HttpStatus { status, message }
            }
            HttpError::EmptyBody => StreamError::MissingBody,
            HttpError::Io(message)
            | HttpError::InvalidUrl(message)
            | HttpError::Other(message) => StreamError::Other { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_is_distinct() {
        let err = StreamError::Cancelled;
        assert!(err.is_cancelled());
        assert!(!err.is_retryable());
        assert_eq!(err.error_code(), "E_STREAM_CANCEL");

        let err = StreamError::Connection {
            message: "refused".to_string(),
        };
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_connection_is_retryable() {
        let err = StreamError::Connection {
            message: "connection refused".to_string(),
        };
        assert!(err.is_retryable());
        assert_eq!(err.error_code(), "E_STREAM_CONN");
    }

    #[test]
    fn test_http_status_retryable_for_server_errors() {
        let err_500 = StreamError::HttpStatus {
            status: 500,
            message: "Internal Server Error".to_string(),
        };
        assert!(err_500.is_retryable());

        let err_400 = StreamError::HttpStatus {
            status: 400,
            message: "Bad Request".to_string(),
        };
        assert!(!err_400.is_retryable());
    }

    #[test]
    fn test_missing_body_from_http_error() {
        let err: StreamError = HttpError::EmptyBody.into();
        assert_eq!(err, StreamError::MissingBody);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_display_includes_status() {
        let err = StreamError::HttpStatus {
            status: 503,
            message: "Service Unavailable".to_string(),
        };
        let display = format!("{}", err);
        assert!(display.contains("503"));
        assert!(display.contains("Service Unavailable"));
    }

    #[test]
    fn test_user_messages_are_nonempty() {
        let errors = [
            StreamError::Connection {
                message: "x".to_string(),
            },
            StreamError::HttpStatus {
                status: 401,
                message: "x".to_string(),
            },
            StreamError::MissingBody,
            StreamError::Cancelled,
            StreamError::Other {
                message: "x".to_string(),
            },
        ];
        for err in errors {
            assert!(!err.user_message().is_empty());
        }
    }
}
