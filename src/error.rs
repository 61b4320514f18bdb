//! Error types for the order lifecycle.

use std::fmt;

/// Result type for order operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the order lifecycle.
///
/// Submission attempts swallow `NetworkError` and `HttpError` internally and record them in the
/// attempt log; they only reach callers from single-shot calls such as status queries.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A required endpoint or setting is not configured.
    ///
    /// Raised before any network call is made.
    ConfigMissing(String),

    /// Transport-level failure (connection refused, DNS, TLS, reset).
    NetworkError(String),

    /// The remote ledger answered with a non-success status code.
    HttpError {
        /// HTTP status code
        status: u16,
        /// Excerpt of the response body
        body: String,
    },

    /// A remote response could not be interpreted.
    ParseError(String),

    /// No order with this id exists in the date partition.
    NotFound {
        /// Partition that was searched
        date_key: String,
        /// Requested order id
        order_id: i64,
    },

    /// Caller supplied a value the operation cannot accept.
    InvalidInput(String),

    /// Converting a value into its persisted or wire form failed.
    SerializationError(String),

    /// Persisted bytes could not be decoded.
    ///
    /// Only surfaced where silently defaulting would break an invariant (the order counter);
    /// corrupt order partitions are swallowed by the store.
    DeserializationError(String),

    /// Storage backend failure (I/O, permissions).
    BackendError(String),

    /// Generic error with custom message.
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConfigMissing(msg) => write!(f, "Configuration missing: {}", msg),
            Error::NetworkError(msg) => write!(f, "Network error: {}", msg),
            Error::HttpError { status, body } => {
                if body.is_empty() {
                    write!(f, "HTTP {}", status)
                } else {
                    write!(f, "HTTP {} {}", status, body)
                }
            }
            Error::ParseError(msg) => write!(f, "Parse error: {}", msg),
            Error::NotFound { date_key, order_id } => {
                write!(f, "Order {} not found for {}", order_id, date_key)
            }
            Error::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Whether this error belongs to a single transport attempt.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::NetworkError(_) | Error::HttpError { .. })
    }
}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::BackendError(e.to_string())
        } else if e.is_syntax() || e.is_eof() || e.is_data() {
            Error::DeserializationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::BackendError(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Error::HttpError {
                status: status.as_u16(),
                body: String::new(),
            },
            None => Error::NetworkError(e.to_string()),
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::InvalidInput(format!("bad endpoint url: {}", e))
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}
