//! Runner error taxonomy.
//!
//! Every failure of the runner is reported as a [`RunnerError`] whose variant
//! tells the caller what went wrong:
//!
//! 1. **Invalid input**: the request was rejected before any network activity.
//! 2. **Connection / host key**: the TCP connection, key exchange or host
//!    identity check failed.
//! 3. **Authentication**: the server rejected the credential, or the key could
//!    not be loaded.
//! 4. **Execution**: the session was up but the command channel failed.
//! 5. **Timeout / cancellation**: only produced when the caller opted in.
//!
//! # Retry Classification
//!
//! Only connection errors are candidates for a retry, and only when their cause
//! looks transient. Authentication failures are never retried.
//!
//! ```rust,ignore
//! use remote_access::ssh::error::is_transient_cause;
//!
//! assert!(is_transient_cause("Connection refused"));
//! assert!(is_transient_cause("Network is unreachable"));
//! assert!(!is_transient_cause("No common key exchange algorithm"));
//! ```

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Cause patterns that indicate a transient network failure.
///
/// These errors may resolve on retry due to temporary network conditions,
/// server load, or other transient issues.
const TRANSIENT_CAUSES: &[&str] = &[
    "connection refused",
    "connection reset",
    "connection timed out",
    "timed out",
    "timeout",
    "network is unreachable",
    "no route to host",
    "host is down",
    "temporary failure",
    "resource temporarily unavailable",
    "broken pipe",
    "would block",
];

/// Coarse classification of a [`RunnerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    Connection,
    HostKey,
    Authentication,
    Execution,
    Timeout,
    Cancelled,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidInput => write!(f, "invalid_input"),
            ErrorKind::Connection => write!(f, "connection"),
            ErrorKind::HostKey => write!(f, "host_key"),
            ErrorKind::Authentication => write!(f, "authentication"),
            ErrorKind::Execution => write!(f, "execution"),
            ErrorKind::Timeout => write!(f, "timeout"),
            ErrorKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Error returned by the command runner.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Connection to {target} failed: {cause}")]
    Connection { target: String, cause: String },

    #[error("Host key for {target} rejected: fingerprint {fingerprint} is not pinned")]
    HostKeyRejected { target: String, fingerprint: String },

    #[error("Authentication as {username} failed: {cause}")]
    Authentication { username: String, cause: String },

    #[error("Remote execution failed: {cause}")]
    Execution { cause: String },

    #[error("Command timed out after {0:?}")]
    Timeout(Duration),

    #[error("Command was cancelled")]
    Cancelled,
}

impl RunnerError {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub(crate) fn connection(target: impl Into<String>, cause: impl ToString) -> Self {
        Self::Connection {
            target: target.into(),
            cause: cause.to_string(),
        }
    }

    pub(crate) fn authentication(username: impl Into<String>, cause: impl ToString) -> Self {
        Self::Authentication {
            username: username.into(),
            cause: cause.to_string(),
        }
    }

    pub(crate) fn execution(cause: impl ToString) -> Self {
        Self::Execution {
            cause: cause.to_string(),
        }
    }

    /// The coarse kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RunnerError::InvalidInput(_) => ErrorKind::InvalidInput,
            RunnerError::Connection { .. } => ErrorKind::Connection,
            RunnerError::HostKeyRejected { .. } => ErrorKind::HostKey,
            RunnerError::Authentication { .. } => ErrorKind::Authentication,
            RunnerError::Execution { .. } => ErrorKind::Execution,
            RunnerError::Timeout(_) => ErrorKind::Timeout,
            RunnerError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Whether a new connection attempt could succeed where this one failed.
    ///
    /// Only connection errors with a transient cause qualify.
    pub fn is_retryable(&self) -> bool {
        match self {
            RunnerError::Connection { cause, .. } => is_transient_cause(cause),
            _ => false,
        }
    }
}

/// Determines if an underlying cause message describes a transient failure.
///
/// Matching is case-insensitive against [`TRANSIENT_CAUSES`]. Protocol
/// negotiation failures (no common cipher, bad key exchange) do not match and
/// are therefore permanent.
pub fn is_transient_cause(cause: &str) -> bool {
    let cause_lower = cause.to_lowercase();
    TRANSIENT_CAUSES
        .iter()
        .any(|pattern| cause_lower.contains(pattern))
}
