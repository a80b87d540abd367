// Error taxonomy for device access and administrative commands.
//
// Connect failures are recovered by reconnecting lazily on the next call,
// query failures degrade a snapshot section, mutate failures surface to the
// caller and are never retried.

use thiserror::Error;

/// Device unreachable, login rejected, or connect attempt timed out.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("cannot reach device at {addr}: {source}")]
    Unreachable {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connect to {addr} timed out after {timeout_ms}ms")]
    Timeout { addr: String, timeout_ms: u64 },

    #[error("device login rejected: {message}")]
    Auth { message: String },

    /// Another caller's connect attempt failed while this caller was waiting on it.
    #[error("concurrent connect attempt to {addr} failed: {reason}")]
    AttemptFailed { addr: String, reason: String },
}

/// One read request against the device failed.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("{command}: transport error: {reason}")]
    Transport { command: String, reason: String },

    #[error("{command}: timed out after {timeout_ms}ms")]
    Timeout { command: String, timeout_ms: u64 },

    #[error("{command}: device returned error: {message}")]
    Trap { command: String, message: String },
}

/// A write request was rejected or could not be delivered.
#[derive(Debug, Error)]
pub enum MutateError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("{command}: transport error: {reason}")]
    Transport { command: String, reason: String },

    #[error("{command}: timed out after {timeout_ms}ms")]
    Timeout { command: String, timeout_ms: u64 },

    #[error("{command}: rejected by device: {message}")]
    Rejected { command: String, message: String },
}

/// Failure of an administrative command issued through the API.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("user not found: {username}")]
    NotFound { username: String },

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Mutate(#[from] MutateError),
}
