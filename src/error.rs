//! Error types for the Shiritori client.

use thiserror::Error;

/// Errors that can occur when using the Shiritori client.
#[derive(Debug, Error)]
pub enum ShiritoriError {
    /// Failed to send a message through the transport.
    #[error("transport send error: {0}")]
    TransportSend(String),

    /// Failed to receive a message from the transport.
    #[error("transport receive error: {0}")]
    TransportReceive(String),

    /// The transport connection was closed unexpectedly.
    #[error("transport connection closed")]
    TransportClosed,

    /// Failed to serialize or deserialize a protocol message.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Attempted an operation that requires an active connection, but the client is not connected.
    #[error("not connected to server")]
    NotConnected,

    /// Attempted a room operation before a seat was joined.
    #[error("not in a room")]
    NotInRoom,

    /// The display name was empty (or whitespace only) after trimming.
    /// Caught locally; the request never reaches the server.
    #[error("display name must not be empty")]
    EmptyDisplayName,

    /// The server refused the join request. `message` is the server's
    /// wording, surfaced verbatim.
    #[error("join rejected: {message}")]
    JoinRejected {
        /// Human-readable rejection reason from the server.
        message: String,
    },

    /// An operation timed out.
    #[error("operation timed out")]
    Timeout,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized [`Result`] type for Shiritori client operations.
pub type Result<T> = std::result::Result<T, ShiritoriError>;
