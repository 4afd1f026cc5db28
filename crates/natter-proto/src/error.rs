//! Error types for the natter protocol

use thiserror::Error;

/// Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, ProtoError>;

/// Protocol error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtoError {
    /// Line does not match the wire grammar. Receivers drop these
    /// silently; the protocol has no negative acknowledgment.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// Leading keyword is not one of the known message kinds
    #[error("unknown message kind: {0}")]
    UnknownKind(String),

    /// Action tag is not one of joined/left/text/info
    #[error("unknown action: {0}")]
    UnknownAction(String),
}
