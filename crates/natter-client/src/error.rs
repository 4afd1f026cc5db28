//! Client error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("not connected")]
    NotConnected,

    #[error("protocol error: {0}")]
    Proto(#[from] natter_proto::ProtoError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
