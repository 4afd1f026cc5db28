//! Server error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("sink closed")]
    SinkClosed,

    #[error("protocol error: {0}")]
    Proto(#[from] natter_proto::ProtoError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
