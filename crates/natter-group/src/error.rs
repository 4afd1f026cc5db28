//! Group transport error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GroupError>;

#[derive(Error, Debug)]
pub enum GroupError {
    #[error("not a multicast address: {0}")]
    NotMulticast(std::net::Ipv4Addr),

    #[error("protocol error: {0}")]
    Proto(#[from] natter_proto::ProtoError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
