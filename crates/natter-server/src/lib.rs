//! Natter chat server
//!
//! The server is the authority for the stream variant of the protocol:
//! - Owns the session registry (name uniqueness, capacity)
//! - Drives the per-connection handshake state machine
//! - Fans chat lines out to every registered sink
//!
//! The registry is an explicitly owned object passed to every session
//! handler, never ambient state; its locking discipline is a tested
//! contract (copy the sink list under the lock, write after release).
//!
//! # Example
//!
//! ```no_run
//! use natter_server::{ChatServer, ServerConfig};
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> natter_server::Result<()> {
//!     let listener = TcpListener::bind("0.0.0.0:9000").await?;
//!     ChatServer::new(ServerConfig::default()).serve(listener).await
//! }
//! ```

pub mod broadcast;
pub mod error;
pub mod handshake;
pub mod registry;
pub mod server;
pub mod sink;

pub use broadcast::Broadcaster;
pub use error::{Result, ServerError};
pub use handshake::{HandshakePhase, NameOutcome, SessionHandshake};
pub use registry::{RegisterError, Registry, SessionToken};
pub use server::{ChatServer, ServerConfig};
pub use sink::{ChannelSink, SessionSink};
