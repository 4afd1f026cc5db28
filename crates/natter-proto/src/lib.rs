//! Natter protocol core
//!
//! Message types and the line-oriented wire codec shared by the stream
//! server, the stream client, and the multicast group peer.
//!
//! This crate provides:
//! - Stream protocol messages ([`Message`]) and their codec ([`codec`])
//! - Group announcements ([`Announcement`], [`Action`]) for the
//!   connectionless variant
//! - Protocol error types ([`ProtoError`])

pub mod codec;
pub mod error;
pub mod message;

pub use codec::{decode, decode_announcement, encode, encode_announcement};
pub use error::{ProtoError, Result};
pub use message::{Action, Announcement, Message, Roster};

/// Maximum number of simultaneously active sessions.
pub const MAX_USERS: usize = 10;

/// Default TCP port for the stream server.
pub const DEFAULT_PORT: u16 = 9000;

/// Default multicast group address for the connectionless variant.
pub const DEFAULT_GROUP_ADDR: &str = "230.0.0.0";

/// Default multicast port shared by symmetric group peers.
pub const DEFAULT_GROUP_PORT: u16 = 4444;

/// Port used by relay-mediated group deployments for downstream traffic.
pub const GROUP_RELAY_PORT: u16 = 4446;

/// Interval between roster heartbeat announcements.
pub const HEARTBEAT_INTERVAL_MS: u64 = 2000;
