//! Natter group transport
//!
//! The connectionless variant of the chat: no dedicated server process,
//! every peer is symmetric. Peers announce themselves on a multicast group
//! and reconcile roster state by merging the snapshots attached to every
//! announcement. The merged roster is advisory soft state, not an
//! authoritative registry: there is no uniqueness or capacity enforcement,
//! and a departed peer's name can linger when its `left` datagram is lost.

pub mod error;
pub mod peer;
pub mod roster;
mod socket;

pub use error::{GroupError, Result};
pub use peer::{GroupConfig, GroupEvent, GroupPeer};
pub use roster::SharedRoster;
