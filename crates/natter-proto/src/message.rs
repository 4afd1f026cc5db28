//! Protocol message definitions

use std::collections::BTreeSet;

/// The set of active display names attached to outgoing messages so
/// recipients can refresh their displayed list without a separate query.
/// Ordered so that encoding is deterministic.
pub type Roster = BTreeSet<String>;

/// A stream-protocol message (server to client).
///
/// Client-to-server traffic is raw lines (the submitted name during the
/// handshake, then chat bodies) and does not use this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Prompt for the client to submit a display name (`CONNECT`)
    Handshake,

    /// Full snapshot of the active roster (`ONLINE`)
    Roster(Roster),

    /// Chat text with the roster at send time (`MESSAGE`).
    ///
    /// `roster` is `None` when the trailing bracketed segment was absent
    /// on the wire; consumers keep using their previously known roster.
    Text {
        sender: String,
        body: String,
        roster: Option<Roster>,
    },

    /// Rejection reason; terminates the session (`ERROR`)
    Error(String),
}

/// Action tag carried by group announcements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Peer joined the group
    Joined,
    /// Peer left the group
    Left,
    /// Chat text
    Text,
    /// Periodic roster heartbeat
    Info,
}

impl Action {
    /// Wire keyword for this action
    pub fn keyword(&self) -> &'static str {
        match self {
            Action::Joined => "joined",
            Action::Left => "left",
            Action::Text => "text",
            Action::Info => "info",
        }
    }

    /// Parse a wire keyword
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "joined" => Some(Action::Joined),
            "left" => Some(Action::Left),
            "text" => Some(Action::Text),
            "info" => Some(Action::Info),
            _ => None,
        }
    }
}

/// A datagram exchanged between symmetric group peers.
///
/// Every announcement is self-describing: it names its sender and carries
/// the sender's locally known roster so peers reconcile despite missed
/// packets. The sender's own name is authoritative for "this name exists".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub action: Action,
    pub sender: String,
    pub body: String,
    pub roster: Option<Roster>,
}

impl Announcement {
    /// Announcement with an empty body (joined/left/info)
    pub fn new(action: Action, sender: impl Into<String>, roster: Roster) -> Self {
        Self {
            action,
            sender: sender.into(),
            body: String::new(),
            roster: Some(roster),
        }
    }

    /// Chat text announcement
    pub fn text(sender: impl Into<String>, body: impl Into<String>, roster: Roster) -> Self {
        Self {
            action: Action::Text,
            sender: sender.into(),
            body: body.into(),
            roster: Some(roster),
        }
    }
}
