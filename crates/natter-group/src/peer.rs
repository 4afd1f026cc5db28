//! Symmetric multicast peer
//!
//! Each peer announces `joined` when it arrives, `text` for chat lines,
//! `left` on departure, and an `info` heartbeat on a fixed interval so the
//! group reconciles despite missed datagrams. Every received announcement
//! is merged into the local roster; decoded events are delivered to the
//! owner through a channel.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use natter_proto::{codec, Action, Announcement, Roster, HEARTBEAT_INTERVAL_MS};

use crate::error::Result;
use crate::roster::SharedRoster;
use crate::socket::bind_multicast;

/// Event channel depth
const EVENT_CHANNEL_SIZE: usize = 100;

/// Group peer configuration
#[derive(Debug, Clone)]
pub struct GroupConfig {
    /// Multicast group address
    pub group: Ipv4Addr,
    /// Port shared by all peers (send and receive)
    pub port: u16,
    /// Interval between `info` roster heartbeats
    pub heartbeat: Duration,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            group: Ipv4Addr::new(230, 0, 0, 0),
            port: natter_proto::DEFAULT_GROUP_PORT,
            heartbeat: Duration::from_millis(HEARTBEAT_INTERVAL_MS),
        }
    }
}

/// Something that happened in the group, as seen by this peer.
///
/// A peer hears its own announcements through multicast loopback; that is
/// how a sender sees its own chat lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupEvent {
    /// A peer announced itself
    Joined(String),
    /// A peer announced its departure
    Left(String),
    /// Chat text
    Text { sender: String, body: String },
    /// The merged roster changed
    RosterChanged(Roster),
}

/// One symmetric participant in the multicast group
pub struct GroupPeer {
    name: String,
    socket: Arc<UdpSocket>,
    target: SocketAddr,
    roster: Arc<SharedRoster>,
    recv_task: JoinHandle<()>,
    heartbeat_task: JoinHandle<()>,
}

impl GroupPeer {
    /// Join the group: bind, announce `joined`, start the receive loop and
    /// the heartbeat.
    pub async fn join(config: GroupConfig, name: &str) -> Result<(Self, mpsc::Receiver<GroupEvent>)> {
        let socket = Arc::new(bind_multicast(config.group, config.port)?);
        let target = SocketAddr::V4(SocketAddrV4::new(config.group, config.port));

        let roster = Arc::new(SharedRoster::new());
        roster.insert(name);

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_SIZE);

        let recv_task = tokio::spawn(run_receiver(
            Arc::clone(&socket),
            Arc::clone(&roster),
            tx,
        ));
        let heartbeat_task = tokio::spawn(run_heartbeat(
            Arc::clone(&socket),
            Arc::clone(&roster),
            name.to_string(),
            target,
            config.heartbeat,
        ));

        let peer = Self {
            name: name.to_string(),
            socket,
            target,
            roster,
            recv_task,
            heartbeat_task,
        };

        info!(group = %config.group, port = config.port, name, "joined group");
        peer.announce(Action::Joined, "").await?;

        Ok((peer, rx))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Copy of the locally merged (advisory) roster
    pub fn roster(&self) -> Roster {
        self.roster.snapshot()
    }

    /// Broadcast one chat line to the group
    pub async fn send_text(&self, body: &str) -> Result<()> {
        self.announce(Action::Text, body).await
    }

    /// Announce departure and stop both background tasks
    pub async fn leave(self) -> Result<()> {
        let result = self.announce(Action::Left, "").await;
        self.recv_task.abort();
        self.heartbeat_task.abort();
        info!(name = %self.name, "left group");
        result
    }

    async fn announce(&self, action: Action, body: &str) -> Result<()> {
        let ann = Announcement {
            action,
            sender: self.name.clone(),
            body: body.to_string(),
            roster: Some(self.roster.snapshot()),
        };
        let payload = codec::encode_announcement(&ann);
        self.socket.send_to(payload.as_bytes(), self.target).await?;
        Ok(())
    }
}

/// Merge one announcement into the roster.
///
/// Returns the event to surface (if any) and whether the roster changed.
/// The sender's own name is added for every action except `left`, where it
/// is removed instead.
fn apply_announcement(ann: &Announcement, roster: &SharedRoster) -> (Option<GroupEvent>, bool) {
    let merge_attached = |roster: &SharedRoster| {
        ann.roster
            .as_ref()
            .map(|attached| roster.merge(attached))
            .unwrap_or(false)
    };

    match ann.action {
        Action::Joined => {
            let mut changed = roster.insert(&ann.sender);
            changed |= merge_attached(roster);
            (Some(GroupEvent::Joined(ann.sender.clone())), changed)
        }
        Action::Left => {
            let changed = roster.remove(&ann.sender);
            (Some(GroupEvent::Left(ann.sender.clone())), changed)
        }
        Action::Text => {
            let mut changed = roster.insert(&ann.sender);
            changed |= merge_attached(roster);
            (
                Some(GroupEvent::Text {
                    sender: ann.sender.clone(),
                    body: ann.body.clone(),
                }),
                changed,
            )
        }
        Action::Info => {
            let mut changed = roster.insert(&ann.sender);
            changed |= merge_attached(roster);
            (None, changed)
        }
    }
}

async fn run_receiver(
    socket: Arc<UdpSocket>,
    roster: Arc<SharedRoster>,
    tx: mpsc::Sender<GroupEvent>,
) {
    let mut buf = vec![0u8; 64 * 1024];

    loop {
        let (len, from) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(err) => {
                warn!(error = %err, "group receive failed, stopping");
                break;
            }
        };

        let Ok(text) = std::str::from_utf8(&buf[..len]) else {
            debug!(%from, "dropping non-UTF-8 datagram");
            continue;
        };

        match codec::decode_announcement(text) {
            Ok(ann) => {
                let (event, changed) = apply_announcement(&ann, &roster);
                if let Some(event) = event {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                if changed && tx.send(GroupEvent::RosterChanged(roster.snapshot())).await.is_err() {
                    break;
                }
            }
            // No negative acknowledgment in the protocol: drop silently.
            Err(err) => debug!(%from, error = %err, "dropping malformed datagram"),
        }
    }
}

async fn run_heartbeat(
    socket: Arc<UdpSocket>,
    roster: Arc<SharedRoster>,
    name: String,
    target: SocketAddr,
    period: Duration,
) {
    let mut interval = tokio::time::interval(period);
    // The first tick fires immediately; `join` has already announced.
    interval.tick().await;

    loop {
        interval.tick().await;
        let ann = Announcement::new(Action::Info, name.clone(), roster.snapshot());
        let payload = codec::encode_announcement(&ann);
        if let Err(err) = socket.send_to(payload.as_bytes(), target).await {
            warn!(error = %err, "heartbeat send failed, stopping");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster_of(names: &[&str]) -> Roster {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn joined_inserts_sender_and_merges_roster() {
        let roster = SharedRoster::new();
        let ann = Announcement::new(Action::Joined, "alice", roster_of(&["alice", "bob"]));

        let (event, changed) = apply_announcement(&ann, &roster);
        assert_eq!(event, Some(GroupEvent::Joined("alice".into())));
        assert!(changed);
        assert_eq!(roster.snapshot(), roster_of(&["alice", "bob"]));
    }

    #[test]
    fn sender_name_is_authoritative_even_without_roster() {
        let roster = SharedRoster::new();
        let ann = Announcement {
            action: Action::Joined,
            sender: "alice".into(),
            body: String::new(),
            roster: None,
        };
        let (_, changed) = apply_announcement(&ann, &roster);
        assert!(changed);
        assert!(roster.snapshot().contains("alice"));
    }

    #[test]
    fn left_removes_only_the_sender() {
        let roster = SharedRoster::new();
        roster.merge(&roster_of(&["alice", "bob"]));

        let ann = Announcement::new(Action::Left, "alice", Roster::new());
        let (event, changed) = apply_announcement(&ann, &roster);
        assert_eq!(event, Some(GroupEvent::Left("alice".into())));
        assert!(changed);
        assert_eq!(roster.snapshot(), roster_of(&["bob"]));
    }

    #[test]
    fn text_surfaces_body_and_refreshes_roster() {
        let roster = SharedRoster::new();
        let ann = Announcement::text("alice", "hi all", roster_of(&["alice", "bob"]));

        let (event, changed) = apply_announcement(&ann, &roster);
        assert_eq!(
            event,
            Some(GroupEvent::Text {
                sender: "alice".into(),
                body: "hi all".into(),
            })
        );
        assert!(changed);
    }

    #[test]
    fn info_is_silent_but_still_merges() {
        let roster = SharedRoster::new();
        let ann = Announcement::new(Action::Info, "alice", roster_of(&["alice", "bob"]));

        let (event, changed) = apply_announcement(&ann, &roster);
        assert_eq!(event, None);
        assert!(changed);
        assert_eq!(roster.len(), 2);

        // A repeated heartbeat changes nothing.
        let (_, changed) = apply_announcement(&ann, &roster);
        assert!(!changed);
    }
}
