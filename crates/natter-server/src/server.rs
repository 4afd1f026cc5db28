//! TCP accept loop and per-session driver
//!
//! One reader task per connection plus a dedicated writer task draining the
//! session's mailbox. The registry and broadcaster are shared; everything
//! else (handshake phase, line buffer) is owned by the session's task.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use bytes::Bytes;
use tracing::{debug, info, warn};

use natter_proto::{Message, MAX_USERS};

use crate::broadcast::{wire_line, Broadcaster};
use crate::error::Result;
use crate::handshake::{NameOutcome, SessionHandshake};
use crate::registry::Registry;
use crate::sink::{ChannelSink, SessionSink};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Maximum number of simultaneously active sessions
    pub max_users: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_users: MAX_USERS,
        }
    }
}

/// The stream-variant chat server
pub struct ChatServer {
    registry: Arc<Registry>,
    broadcaster: Broadcaster,
}

impl ChatServer {
    pub fn new(config: ServerConfig) -> Self {
        let registry = Arc::new(Registry::new(config.max_users));
        let broadcaster = Broadcaster::new(Arc::clone(&registry));
        Self {
            registry,
            broadcaster,
        }
    }

    /// Shared handle to the session registry
    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Accept connections forever, one session task per connection
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        info!(addr = %listener.local_addr()?, "chat server accepting connections");

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    debug!(%peer, "new connection");
                    let registry = Arc::clone(&self.registry);
                    let broadcaster = self.broadcaster.clone();
                    tokio::spawn(async move {
                        if let Err(err) = run_session(stream, peer, registry, broadcaster).await {
                            debug!(%peer, error = %err, "session ended with error");
                        }
                    });
                }
                Err(err) => {
                    warn!(error = %err, "failed to accept connection");
                }
            }
        }
    }
}

impl Default for ChatServer {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}

/// Drive one connection from handshake to teardown.
///
/// Transport failure anywhere in here is fatal to this session only; the
/// handshake's teardown unregisters an active session exactly once, and
/// other sessions observe the departure through later roster snapshots.
async fn run_session(
    stream: TcpStream,
    peer: SocketAddr,
    registry: Arc<Registry>,
    broadcaster: Broadcaster,
) -> Result<()> {
    let (read_half, write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    let (sink, mailbox) = ChannelSink::new();
    let writer = tokio::spawn(run_writer(write_half, mailbox));

    let mut handshake = SessionHandshake::new(Arc::clone(&registry));
    let result = drive_session(&mut lines, &sink, &mut handshake, &registry, &broadcaster, peer).await;

    handshake.finish();
    // Drop the last sender so the writer drains pending lines and exits.
    drop(sink);
    let _ = writer.await;

    result
}

async fn drive_session(
    lines: &mut tokio::io::Lines<BufReader<tokio::net::tcp::OwnedReadHalf>>,
    sink: &Arc<ChannelSink>,
    handshake: &mut SessionHandshake,
    registry: &Arc<Registry>,
    broadcaster: &Broadcaster,
    peer: SocketAddr,
) -> Result<()> {
    sink.send(wire_line(&handshake.prompt())).await?;

    let name = match lines.next_line().await? {
        Some(line) => line.trim().to_string(),
        // End of stream before a name was submitted.
        None => return Ok(()),
    };

    if name.is_empty() {
        sink.send(wire_line(&Message::Error("Name must not be empty".into())))
            .await?;
        return Ok(());
    }

    let dyn_sink: Arc<dyn SessionSink> = sink.clone();
    match handshake.submit_name(&name, dyn_sink) {
        NameOutcome::Accepted { roster } => {
            info!(%peer, %name, "session active");
            broadcaster.broadcast(&Message::Roster(roster)).await;
        }
        NameOutcome::Rejected(error) => {
            info!(%peer, %name, reason = %natter_proto::codec::encode(&error), "session rejected");
            sink.send(wire_line(&error)).await?;
            return Ok(());
        }
    }

    while let Some(body) = lines.next_line().await? {
        broadcaster
            .broadcast(&Message::Text {
                sender: name.clone(),
                body,
                roster: Some(registry.snapshot()),
            })
            .await;
    }

    info!(%peer, %name, "session disconnected");
    Ok(())
}

/// Drain a session's mailbox into its socket
async fn run_writer(mut writer: OwnedWriteHalf, mut mailbox: mpsc::Receiver<Bytes>) {
    while let Some(line) = mailbox.recv().await {
        if let Err(err) = writer.write_all(&line).await {
            debug!(error = %err, "writer stopping");
            break;
        }
        if writer.flush().await.is_err() {
            break;
        }
    }
}
