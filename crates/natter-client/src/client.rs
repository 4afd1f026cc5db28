//! Stream client protocol loop

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use natter_proto::{codec, Message, Roster};

use crate::error::{ClientError, Result};
use crate::ui::UserInterface;

/// Outgoing line queue depth
const OUTGOING_CHANNEL_SIZE: usize = 64;

/// A connected chat participant.
///
/// Owns a reader task (decodes server lines into [`UserInterface`]
/// callbacks) and a writer task (raw outgoing lines: the name during the
/// handshake, then chat bodies).
pub struct ChatClient {
    outgoing: mpsc::Sender<String>,
    reader_task: JoinHandle<()>,
    writer_task: JoinHandle<()>,
}

impl ChatClient {
    /// Connect and start answering the handshake as `name`.
    pub async fn connect(addr: &str, name: &str, ui: Arc<dyn UserInterface>) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|err| ClientError::ConnectionFailed(err.to_string()))?;
        info!(addr, name, "connected");

        let (read_half, write_half) = stream.into_split();
        let (outgoing, outgoing_rx) = mpsc::channel(OUTGOING_CHANNEL_SIZE);

        let reader_task = tokio::spawn(run_reader(
            read_half,
            name.to_string(),
            outgoing.clone(),
            ui,
        ));
        let writer_task = tokio::spawn(run_writer(write_half, outgoing_rx));

        Ok(Self {
            outgoing,
            reader_task,
            writer_task,
        })
    }

    /// Queue one outgoing chat line
    pub async fn send_text(&self, body: &str) -> Result<()> {
        self.outgoing
            .send(body.to_string())
            .await
            .map_err(|_| ClientError::NotConnected)
    }

    /// Tear the connection down, unblocking the reader
    pub fn close(self) {
        self.reader_task.abort();
        self.writer_task.abort();
    }

    /// Wait until the server side ends the session
    pub async fn closed(self) {
        let _ = self.reader_task.await;
        self.writer_task.abort();
    }
}

/// Session state owned by the reader task
struct ClientState {
    name: String,
    connected: bool,
    /// Last-known roster, kept for lines with an absent roster segment
    roster: Roster,
}

impl ClientState {
    fn new(name: String) -> Self {
        Self {
            name,
            connected: false,
            roster: Roster::new(),
        }
    }
}

/// What the reader loop should do after one decoded message
#[derive(Debug, PartialEq, Eq)]
enum LineAction {
    /// Answer the handshake prompt with our name
    SubmitName,
    Continue,
    /// Session is over; stop reading
    Terminate,
}

/// Apply one server message to the session state and the UI.
fn apply_message(message: Message, state: &mut ClientState, ui: &dyn UserInterface) -> LineAction {
    match message {
        Message::Handshake => LineAction::SubmitName,
        Message::Roster(roster) => {
            state.roster = roster;
            if !state.connected {
                state.connected = true;
                ui.on_connected();
            }
            ui.on_roster_changed(&state.roster);
            LineAction::Continue
        }
        Message::Text {
            sender,
            body,
            roster,
        } => {
            if let Some(roster) = roster {
                state.roster = roster;
            }
            ui.on_roster_changed(&state.roster);
            ui.on_incoming_text(Some(&sender), &body);
            LineAction::Continue
        }
        Message::Error(reason) => {
            ui.on_rejected(&reason);
            LineAction::Terminate
        }
    }
}

async fn run_reader(
    read_half: OwnedReadHalf,
    name: String,
    outgoing: mpsc::Sender<String>,
    ui: Arc<dyn UserInterface>,
) {
    let mut lines = BufReader::new(read_half).lines();
    let mut state = ClientState::new(name);

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("server closed the connection");
                break;
            }
            Err(err) => {
                debug!(error = %err, "read failed");
                break;
            }
        };

        match codec::decode(&line) {
            Ok(message) => match apply_message(message, &mut state, ui.as_ref()) {
                LineAction::SubmitName => {
                    if outgoing.send(state.name.clone()).await.is_err() {
                        break;
                    }
                }
                LineAction::Continue => {}
                LineAction::Terminate => break,
            },
            // Partial-grammar violations are dropped, never fatal.
            Err(err) => debug!(error = %err, line, "dropping malformed line"),
        }
    }
}

async fn run_writer(mut writer: OwnedWriteHalf, mut outgoing: mpsc::Receiver<String>) {
    while let Some(line) = outgoing.recv().await {
        if writer.write_all(format!("{line}\n").as_bytes()).await.is_err() {
            break;
        }
        if writer.flush().await.is_err() {
            break;
        }
    }
}
