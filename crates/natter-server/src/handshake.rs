//! Per-connection handshake state machine
//!
//! Takes a fresh connection from unauthenticated to active-or-rejected:
//!
//! ```text
//! Connected -> AwaitingName -> Active -> Closed
//!                     \-> Rejected -> Closed
//! ```
//!
//! The machine owns the registry token and guarantees that a session which
//! reached `Active` is unregistered exactly once, however the connection
//! ends.

use std::sync::Arc;

use natter_proto::{Message, Roster};

use crate::registry::{Registry, SessionToken};
use crate::sink::SessionSink;

/// Handshake phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakePhase {
    /// Transport established, prompt not yet sent
    Connected,
    /// Prompt sent, waiting for one name submission
    AwaitingName,
    /// Registered; chat lines are read and broadcast
    Active,
    /// Registration refused; terminal
    Rejected,
    /// Torn down; terminal
    Closed,
}

/// What to do with a name submission
#[derive(Debug)]
pub enum NameOutcome {
    /// Name claimed; broadcast this roster snapshot to every session
    Accepted { roster: Roster },
    /// Write this error to the submitting connection only, then close
    Rejected(Message),
}

/// State machine for one connection's lifecycle
pub struct SessionHandshake {
    registry: Arc<Registry>,
    phase: HandshakePhase,
    token: Option<SessionToken>,
    name: Option<String>,
}

impl SessionHandshake {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            phase: HandshakePhase::Connected,
            token: None,
            name: None,
        }
    }

    pub fn phase(&self) -> HandshakePhase {
        self.phase
    }

    /// Display name, once the session is active
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Emit the handshake prompt and start waiting for a name
    pub fn prompt(&mut self) -> Message {
        debug_assert_eq!(self.phase, HandshakePhase::Connected);
        self.phase = HandshakePhase::AwaitingName;
        Message::Handshake
    }

    /// Process the single name submission.
    pub fn submit_name(&mut self, name: &str, sink: Arc<dyn SessionSink>) -> NameOutcome {
        debug_assert_eq!(self.phase, HandshakePhase::AwaitingName);
        match self.registry.try_register(name, sink) {
            Ok(token) => {
                self.token = Some(token);
                self.name = Some(name.to_string());
                self.phase = HandshakePhase::Active;
                NameOutcome::Accepted {
                    roster: self.registry.snapshot(),
                }
            }
            Err(err) => {
                self.phase = HandshakePhase::Rejected;
                NameOutcome::Rejected(Message::Error(err.to_string()))
            }
        }
    }

    /// Tear the session down.
    ///
    /// Unregisters iff the session reached `Active`, exactly once; safe to
    /// call from any phase, any number of times.
    pub fn finish(&mut self) {
        if let Some(token) = self.token.take() {
            self.registry.unregister(&token);
        }
        self.phase = HandshakePhase::Closed;
    }
}

impl Drop for SessionHandshake {
    fn drop(&mut self) {
        self.finish();
    }
}
