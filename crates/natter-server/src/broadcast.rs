//! Broadcast fan-out
//!
//! Delivers one message to every currently registered sink. The sink list
//! is a copy taken under the registry lock and written after release, so a
//! stalled peer cannot delay registration or delivery to the others.
//! Best effort, at most once per recipient per call.

use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, warn};

use natter_proto::{codec, Message};

use crate::registry::Registry;

/// Fans messages out to all registered sinks
#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<Registry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Write `message` to every sink registered at call time.
    ///
    /// A failing sink is logged and skipped; its owning session tears
    /// itself down through its own read-loop failure path, never here.
    pub async fn broadcast(&self, message: &Message) {
        let line = wire_line(message);
        let sinks = self.registry.sinks();
        debug!(recipients = sinks.len(), "broadcasting");

        for sink in sinks {
            if let Err(err) = sink.send(line.clone()).await {
                warn!(error = %err, "failed to deliver to one sink, continuing");
            }
        }
    }
}

/// Encode a message as a newline-terminated wire line
pub fn wire_line(message: &Message) -> Bytes {
    let mut line = codec::encode(message);
    line.push('\n');
    Bytes::from(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, ServerError};
    use crate::sink::SessionSink;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use natter_proto::Roster;

    struct RecordingSink {
        lines: Mutex<Vec<Bytes>>,
        fail: bool,
    }

    impl RecordingSink {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                lines: Mutex::new(Vec::new()),
                fail,
            })
        }
    }

    #[async_trait]
    impl SessionSink for RecordingSink {
        async fn send(&self, line: Bytes) -> Result<()> {
            if self.fail {
                return Err(ServerError::SinkClosed);
            }
            self.lines.lock().push(line);
            Ok(())
        }

        fn is_connected(&self) -> bool {
            !self.fail
        }

        async fn close(&self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn one_failing_sink_does_not_stop_the_rest() {
        let registry = Arc::new(Registry::new(10));
        let alice = RecordingSink::new(false);
        let broken = RecordingSink::new(true);
        let bob = RecordingSink::new(false);

        registry.try_register("alice", alice.clone()).unwrap();
        registry.try_register("broken", broken.clone()).unwrap();
        registry.try_register("bob", bob.clone()).unwrap();

        let message = Message::Text {
            sender: "alice".into(),
            body: "hello".into(),
            roster: Some(registry.snapshot()),
        };
        Broadcaster::new(Arc::clone(&registry)).broadcast(&message).await;

        assert_eq!(alice.lines.lock().len(), 1);
        assert_eq!(bob.lines.lock().len(), 1);
        assert!(broken.lines.lock().is_empty());
        // A broadcast failure never removes the session; that is the
        // owning read loop's job.
        assert_eq!(registry.len(), 3);
    }

    #[tokio::test]
    async fn identical_payload_reaches_every_sink() {
        let registry = Arc::new(Registry::new(10));
        let sinks: Vec<_> = (0..4)
            .map(|i| {
                let sink = RecordingSink::new(false);
                registry.try_register(&format!("user{i}"), sink.clone()).unwrap();
                sink
            })
            .collect();

        let message = Message::Roster(Roster::from_iter(["alice".to_string()]));
        Broadcaster::new(Arc::clone(&registry)).broadcast(&message).await;

        let expected = wire_line(&message);
        for sink in sinks {
            assert_eq!(sink.lines.lock().as_slice(), &[expected.clone()]);
        }
    }
}
