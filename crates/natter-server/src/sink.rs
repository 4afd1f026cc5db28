//! Outbound sink abstraction
//!
//! Broadcast writes go through [`SessionSink`] so fan-out is independent of
//! the transport and testable with in-memory sinks. The production
//! implementation is a bounded mailbox in front of a dedicated writer task:
//! a stalled peer fills its own mailbox and loses messages instead of
//! blocking the broadcaster.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::{Result, ServerError};

/// Mailbox depth per connection before messages are dropped
pub const SINK_MAILBOX_SIZE: usize = 64;

/// One session's outbound byte sink
#[async_trait]
pub trait SessionSink: Send + Sync {
    /// Queue one encoded line (newline included) for delivery
    async fn send(&self, line: Bytes) -> Result<()>;

    /// Check if the peer is still writable
    fn is_connected(&self) -> bool;

    /// Close the sink; further sends fail
    async fn close(&self) -> Result<()>;
}

/// Sink backed by the per-connection writer task's mailbox
pub struct ChannelSink {
    tx: mpsc::Sender<Bytes>,
    connected: Arc<Mutex<bool>>,
}

impl ChannelSink {
    /// Create a sink and the mailbox its writer task drains
    pub fn new() -> (Arc<Self>, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(SINK_MAILBOX_SIZE);
        let sink = Arc::new(Self {
            tx,
            connected: Arc::new(Mutex::new(true)),
        });
        (sink, rx)
    }
}

#[async_trait]
impl SessionSink for ChannelSink {
    async fn send(&self, line: Bytes) -> Result<()> {
        if !*self.connected.lock() {
            return Err(ServerError::SinkClosed);
        }
        match self.tx.try_send(line) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                // Best-effort delivery: a slow consumer loses this message.
                warn!("sink mailbox full, dropping message");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                *self.connected.lock() = false;
                Err(ServerError::SinkClosed)
            }
        }
    }

    fn is_connected(&self) -> bool {
        *self.connected.lock()
    }

    async fn close(&self) -> Result<()> {
        *self.connected.lock() = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_after_writer_gone_reports_closed() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        let err = sink.send(Bytes::from_static(b"x\n")).await.unwrap_err();
        assert!(matches!(err, ServerError::SinkClosed));
        assert!(!sink.is_connected());
    }

    #[tokio::test]
    async fn full_mailbox_drops_instead_of_blocking() {
        let (sink, mut rx) = ChannelSink::new();
        for _ in 0..SINK_MAILBOX_SIZE + 5 {
            sink.send(Bytes::from_static(b"x\n")).await.unwrap();
        }
        assert!(sink.is_connected());

        let mut drained = 0;
        while rx.try_recv().is_ok() {
            drained += 1;
        }
        assert_eq!(drained, SINK_MAILBOX_SIZE);
    }
}
