//! Natter client library
//!
//! Protocol side of a stream-chat participant. The presentation layer is an
//! external collaborator behind the [`UserInterface`] trait; this crate
//! answers the handshake prompt, tracks the last-known roster, and turns
//! wire lines into callbacks.
//!
//! # Example
//!
//! ```no_run
//! use natter_client::{ChatClient, UserInterface};
//! use std::collections::BTreeSet;
//! use std::sync::Arc;
//!
//! struct Stdout;
//!
//! impl UserInterface for Stdout {
//!     fn on_incoming_text(&self, sender: Option<&str>, body: &str) {
//!         println!("{}: {body}", sender.unwrap_or("*"));
//!     }
//!     fn on_roster_changed(&self, roster: &BTreeSet<String>) {
//!         println!("online: {roster:?}");
//!     }
//!     fn on_rejected(&self, reason: &str) {
//!         eprintln!("rejected: {reason}");
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> natter_client::Result<()> {
//!     let client = ChatClient::connect("127.0.0.1:9000", "alice", Arc::new(Stdout)).await?;
//!     client.send_text("hello").await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod ui;

pub use client::ChatClient;
pub use error::{ClientError, Result};
pub use ui::UserInterface;
