//! UI sink contract
//!
//! The presentation layer (terminal, window, test recorder) implements this
//! trait; the client calls it from its reader task.

use natter_proto::Roster;

/// Callbacks from the protocol loop into the presentation layer
pub trait UserInterface: Send + Sync {
    /// Connected and registered; the first roster snapshot follows
    fn on_connected(&self) {}

    /// A chat line arrived. `sender` is `None` for lines without an
    /// attributable sender.
    fn on_incoming_text(&self, sender: Option<&str>, body: &str);

    /// The set of active names changed (or was refreshed)
    fn on_roster_changed(&self, roster: &Roster);

    /// The server refused the session; the connection is closing
    fn on_rejected(&self, reason: &str);
}
