//! Terminal presentation layer

use colored::Colorize;

use natter_client::UserInterface;
use natter_group::GroupEvent;
use natter_proto::Roster;

/// Prints chat traffic to stdout
pub struct TerminalUi;

impl UserInterface for TerminalUi {
    fn on_connected(&self) {
        println!("{}", "connected".green());
    }

    fn on_incoming_text(&self, sender: Option<&str>, body: &str) {
        match sender {
            Some(sender) => println!("{}: {body}", sender.bold()),
            None => println!("{body}"),
        }
    }

    fn on_roster_changed(&self, roster: &Roster) {
        println!("{}", format!("online: {}", render(roster)).dimmed());
    }

    fn on_rejected(&self, reason: &str) {
        eprintln!("{}", reason.red());
    }
}

/// Print one group event
pub fn print_group_event(event: &GroupEvent) {
    match event {
        GroupEvent::Joined(name) => println!("{}", format!("{name} joined").green()),
        GroupEvent::Left(name) => println!("{}", format!("{name} left").yellow()),
        GroupEvent::Text { sender, body } => println!("{}: {body}", sender.bold()),
        GroupEvent::RosterChanged(roster) => {
            println!("{}", format!("online: {}", render(roster)).dimmed())
        }
    }
}

fn render(roster: &Roster) -> String {
    roster.iter().cloned().collect::<Vec<_>>().join(", ")
}
