//! Line codec for the natter wire format
//!
//! One message per newline-terminated UTF-8 line. Fields are positional: a
//! leading kind keyword, a `": "` separator between sender and body, and an
//! optional trailing ` [a, b]` roster segment. Encoding and decoding are
//! exact inverses for every message kind.
//!
//! The grammar is ambiguous for bodies that themselves end in a bracketed
//! suffix; such a suffix decodes as a roster segment. This is inherent to
//! the positional format and accepted.

use crate::error::{ProtoError, Result};
use crate::message::{Action, Announcement, Message, Roster};

const KIND_CONNECT: &str = "CONNECT";
const KIND_ONLINE: &str = "ONLINE";
const KIND_MESSAGE: &str = "MESSAGE";
const KIND_ERROR: &str = "ERROR";

// ============================================================================
// Stream protocol
// ============================================================================

/// Encode a stream message as one wire line (no trailing newline).
pub fn encode(message: &Message) -> String {
    match message {
        Message::Handshake => KIND_CONNECT.to_string(),
        Message::Roster(roster) => format!("{} [{}]", KIND_ONLINE, render_roster(roster)),
        Message::Text {
            sender,
            body,
            roster,
        } => match roster {
            Some(roster) => format!(
                "{} {}: {} [{}]",
                KIND_MESSAGE,
                sender,
                body,
                render_roster(roster)
            ),
            None => format!("{} {}: {}", KIND_MESSAGE, sender, body),
        },
        Message::Error(reason) => format!("{}:{}", KIND_ERROR, reason),
    }
}

/// Decode one wire line into a stream message.
///
/// Trailing CR/LF is tolerated. An absent roster segment decodes as
/// `None` ("use previously known roster"); everything that does not match
/// the grammar is an error the receiver should drop silently.
pub fn decode(line: &str) -> Result<Message> {
    let line = line.trim_end_matches(['\r', '\n']);

    if line == KIND_CONNECT {
        return Ok(Message::Handshake);
    }

    if let Some(rest) = line.strip_prefix(KIND_ONLINE) {
        let (core, roster) = split_roster(rest);
        if !core.trim().is_empty() {
            return Err(ProtoError::Malformed(line.to_string()));
        }
        // Bare "ONLINE" with no bracket is tolerated as an empty roster.
        return Ok(Message::Roster(roster.unwrap_or_default()));
    }

    if let Some(rest) = line.strip_prefix(KIND_MESSAGE) {
        let rest = rest
            .strip_prefix(' ')
            .ok_or_else(|| ProtoError::Malformed(line.to_string()))?;
        let (core, roster) = split_roster(rest);
        let (sender, body) = split_sender(core, line)?;
        return Ok(Message::Text {
            sender,
            body,
            roster,
        });
    }

    if let Some(reason) = line.strip_prefix(KIND_ERROR) {
        let reason = reason
            .strip_prefix(':')
            .ok_or_else(|| ProtoError::Malformed(line.to_string()))?;
        return Ok(Message::Error(reason.to_string()));
    }

    let keyword = line.split_whitespace().next().unwrap_or_default();
    Err(ProtoError::UnknownKind(keyword.to_string()))
}

// ============================================================================
// Group announcements
// ============================================================================

/// Encode a group announcement as one datagram payload.
pub fn encode_announcement(ann: &Announcement) -> String {
    match &ann.roster {
        Some(roster) => format!(
            "{} {}: {} [{}]",
            ann.action.keyword(),
            ann.sender,
            ann.body,
            render_roster(roster)
        ),
        None => format!("{} {}: {}", ann.action.keyword(), ann.sender, ann.body),
    }
}

/// Decode a group announcement datagram.
pub fn decode_announcement(line: &str) -> Result<Announcement> {
    let line = line.trim_end_matches(['\r', '\n']);

    let (word, rest) = line
        .split_once(' ')
        .ok_or_else(|| ProtoError::Malformed(line.to_string()))?;
    let action =
        Action::from_keyword(word).ok_or_else(|| ProtoError::UnknownAction(word.to_string()))?;

    let (core, roster) = split_roster(rest);
    let (sender, body) = split_sender(core, line)?;

    Ok(Announcement {
        action,
        sender,
        body,
        roster,
    })
}

// ============================================================================
// Shared field parsing
// ============================================================================

fn render_roster(roster: &Roster) -> String {
    roster.iter().cloned().collect::<Vec<_>>().join(", ")
}

/// Split a trailing ` [a, b]` roster segment off `s`, if present.
fn split_roster(s: &str) -> (&str, Option<Roster>) {
    if let Some(inner) = s.strip_suffix(']') {
        if let Some(idx) = inner.rfind(" [") {
            let roster = parse_roster(&inner[idx + 2..]);
            return (&s[..idx], Some(roster));
        }
    }
    (s, None)
}

fn parse_roster(inner: &str) -> Roster {
    if inner.is_empty() {
        return Roster::new();
    }
    inner.split(", ").map(str::to_string).collect()
}

/// Split `"sender: body"`; the trailing space after the colon is part of
/// the separator, so an empty body round-trips.
fn split_sender(core: &str, line: &str) -> Result<(String, String)> {
    let (sender, body) = core
        .split_once(": ")
        .ok_or_else(|| ProtoError::Malformed(line.to_string()))?;
    if sender.is_empty() {
        return Err(ProtoError::Malformed(line.to_string()));
    }
    Ok((sender.to_string(), body.to_string()))
}
