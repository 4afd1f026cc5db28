//! Codec round-trip and grammar tests

use natter_proto::{
    codec, Action, Announcement, Message, ProtoError, Roster,
};

fn roster(names: &[&str]) -> Roster {
    names.iter().map(|n| n.to_string()).collect()
}

#[test]
fn handshake_round_trip() {
    let msg = Message::Handshake;
    assert_eq!(codec::decode(&codec::encode(&msg)).unwrap(), msg);
}

#[test]
fn roster_round_trip() {
    for names in [&[][..], &["alice"][..], &["alice", "bob", "carol"][..]] {
        let msg = Message::Roster(roster(names));
        assert_eq!(codec::decode(&codec::encode(&msg)).unwrap(), msg);
    }
}

#[test]
fn text_round_trip() {
    let cases = [
        ("alice", "hello", Some(roster(&["alice", "bob"]))),
        ("alice", "", Some(roster(&["alice"]))),
        ("alice", "", Some(Roster::new())),
        ("bob", "multi word body", None),
        ("bob", "", None),
        ("carol", "punctuation: yes? ok!", Some(roster(&["carol"]))),
    ];
    for (sender, body, roster) in cases {
        let msg = Message::Text {
            sender: sender.into(),
            body: body.into(),
            roster,
        };
        assert_eq!(codec::decode(&codec::encode(&msg)).unwrap(), msg, "{msg:?}");
    }
}

#[test]
fn error_round_trip() {
    for reason in ["Login is already used!", "", "with: colon"] {
        let msg = Message::Error(reason.into());
        assert_eq!(codec::decode(&codec::encode(&msg)).unwrap(), msg);
    }
}

#[test]
fn announcement_round_trip_all_actions() {
    for action in [Action::Joined, Action::Left, Action::Text, Action::Info] {
        let ann = Announcement {
            action,
            sender: "alice".into(),
            body: if action == Action::Text {
                "hi there".into()
            } else {
                String::new()
            },
            roster: Some(roster(&["alice", "bob"])),
        };
        let line = codec::encode_announcement(&ann);
        assert_eq!(codec::decode_announcement(&line).unwrap(), ann, "{line}");
    }
}

#[test]
fn announcement_round_trip_empty_roster_and_absent_roster() {
    let empty = Announcement::new(Action::Info, "alice", Roster::new());
    let line = codec::encode_announcement(&empty);
    assert_eq!(codec::decode_announcement(&line).unwrap(), empty);

    let absent = Announcement {
        action: Action::Text,
        sender: "alice".into(),
        body: "hi".into(),
        roster: None,
    };
    let line = codec::encode_announcement(&absent);
    assert_eq!(codec::decode_announcement(&line).unwrap(), absent);
}

#[test]
fn decode_tolerates_trailing_newline() {
    assert_eq!(codec::decode("CONNECT\r\n").unwrap(), Message::Handshake);
    assert_eq!(
        codec::decode("ONLINE [alice, bob]\n").unwrap(),
        Message::Roster(roster(&["alice", "bob"]))
    );
}

#[test]
fn malformed_lines_are_errors_not_panics() {
    for line in ["", "nonsense here", "MESSAGE", "MESSAGE missing-separator"] {
        assert!(codec::decode(line).is_err(), "{line:?}");
    }
    assert!(matches!(
        codec::decode("BOGUS alice: hi"),
        Err(ProtoError::UnknownKind(kind)) if kind == "BOGUS"
    ));
    assert!(matches!(
        codec::decode_announcement("bogus alice: hi"),
        Err(ProtoError::UnknownAction(action)) if action == "bogus"
    ));
}

#[test]
fn text_without_roster_keeps_trailing_spaces_in_body() {
    let msg = Message::Text {
        sender: "alice".into(),
        body: "padded ".into(),
        roster: None,
    };
    assert_eq!(codec::decode(&codec::encode(&msg)).unwrap(), msg);
}
