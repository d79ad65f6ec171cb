//! Line splitting and header extraction over raw inbound bytes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stomp_oneshot::codec::{encode, message_ids};
use stomp_oneshot::{Command, Frame, extract_header_value, split_lines};

#[test]
fn pinned_message_scenario() {
    // What a fetch drain holds: the NUL and its trailer are not included.
    let lines = split_lines(b"MESSAGE\r\nmessage-id:42\r\n\r\nhi");
    assert_eq!(lines, vec!["MESSAGE", "message-id:42", "", "hi"]);
    assert_eq!(extract_header_value(&lines, "message-id").as_deref(), Some("42"));
    assert_eq!(lines.last().map(String::as_str), Some("hi"));
}

#[test]
fn several_frames_flatten_into_one_sequence() {
    let raw = b"MESSAGE\nmessage-id:1\n\none\0\nMESSAGE\nmessage-id:2\n\ntwo";
    let lines = split_lines(raw);
    assert_eq!(message_ids(&lines), vec!["1", "2"]);
    // the terminator stays attached to the first body
    assert!(lines.contains(&"one\0".to_string()));
    assert_eq!(lines.last().map(String::as_str), Some("two"));
}

#[test]
fn bare_lf_and_crlf_lines_agree() {
    assert_eq!(split_lines(b"a\nb\nc"), split_lines(b"a\r\nb\r\nc"));
}

#[test]
fn only_one_cr_is_stripped() {
    assert_eq!(split_lines(b"a\r\r\nb"), vec!["a\r", "b"]);
}

#[test]
fn invalid_utf8_is_replaced() {
    let lines = split_lines(b"message-id:\xff1\n");
    assert_eq!(
        extract_header_value(&lines, "message-id").as_deref(),
        Some("\u{fffd}1")
    );
}

#[test]
fn missing_header_is_none() {
    let lines = split_lines(b"CONNECTED\r\nversion:1.0\r\n");
    assert_eq!(extract_header_value(&lines, "message-id"), None);
    assert!(message_ids(&lines).is_empty());
}

#[test]
fn empty_header_value_is_some_empty() {
    let lines = split_lines(b"message-id:\r\n");
    assert_eq!(extract_header_value(&lines, "message-id").as_deref(), Some(""));
}

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789/-_. ";

fn random_text(rng: &mut StdRng, max: usize) -> String {
    let len = rng.gen_range(0..max);
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Encoding a frame and line-scanning its bytes recovers every header.
#[test]
fn encoded_headers_are_recoverable() {
    let mut rng = StdRng::from_seed([0x17; 32]);
    let commands = [
        Command::Connect,
        Command::Send,
        Command::Subscribe,
        Command::Unsubscribe,
        Command::Begin,
        Command::Commit,
        Command::Ack,
    ];

    for round in 0..200 {
        let command = commands[round % commands.len()];
        let count = rng.gen_range(1..6);
        let mut frame = Frame::new(command);
        for i in 0..count {
            frame = frame.header(format!("k{}x", i), random_text(&mut rng, 24));
        }
        if command == Command::Send {
            frame = frame.set_body(random_text(&mut rng, 40));
        }

        let lines = split_lines(&encode(&frame));
        for (key, value) in &frame.headers {
            assert_eq!(
                extract_header_value(&lines, key).as_deref(),
                Some(value.as_str()),
                "round {} frame {:?}",
                round,
                frame
            );
        }
    }
}
