use bytes::{Buf, BufMut, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

use crate::frame::Frame;

/// Header whose presence on a line marks a deliverable message.
pub const MESSAGE_ID_HEADER: &str = "message-id";

/// Bytes read from the broker, cut at a frame terminator.
///
/// The terminating NUL itself is never part of the chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundChunk {
    /// Bytes up to (not including) a NUL terminator
    Terminated(BytesMut),
    /// Bytes left over when the stream ended before any NUL
    Unterminated(BytesMut),
}

/// `StompCodec` implements `tokio_util::codec::{Decoder, Encoder}` for the
/// CRLF-flavoured STOMP subset spoken by this client.
///
/// Responsibilities:
/// - Encode outbound [`Frame`]s into their exact wire bytes.
/// - Cut the inbound byte stream at NUL terminators. The decoder does not
///   interpret what lies between terminators; callers scan it with
///   [`split_lines`] or parse it with [`crate::parser::parse_server_frame`].
#[derive(Debug, Default)]
pub struct StompCodec {}

impl StompCodec {
    pub fn new() -> Self {
        Self {}
    }
}

/// Append the wire form of `frame` to `dst`.
///
/// `COMMAND\r\n`, then `key:value\r\n` per header, a blank `\r\n`, the body
/// (if any), a NUL byte and a closing `\r\n`. Nothing is escaped.
pub fn encode_into(frame: &Frame, dst: &mut BytesMut) {
    dst.extend_from_slice(frame.command.as_str().as_bytes());
    dst.put_slice(b"\r\n");
    for (k, v) in &frame.headers {
        dst.extend_from_slice(k.as_bytes());
        dst.put_u8(b':');
        dst.extend_from_slice(v.as_bytes());
        dst.put_slice(b"\r\n");
    }
    dst.put_slice(b"\r\n");
    if let Some(body) = &frame.body {
        dst.extend_from_slice(body.as_bytes());
    }
    dst.put_u8(0);
    dst.put_slice(b"\r\n");
}

/// Wire bytes of a single frame.
pub fn encode(frame: &Frame) -> BytesMut {
    let mut dst = BytesMut::new();
    encode_into(frame, &mut dst);
    dst
}

impl Encoder<Frame> for StompCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_into(&item, dst);
        Ok(())
    }
}

impl Decoder for StompCodec {
    type Item = InboundChunk;
    type Error = io::Error;

    /// Yield everything before the next NUL and consume the NUL.
    ///
    /// Bytes after the NUL (typically the `\r\n` trailer, or the start of
    /// another frame) stay in `src` for the next call.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match src.iter().position(|&b| b == 0) {
            Some(nul) => {
                let chunk = src.split_to(nul);
                src.advance(1);
                Ok(Some(InboundChunk::Terminated(chunk)))
            }
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(chunk) = self.decode(src)? {
            return Ok(Some(chunk));
        }
        if src.is_empty() {
            Ok(None)
        } else {
            Ok(Some(InboundChunk::Unterminated(src.split())))
        }
    }
}

/// Split raw inbound bytes into text lines on `\n` only.
///
/// This is a line scan, not a frame parse: NUL bytes are not boundaries and
/// several frames in one buffer flatten into one sequence. One trailing
/// `\r` is stripped from each line, invalid UTF-8 is replaced, and trailing
/// empty lines are dropped, so an empty buffer yields no lines at all.
pub fn split_lines(raw: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(raw);
    let mut lines: Vec<String> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect();
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

/// Value after the first `:` of the first line containing `name:`.
///
/// The value is returned raw; no STOMP unescaping is applied.
pub fn extract_header_value(lines: &[String], name: &str) -> Option<String> {
    let needle = format!("{}:", name);
    lines
        .iter()
        .find(|line| line.contains(&needle))
        .and_then(|line| value_after_colon(line))
}

/// Every `message-id` found in `lines`, one per matching line, in order.
pub fn message_ids(lines: &[String]) -> Vec<String> {
    let needle = format!("{}:", MESSAGE_ID_HEADER);
    lines
        .iter()
        .filter(|line| line.contains(&needle))
        .filter_map(|line| value_after_colon(line))
        .collect()
}

fn value_after_colon(line: &str) -> Option<String> {
    line.split_once(':').map(|(_, v)| v.to_string())
}
