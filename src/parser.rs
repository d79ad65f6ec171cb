// Slice-based parser for a single drained server frame.
use crate::frame::ServerFrame;

type ParseResult = Result<Option<ServerFrame>, String>;

/// Undo STOMP 1.2 header escaping (`\\`, `\r`, `\n`, `\c`).
///
/// Returns an error for an unknown escape sequence or a trailing lone
/// backslash.
pub fn unescape_header_value(input: &[u8]) -> Result<Vec<u8>, String> {
    let mut out = Vec::with_capacity(input.len());
    let mut iter = input.iter();
    while let Some(&b) = iter.next() {
        if b != b'\\' {
            out.push(b);
            continue;
        }
        match iter.next() {
            Some(b'\\') => out.push(b'\\'),
            Some(b'r') => out.push(b'\r'),
            Some(b'n') => out.push(b'\n'),
            Some(b'c') => out.push(b':'),
            Some(&other) => {
                return Err(format!("invalid escape sequence '\\{}'", other as char));
            }
            None => return Err("trailing backslash in header".to_string()),
        }
    }
    Ok(out)
}

fn strip_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn to_string(bytes: Vec<u8>, what: &str) -> Result<String, String> {
    String::from_utf8(bytes).map_err(|e| format!("invalid utf8 in {}: {}", what, e))
}

/// Parse one frame out of bytes drained from the broker.
///
/// The input is what a session read up to (not including) a NUL
/// terminator, or up to end-of-stream / read timeout. Because there is no
/// terminator to wait for, the body simply runs to the end of the input
/// (or to a stray NUL, if one is present).
///
/// Returns `Ok(None)` when the input holds nothing but line breaks, and
/// `Err` when the bytes do not look like a STOMP frame.
pub fn parse_server_frame(input: &[u8]) -> ParseResult {
    let mut pos = 0usize;
    let len = input.len();

    // skip heartbeats and the CRLF trailer of a previous frame
    while pos < len && (input[pos] == b'\n' || input[pos] == b'\r') {
        pos += 1;
    }
    if pos == len {
        return Ok(None);
    }

    let (command, mut pos) = match input[pos..].iter().position(|&b| b == b'\n') {
        Some(rel) => (strip_cr(&input[pos..pos + rel]).to_vec(), pos + rel + 1),
        None => (strip_cr(&input[pos..]).to_vec(), len),
    };
    let command = to_string(command, "command")?;
    if command.is_empty() || command.contains(':') {
        return Err(format!("malformed command line: {:?}", command));
    }

    let mut headers: Vec<(String, String)> = Vec::new();
    while pos < len {
        let (line, next) = match input[pos..].iter().position(|&b| b == b'\n') {
            Some(rel) => (strip_cr(&input[pos..pos + rel]), pos + rel + 1),
            None => (strip_cr(&input[pos..]), len),
        };
        pos = next;
        if line.is_empty() {
            break;
        }
        let colon = line.iter().position(|&b| b == b':').ok_or_else(|| {
            format!(
                "malformed header line: {:?}",
                String::from_utf8_lossy(line)
            )
        })?;
        let key = to_string(unescape_header_value(&line[..colon])?, "header key")?;
        let value = to_string(unescape_header_value(&line[colon + 1..])?, "header value")?;
        headers.push((key, value));
    }

    let rest = &input[pos.min(len)..];
    let body = match rest.iter().position(|&b| b == 0) {
        Some(nul) => rest[..nul].to_vec(),
        None => rest.to_vec(),
    };

    Ok(Some(ServerFrame {
        command,
        headers,
        body,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescape_all_sequences() {
        assert_eq!(
            unescape_header_value(br"a\\b\rc\nd\ce").unwrap(),
            b"a\\b\rc\nd:e".to_vec()
        );
    }

    #[test]
    fn unescape_rejects_unknown_sequence() {
        assert!(unescape_header_value(br"a\tb").is_err());
        assert!(unescape_header_value(b"a\\").is_err());
    }

    #[test]
    fn command_only_frame() {
        let f = parse_server_frame(b"CONNECTED").unwrap().unwrap();
        assert_eq!(f.command, "CONNECTED");
        assert!(f.headers.is_empty());
        assert!(f.body.is_empty());
    }

    #[test]
    fn blank_input_is_none() {
        assert_eq!(parse_server_frame(b"\r\n\n").unwrap(), None);
        assert_eq!(parse_server_frame(b"").unwrap(), None);
    }
}
