use std::fmt;

use crate::config::AckMode;

/// Commands this client ever writes to the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Connect,
    Send,
    Subscribe,
    Unsubscribe,
    Begin,
    Commit,
    Ack,
}

impl Command {
    /// Wire spelling of the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Connect => "CONNECT",
            Command::Send => "SEND",
            Command::Subscribe => "SUBSCRIBE",
            Command::Unsubscribe => "UNSUBSCRIBE",
            Command::Begin => "BEGIN",
            Command::Commit => "COMMIT",
            Command::Ack => "ACK",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outbound STOMP frame.
///
/// `Frame` contains the command, an ordered list of headers (key/value
/// pairs) and an optional text body. Header values and bodies are written
/// verbatim: no STOMP escaping is applied, so values must not contain line
/// breaks or NUL bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// STOMP command
    pub command: Command,
    /// Ordered headers as (key, value) pairs
    pub headers: Vec<(String, String)>,
    /// Text body, only carried by SEND
    pub body: Option<String>,
}

impl Frame {
    /// Create a new frame with the given command and empty headers/body.
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Add a header (builder style).
    ///
    /// Parameters
    /// - `key`: header name (converted to `String`).
    /// - `value`: header value (converted to `String`).
    ///
    /// Returns the mutated `Frame` allowing builder-style chaining.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Set the frame body (builder style).
    pub fn set_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Get the value of a header by name.
    ///
    /// Returns the first header value matching the given key (case-sensitive),
    /// or `None` if no such header exists.
    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// `CONNECT` carrying the broker credentials.
    pub fn connect(login: &str, passcode: &str) -> Self {
        Self::new(Command::Connect)
            .header("login", login)
            .header("passcode", passcode)
    }

    /// `BEGIN` for the given transaction.
    pub fn begin(transaction: &str) -> Self {
        Self::new(Command::Begin).header("transaction", transaction)
    }

    /// `COMMIT` for the given transaction.
    pub fn commit(transaction: &str) -> Self {
        Self::new(Command::Commit).header("transaction", transaction)
    }

    /// `SEND` with a literal text body.
    pub fn send(destination: &str, body: &str) -> Self {
        Self::new(Command::Send)
            .header("destination", destination)
            .set_body(body)
    }

    /// `SUBSCRIBE` to `destination` inside `transaction`.
    ///
    /// The `ack` header is only emitted when a mode is given; brokers then
    /// fall back to their default (`auto`).
    pub fn subscribe(destination: &str, transaction: &str, ack: Option<AckMode>) -> Self {
        let frame = Self::new(Command::Subscribe)
            .header("destination", destination)
            .header("transaction", transaction);
        match ack {
            Some(mode) => frame.header("ack", mode.as_str()),
            None => frame,
        }
    }

    /// `UNSUBSCRIBE` from `destination` inside `transaction`.
    pub fn unsubscribe(destination: &str, transaction: &str) -> Self {
        Self::new(Command::Unsubscribe)
            .header("destination", destination)
            .header("transaction", transaction)
    }

    /// `ACK` for a delivered message.
    pub fn ack(message_id: &str) -> Self {
        Self::new(Command::Ack).header("message-id", message_id)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Command: {}", self.command)?;
        for (k, v) in &self.headers {
            // never echo credentials into logs
            if k == "passcode" {
                writeln!(f, "{}: ****", k)?;
            } else {
                writeln!(f, "{}: {}", k, v)?;
            }
        }
        writeln!(
            f,
            "Body ({} bytes)",
            self.body.as_ref().map_or(0, |b| b.len())
        )
    }
}

/// A frame received from the broker (CONNECTED, MESSAGE, ERROR, ...).
///
/// Unlike [`Frame`] the command is free-form, since the broker may answer
/// with commands this client never sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerFrame {
    /// STOMP command as sent by the broker
    pub command: String,
    /// Ordered headers as (key, value) pairs, unescaped
    pub headers: Vec<(String, String)>,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl ServerFrame {
    /// Get the value of a header by name (first match, case-sensitive).
    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The body decoded as UTF-8, replacing invalid sequences.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl fmt::Display for ServerFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Command: {}", self.command)?;
        for (k, v) in &self.headers {
            writeln!(f, "{}: {}", k, v)?;
        }
        writeln!(f, "Body ({} bytes)", self.body.len())
    }
}
