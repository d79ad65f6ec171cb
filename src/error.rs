use thiserror::Error;

use crate::frame::ServerFrame;

/// An ERROR frame the broker sent in answer to CONNECT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    /// The `message` header, or an empty string when absent
    pub message: String,
    /// The body as text, if any
    pub body: Option<String>,
    /// The complete frame, for callers that want other headers
    pub frame: ServerFrame,
}

impl ServerError {
    pub fn from_frame(frame: ServerFrame) -> Self {
        let message = frame.get_header("message").unwrap_or_default().to_string();
        let body = if frame.body.is_empty() {
            None
        } else {
            Some(frame.body_text())
        };
        Self {
            message,
            body,
            frame,
        }
    }
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.body {
            Some(body) => write!(f, "{}: {}", self.message, body),
            None => f.write_str(&self.message),
        }
    }
}

/// Errors returned by client operations.
#[derive(Error, Debug)]
pub enum ConnError {
    /// I/O-level error (refused, reset, TLS handshake, write failure)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Protocol-level error
    #[error("protocol error: {0}")]
    Protocol(String),
    /// The broker answered CONNECT with an ERROR frame
    #[error("server rejected connection: {0}")]
    ServerRejected(ServerError),
    /// The transport could not be built (trust anchors, TLS configuration)
    #[error("transport unavailable: {0}")]
    TransportUnavailable(String),
}
