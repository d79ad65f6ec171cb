//! Minimal STOMP client for "connect, do one thing, disconnect" use.
//!
//! Each [`StompClient`] call opens a fresh connection through a
//! [`Transport`], sends CONNECT, performs a single operation (a
//! transactional SEND, or a SUBSCRIBE / ACK / UNSUBSCRIBE cycle) and closes
//! the connection again.
//!
//! Inbound frames carry no length prefix. Reads stop at the first NUL
//! terminator, at end-of-stream, or when nothing arrives within the
//! configured read timeout; that timeout is the normal "drained" signal,
//! not an error.
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod frame;
pub mod parser;
pub mod session;
pub mod transport;

pub use client::{NO_VALUE, StompClient};
pub use codec::{InboundChunk, StompCodec, encode, extract_header_value, split_lines};
pub use config::{AckMode, ClientConfig, DEFAULT_PORT, DEFAULT_READ_TIMEOUT, DEFAULT_TRANSACTION_ID};
pub use error::{ConnError, ServerError};
pub use frame::{Command, Frame, ServerFrame};
pub use session::{DrainEnd, Drained, Session};
#[cfg(feature = "tls")]
pub use transport::TlsTransport;
pub use transport::{TcpTransport, Transport};
