use bytes::BytesMut;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::time::{Instant, timeout_at};
use tokio_util::codec::Framed;

use crate::codec::{InboundChunk, StompCodec, message_ids, split_lines};
use crate::config::{AckMode, ClientConfig};
use crate::error::{ConnError, ServerError};
use crate::frame::Frame;
use crate::parser::parse_server_frame;
use crate::transport::Transport;

/// Why a drain stopped reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainEnd {
    /// A NUL frame terminator was read
    Terminator,
    /// The peer closed its side of the stream
    EndOfStream,
    /// Nothing arrived within the read timeout
    Idle,
}

/// Bytes collected by [`Session::drain_until_idle`].
#[derive(Debug)]
pub struct Drained {
    /// Everything read before the stop condition, NUL excluded
    pub bytes: BytesMut,
    pub end: DrainEnd,
}

/// What a subscribe/receive cycle saw and acknowledged.
#[derive(Debug)]
pub struct Delivery {
    /// Raw bytes drained after SUBSCRIBE
    pub raw: BytesMut,
    /// `raw` split into lines
    pub lines: Vec<String>,
    /// Message ids an ACK was written for, in order
    pub acked: Vec<String>,
}

/// One broker connection, alive for exactly one client operation.
///
/// A `Session` is created by [`Session::establish`], used for one
/// operation and then consumed by [`Session::finish`], which closes the
/// connection whether the operation succeeded or not. Dropping a session
/// without finishing it still releases the socket.
pub struct Session<S> {
    framed: Framed<S, StompCodec>,
    read_timeout: Duration,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an already-open stream.
    pub fn new(stream: S, read_timeout: Duration) -> Self {
        Self {
            framed: Framed::new(stream, StompCodec::new()),
            read_timeout,
        }
    }

    /// Open a connection through `transport` and authenticate on it.
    ///
    /// On failure after the connection opened, the connection is closed
    /// before the error is returned.
    pub async fn establish<T>(transport: &T, config: &ClientConfig) -> Result<Self, ConnError>
    where
        T: Transport<Stream = S>,
    {
        tracing::debug!(host = %config.server, port = config.port, "opening session");
        let stream = transport.connect(&config.server, config.port).await?;
        let mut session = Session::new(stream, config.read_timeout);
        if let Err(e) = session.authenticate(&config.login, &config.passcode).await {
            return Err(session.abort(e).await);
        }
        Ok(session)
    }

    /// Write CONNECT and drain the broker's answer.
    ///
    /// An ERROR answer fails with [`ConnError::ServerRejected`]. Anything
    /// else, including no answer at all before the read timeout, counts as
    /// an accepted login.
    pub async fn authenticate(&mut self, login: &str, passcode: &str) -> Result<(), ConnError> {
        self.write_frame(Frame::connect(login, passcode)).await?;
        let drained = self.drain_until_idle().await?;
        tracing::debug!(bytes = drained.bytes.len(), end = ?drained.end, "connect response drained");

        match parse_server_frame(&drained.bytes) {
            Ok(Some(frame)) if frame.command == "ERROR" => {
                let err = ServerError::from_frame(frame);
                tracing::warn!(message = %err.message, "broker rejected CONNECT");
                Err(ConnError::ServerRejected(err))
            }
            Ok(Some(frame)) => {
                tracing::debug!(command = %frame.command, "connect answered");
                Ok(())
            }
            Ok(None) => {
                tracing::debug!("no connect response before drain ended");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unparseable connect response");
                Ok(())
            }
        }
    }

    /// Encode and flush one frame.
    pub async fn write_frame(&mut self, frame: Frame) -> Result<(), ConnError> {
        tracing::trace!(command = %frame.command, "writing frame");
        self.framed.send(frame).await?;
        Ok(())
    }

    /// Read until a NUL terminator, end-of-stream, or the broker going
    /// quiet for the read timeout.
    ///
    /// The timeout is an idle timeout: each time the deadline passes with
    /// fresh bytes buffered since the last check, it starts over, so a
    /// peer that keeps sending is never cut off mid-frame. Only a full
    /// timeout without new bytes ends the drain, and that is not an error
    /// here: it is how the session learns the broker has nothing more to
    /// say. Bytes read before then are returned with [`DrainEnd::Idle`].
    /// Any other I/O failure propagates. Bytes following a NUL stay
    /// buffered for the next drain.
    pub async fn drain_until_idle(&mut self) -> Result<Drained, ConnError> {
        let mut seen = self.framed.read_buffer().len();
        let mut deadline = Instant::now() + self.read_timeout;
        loop {
            // Framed keeps partial input in its read buffer, so dropping
            // `next()` at the deadline loses nothing.
            let item = match timeout_at(deadline, self.framed.next()).await {
                Ok(item) => item,
                Err(_elapsed) => {
                    let buffered = self.framed.read_buffer().len();
                    if buffered > seen {
                        tracing::trace!(buffered, "bytes still arriving, extending drain");
                        seen = buffered;
                        deadline = Instant::now() + self.read_timeout;
                        continue;
                    }
                    return Ok(Drained {
                        bytes: self.framed.read_buffer_mut().split(),
                        end: DrainEnd::Idle,
                    });
                }
            };
            return match item {
                Some(Ok(InboundChunk::Terminated(bytes))) => Ok(Drained {
                    bytes,
                    end: DrainEnd::Terminator,
                }),
                Some(Ok(InboundChunk::Unterminated(bytes))) => Ok(Drained {
                    bytes,
                    end: DrainEnd::EndOfStream,
                }),
                Some(Err(e)) => Err(e.into()),
                None => Ok(Drained {
                    bytes: BytesMut::new(),
                    end: DrainEnd::EndOfStream,
                }),
            };
        }
    }

    /// BEGIN, SEND, COMMIT.
    pub async fn send_transacted(
        &mut self,
        transaction: &str,
        destination: &str,
        message: &str,
    ) -> Result<(), ConnError> {
        self.write_frame(Frame::begin(transaction)).await?;
        self.write_frame(Frame::send(destination, message)).await?;
        self.write_frame(Frame::commit(transaction)).await?;
        tracing::debug!(destination, bytes = message.len(), "send committed");
        Ok(())
    }

    /// BEGIN, SUBSCRIBE, drain, ACK each `message-id` line, UNSUBSCRIBE,
    /// COMMIT.
    pub async fn receive_pending(
        &mut self,
        transaction: &str,
        queue: &str,
        ack: Option<AckMode>,
    ) -> Result<Delivery, ConnError> {
        self.write_frame(Frame::begin(transaction)).await?;
        self.write_frame(Frame::subscribe(queue, transaction, ack)).await?;

        let drained = self.drain_until_idle().await?;
        tracing::debug!(queue, bytes = drained.bytes.len(), end = ?drained.end, "subscription drained");

        let lines = split_lines(&drained.bytes);
        let acked = message_ids(&lines);
        for id in &acked {
            tracing::debug!(queue, message_id = %id, "acknowledging");
            self.write_frame(Frame::ack(id)).await?;
        }

        self.write_frame(Frame::unsubscribe(queue, transaction)).await?;
        self.write_frame(Frame::commit(transaction)).await?;

        Ok(Delivery {
            raw: drained.bytes,
            lines,
            acked,
        })
    }

    /// Close the connection and hand back the operation's outcome.
    ///
    /// A close failure is reported only when the operation itself
    /// succeeded; otherwise the original error wins.
    pub async fn finish<R>(self, outcome: Result<R, ConnError>) -> Result<R, ConnError> {
        match outcome {
            Ok(value) => {
                self.close().await?;
                Ok(value)
            }
            Err(e) => Err(self.abort(e).await),
        }
    }

    /// Shut down the connection.
    ///
    /// Every write is flushed as it happens, so nothing is pending here;
    /// unsent bytes of a failed write are discarded.
    pub async fn close(self) -> Result<(), ConnError> {
        let mut stream = self.framed.into_inner();
        stream.shutdown().await?;
        tracing::debug!("session closed");
        Ok(())
    }

    async fn abort(self, err: ConnError) -> ConnError {
        tracing::debug!(error = %err, "closing session after failure");
        if let Err(close_err) = self.close().await {
            tracing::debug!(error = %close_err, "close after failure also failed");
        }
        err
    }
}
