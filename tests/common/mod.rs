//! Scripted in-memory transport shared by the session tests.
#![allow(dead_code)]

use futures::FutureExt;
use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use stomp_oneshot::{ClientConfig, Transport};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::time::Sleep;

pub const CONNECTED: &[u8] = b"CONNECTED\r\nversion:1.0\r\n\r\n\0\r\n";

/// One scripted read outcome. An exhausted script reads as end-of-stream.
pub enum Step {
    /// Bytes handed out, possibly over several reads
    Data(Vec<u8>),
    /// Nothing to read for this long, then the script continues
    Delay(Duration),
    /// Never becomes readable; only the read timeout ends it
    Stall,
    /// The read fails
    Fail(io::ErrorKind),
}

/// What the client did to one connection.
#[derive(Clone, Default)]
pub struct Wire {
    written: Arc<Mutex<Vec<u8>>>,
    shutdowns: Arc<AtomicUsize>,
}

impl Wire {
    pub fn written(&self) -> Vec<u8> {
        self.written.lock().unwrap().clone()
    }

    /// Written frames as text, split on the `\0\r\n` trailer.
    pub fn frames(&self) -> Vec<String> {
        let text = String::from_utf8(self.written()).unwrap();
        let mut frames: Vec<String> = text.split("\0\r\n").map(str::to_string).collect();
        assert_eq!(frames.pop().as_deref(), Some(""), "trailing partial frame");
        frames
    }

    /// The command line of every written frame.
    pub fn commands(&self) -> Vec<String> {
        self.frames()
            .iter()
            .map(|f| f.split("\r\n").next().unwrap().to_string())
            .collect()
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

pub struct MockStream {
    script: VecDeque<Step>,
    wire: Wire,
    writes_left: Option<usize>,
    delay: Option<Pin<Box<Sleep>>>,
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = &mut *self;
        match this.script.front_mut() {
            None => Poll::Ready(Ok(())),
            Some(Step::Stall) => Poll::Pending,
            Some(Step::Delay(d)) => {
                let d = *d;
                let sleep = this
                    .delay
                    .get_or_insert_with(|| Box::pin(tokio::time::sleep(d)));
                if sleep.as_mut().poll(cx).is_pending() {
                    return Poll::Pending;
                }
                this.delay = None;
                this.script.pop_front();
                cx.waker().wake_by_ref();
                Poll::Pending
            }
            Some(Step::Fail(kind)) => {
                let kind = *kind;
                this.script.pop_front();
                Poll::Ready(Err(io::Error::new(kind, "scripted read failure")))
            }
            Some(Step::Data(data)) => {
                let n = data.len().min(buf.remaining());
                buf.put_slice(&data[..n]);
                data.drain(..n);
                if data.is_empty() {
                    this.script.pop_front();
                }
                Poll::Ready(Ok(()))
            }
        }
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.writes_left.as_mut() {
            Some(0) => {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "scripted write failure",
                )));
            }
            Some(n) => *n -= 1,
            None => {}
        }
        self.wire.written.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.wire.shutdowns.fetch_add(1, Ordering::SeqCst);
        Poll::Ready(Ok(()))
    }
}

/// Hands out pre-scripted streams in order; refuses once they run out.
#[derive(Default)]
pub struct MockTransport {
    streams: Mutex<VecDeque<MockStream>>,
    dialed: Mutex<Vec<(String, u16)>>,
}

impl MockTransport {
    /// Transport with a single scripted connection.
    pub fn with_script(script: Vec<Step>) -> (Self, Wire) {
        let transport = Self::default();
        let wire = transport.add(script);
        (transport, wire)
    }

    /// Queue another connection.
    pub fn add(&self, script: Vec<Step>) -> Wire {
        self.add_failing_writes(script, None)
    }

    /// Queue a connection whose writes fail after `writes` succeed.
    pub fn add_failing_writes(&self, script: Vec<Step>, writes: Option<usize>) -> Wire {
        let wire = Wire::default();
        self.streams.lock().unwrap().push_back(MockStream {
            script: script.into(),
            wire: wire.clone(),
            writes_left: writes,
            delay: None,
        });
        wire
    }

    pub fn dialed(&self) -> Vec<(String, u16)> {
        self.dialed.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    type Stream = MockStream;

    fn connect<'a>(&'a self, host: &'a str, port: u16) -> BoxFuture<'a, io::Result<MockStream>> {
        self.dialed.lock().unwrap().push((host.to_string(), port));
        let next = self.streams.lock().unwrap().pop_front();
        async move {
            next.ok_or_else(|| io::Error::new(io::ErrorKind::ConnectionRefused, "refused"))
        }
        .boxed()
    }
}

pub fn config() -> ClientConfig {
    ClientConfig::new("broker.test", 61617, "user", "pw")
        .with_read_timeout(Duration::from_millis(50))
}
