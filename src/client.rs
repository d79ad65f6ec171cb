use crate::config::{AckMode, ClientConfig};
use crate::error::ConnError;
use crate::frame::ServerFrame;
use crate::parser::parse_server_frame;
use crate::session::Session;
use crate::transport::Transport;

/// Returned by [`StompClient::fetch_one`] when nothing was read.
pub const NO_VALUE: &str = "No Value";

/// Short-lived STOMP client: every call opens its own connection,
/// authenticates, performs one operation and closes.
///
/// The client holds no connection state, so it can be shared between
/// tasks (for example behind an `Arc`) and called concurrently.
///
/// ```no_run
/// use stomp_oneshot::{AckMode, ClientConfig, StompClient, TcpTransport};
///
/// # async fn run() -> Result<(), stomp_oneshot::ConnError> {
/// let config = ClientConfig::new("127.0.0.1", 61613, "guest", "guest");
/// let client = StompClient::new(config, TcpTransport);
///
/// client.send_message("/queue/jobs", "hello").await?;
/// let text = client.fetch_one("/queue/jobs", Some(AckMode::Client)).await?;
/// println!("{}", text);
/// # Ok(())
/// # }
/// ```
pub struct StompClient<T> {
    config: ClientConfig,
    transport: T,
}

impl<T: Transport> StompClient<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send `message` to `destination` inside a BEGIN/COMMIT transaction.
    ///
    /// Success means every frame was written to the connection; the
    /// broker's acceptance is not confirmed.
    pub async fn send_message(&self, destination: &str, message: &str) -> Result<(), ConnError> {
        let mut session = Session::establish(&self.transport, &self.config).await?;
        let outcome = session
            .send_transacted(&self.config.transaction_id, destination, message)
            .await;
        session.finish(outcome).await?;
        tracing::info!(destination, "message sent");
        Ok(())
    }

    /// Subscribe to `queue`, acknowledge whatever is pending, unsubscribe.
    ///
    /// Returns the last line of the text that arrived, or [`NO_VALUE`] when
    /// nothing did. The line is a crude stand-in for the message body; use
    /// [`fetch_frame`](Self::fetch_frame) for a parsed frame.
    pub async fn fetch_one(&self, queue: &str, ack: Option<AckMode>) -> Result<String, ConnError> {
        let delivery = self.fetch(queue, ack).await?;
        Ok(delivery
            .lines
            .last()
            .cloned()
            .unwrap_or_else(|| NO_VALUE.to_string()))
    }

    /// Same wire exchange as [`fetch_one`](Self::fetch_one), returning the
    /// received frame parsed, or `None` when nothing arrived.
    pub async fn fetch_frame(
        &self,
        queue: &str,
        ack: Option<AckMode>,
    ) -> Result<Option<ServerFrame>, ConnError> {
        let delivery = self.fetch(queue, ack).await?;
        parse_server_frame(&delivery.raw).map_err(ConnError::Protocol)
    }

    async fn fetch(
        &self,
        queue: &str,
        ack: Option<AckMode>,
    ) -> Result<crate::session::Delivery, ConnError> {
        let mut session = Session::establish(&self.transport, &self.config).await?;
        let outcome = session
            .receive_pending(&self.config.transaction_id, queue, ack)
            .await;
        let delivery = session.finish(outcome).await?;
        tracing::info!(queue, acked = delivery.acked.len(), "fetch complete");
        Ok(delivery)
    }
}

#[cfg(feature = "tls")]
impl StompClient<crate::transport::TlsTransport> {
    /// TLS client trusting the CA certificates in a PEM file.
    pub fn with_trust_anchors(
        config: ClientConfig,
        pem_path: impl AsRef<std::path::Path>,
    ) -> Result<Self, ConnError> {
        let transport = crate::transport::TlsTransport::from_pem_file(pem_path)?;
        Ok(Self::new(config, transport))
    }
}
