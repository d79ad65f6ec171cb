use futures::FutureExt;
use futures::future::BoxFuture;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Opens byte-stream connections to a broker.
///
/// Implementations hand back a stream that is already secured (or
/// deliberately plain, for [`TcpTransport`]); the session layer never
/// looks below `AsyncRead + AsyncWrite`. A transport is shared by every
/// operation of a [`StompClient`](crate::StompClient), so it must be
/// `Send + Sync` and `connect` takes `&self`.
pub trait Transport: Send + Sync {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Open a fresh connection to `host:port`.
    fn connect<'a>(&'a self, host: &'a str, port: u16) -> BoxFuture<'a, io::Result<Self::Stream>>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    type Stream = T::Stream;

    fn connect<'a>(&'a self, host: &'a str, port: u16) -> BoxFuture<'a, io::Result<Self::Stream>> {
        (**self).connect(host, port)
    }
}

/// Unencrypted TCP, for brokers on a trusted network and for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpTransport;

impl Transport for TcpTransport {
    type Stream = TcpStream;

    fn connect<'a>(&'a self, host: &'a str, port: u16) -> BoxFuture<'a, io::Result<Self::Stream>> {
        async move {
            tracing::debug!(host, port, "opening tcp connection");
            let stream = TcpStream::connect((host, port)).await?;
            stream.set_nodelay(true)?;
            Ok(stream)
        }
        .boxed()
    }
}

#[cfg(feature = "tls")]
pub use tls::TlsTransport;

#[cfg(feature = "tls")]
mod tls {
    use futures::FutureExt;
    use futures::future::BoxFuture;
    use rustls::RootCertStore;
    use rustls::pki_types::ServerName;
    use std::fs::File;
    use std::io::{self, BufRead, BufReader};
    use std::path::Path;
    use std::sync::Arc;
    use tokio::net::TcpStream;
    use tokio_rustls::TlsConnector;
    use tokio_rustls::client::TlsStream;

    use super::Transport;
    use crate::error::ConnError;

    /// TLS over TCP, verifying the broker against a fixed set of trust
    /// anchors.
    ///
    /// Construction fails with [`ConnError::TransportUnavailable`] when no
    /// usable anchor can be loaded, so a misconfigured client is detected
    /// at startup rather than on its first operation.
    #[derive(Clone)]
    pub struct TlsTransport {
        connector: TlsConnector,
    }

    impl TlsTransport {
        /// Build from an explicit root store.
        pub fn from_root_store(roots: RootCertStore) -> Result<Self, ConnError> {
            if roots.is_empty() {
                return Err(ConnError::TransportUnavailable(
                    "no trust anchors loaded".to_string(),
                ));
            }
            let provider = Arc::new(rustls::crypto::ring::default_provider());
            let config = rustls::ClientConfig::builder_with_provider(provider)
                .with_safe_default_protocol_versions()
                .map_err(|e| ConnError::TransportUnavailable(format!("tls config: {}", e)))?
                .with_root_certificates(roots)
                .with_no_client_auth();
            Ok(Self {
                connector: TlsConnector::from(Arc::new(config)),
            })
        }

        /// Build from PEM-encoded CA certificates.
        ///
        /// Every certificate in the input is added as a trust anchor;
        /// non-certificate PEM sections are skipped.
        pub fn from_pem(reader: &mut dyn BufRead) -> Result<Self, ConnError> {
            let mut roots = RootCertStore::empty();
            for cert in rustls_pemfile::certs(reader) {
                let cert = cert.map_err(|e| {
                    ConnError::TransportUnavailable(format!("unreadable trust anchor: {}", e))
                })?;
                roots.add(cert).map_err(|e| {
                    ConnError::TransportUnavailable(format!("rejected trust anchor: {}", e))
                })?;
            }
            tracing::debug!(anchors = roots.len(), "loaded trust anchors");
            Self::from_root_store(roots)
        }

        /// Build from a PEM file of CA certificates.
        pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self, ConnError> {
            let path = path.as_ref();
            let file = File::open(path).map_err(|e| {
                ConnError::TransportUnavailable(format!(
                    "cannot open trust store {}: {}",
                    path.display(),
                    e
                ))
            })?;
            Self::from_pem(&mut BufReader::new(file))
        }

        /// Build from the Mozilla root set bundled by `webpki-roots`.
        pub fn with_webpki_roots() -> Result<Self, ConnError> {
            let roots = RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            Self::from_root_store(roots)
        }
    }

    impl Transport for TlsTransport {
        type Stream = TlsStream<TcpStream>;

        fn connect<'a>(
            &'a self,
            host: &'a str,
            port: u16,
        ) -> BoxFuture<'a, io::Result<Self::Stream>> {
            async move {
                let server_name = ServerName::try_from(host.to_string())
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
                tracing::debug!(host, port, "opening tls connection");
                let tcp = TcpStream::connect((host, port)).await?;
                tcp.set_nodelay(true)?;
                let stream = self.connector.connect(server_name, tcp).await?;
                tracing::debug!(host, port, "tls handshake complete");
                Ok(stream)
            }
            .boxed()
        }
    }
}
