use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default broker port for STOMP over TLS.
pub const DEFAULT_PORT: u16 = 61617;

/// How long a read phase waits for more bytes before treating the inbound
/// stream as drained.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Transaction identifier bracketing every operation.
pub const DEFAULT_TRANSACTION_ID: &str = "sendtx";

/// Subscription acknowledgement modes as defined by STOMP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckMode {
    Auto,
    Client,
    ClientIndividual,
}

impl AckMode {
    /// Wire value of the `ack` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            AckMode::Auto => "auto",
            AckMode::Client => "client",
            AckMode::ClientIndividual => "client-individual",
        }
    }
}

impl fmt::Display for AckMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AckMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(AckMode::Auto),
            "client" => Ok(AckMode::Client),
            "client-individual" => Ok(AckMode::ClientIndividual),
            other => Err(format!(
                "unknown ack mode '{}': expected auto, client or client-individual",
                other
            )),
        }
    }
}

/// Broker address, credentials and session tuning.
///
/// Read-only once handed to a [`StompClient`](crate::StompClient); every
/// operation reads it to open its own connection.
///
/// ```
/// use std::time::Duration;
/// use stomp_oneshot::ClientConfig;
///
/// let config = ClientConfig::new("broker.example.com", 61617, "guest", "guest")
///     .with_read_timeout(Duration::from_secs(5));
/// assert_eq!(config.transaction_id, "sendtx");
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Broker host name, also used as the TLS server name
    pub server: String,
    pub port: u16,
    pub login: String,
    pub passcode: String,
    /// Upper bound on each read phase; expiry means "nothing more to read"
    pub read_timeout: Duration,
    /// Transaction id used by BEGIN, SUBSCRIBE, UNSUBSCRIBE and COMMIT
    pub transaction_id: String,
}

impl ClientConfig {
    pub fn new(
        server: impl Into<String>,
        port: u16,
        login: impl Into<String>,
        passcode: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into(),
            port,
            login: login.into(),
            passcode: passcode.into(),
            read_timeout: DEFAULT_READ_TIMEOUT,
            transaction_id: DEFAULT_TRANSACTION_ID.to_string(),
        }
    }

    /// Override the read-phase timeout (builder style).
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Override the transaction id (builder style).
    pub fn with_transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = transaction_id.into();
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("login", &self.login)
            .field("passcode", &"****")
            .field("read_timeout", &self.read_timeout)
            .field("transaction_id", &self.transaction_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ClientConfig::new("h", DEFAULT_PORT, "u", "p");
        assert_eq!(c.read_timeout, Duration::from_secs(15));
        assert_eq!(c.transaction_id, "sendtx");
        assert_eq!(c.port, 61617);
    }

    #[test]
    fn debug_hides_passcode() {
        let c = ClientConfig::new("h", 1, "u", "secret");
        let s = format!("{:?}", c);
        assert!(!s.contains("secret"));
    }

    #[test]
    fn ack_mode_parses_wire_values() {
        for mode in [AckMode::Auto, AckMode::Client, AckMode::ClientIndividual] {
            assert_eq!(mode.as_str().parse::<AckMode>(), Ok(mode));
        }
        assert!("Client".parse::<AckMode>().is_err());
    }
}
