use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stomp_oneshot::{AckMode, DEFAULT_PORT, DEFAULT_READ_TIMEOUT, DEFAULT_TRANSACTION_ID};

#[derive(Parser)]
#[command(name = "stomp")]
#[command(version)]
#[command(about = "Send or fetch a single STOMP message over TLS")]
pub struct Cli {
    /// Broker host name (also the TLS server name)
    #[arg(short, long, default_value = "127.0.0.1")]
    pub server: String,

    /// Broker port
    #[arg(short = 'P', long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Login username
    #[arg(short, long, default_value = "guest")]
    pub login: String,

    /// Passcode
    #[arg(short, long, default_value = "guest")]
    pub passcode: String,

    /// PEM file of CA certificates to trust (defaults to the Mozilla roots)
    #[arg(long)]
    pub ca_file: Option<PathBuf>,

    /// Connect over plain TCP instead of TLS
    #[arg(long, conflicts_with = "ca_file")]
    pub plain: bool,

    /// How long to wait for broker data before treating the stream as drained
    #[arg(long, default_value_t = DEFAULT_READ_TIMEOUT.as_millis() as u64)]
    pub read_timeout_ms: u64,

    /// Transaction id bracketing the operation
    #[arg(long, default_value = DEFAULT_TRANSACTION_ID)]
    pub transaction: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Send one message inside a transaction
    Send {
        /// Destination, e.g. /queue/orders
        destination: String,
        /// Message body
        message: String,
    },
    /// Fetch and acknowledge what is pending on a queue
    Fetch {
        /// Queue, e.g. /queue/orders
        queue: String,
        /// Ack mode: auto, client or client-individual (omitted if unset)
        #[arg(long)]
        ack: Option<AckMode>,
        /// Print the parsed frame instead of the last received line
        #[arg(long)]
        frame: bool,
    },
}
