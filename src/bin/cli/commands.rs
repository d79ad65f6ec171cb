use std::time::Duration;
use stomp_oneshot::{
    ClientConfig, ConnError, NO_VALUE, StompClient, TcpTransport, TlsTransport, Transport,
};

use super::args::{Cli, Command};
use super::exit_codes;

/// Build the client described by `cli` and run its subcommand.
pub async fn run(cli: &Cli) -> Result<(), (String, u8)> {
    let config = ClientConfig::new(&cli.server, cli.port, &cli.login, &cli.passcode)
        .with_read_timeout(Duration::from_millis(cli.read_timeout_ms))
        .with_transaction_id(&cli.transaction);
    let address = format!("{}:{}", cli.server, cli.port);

    if cli.plain {
        return execute(cli, StompClient::new(config, TcpTransport), &address).await;
    }

    let transport = match &cli.ca_file {
        Some(path) => TlsTransport::from_pem_file(path),
        None => TlsTransport::with_webpki_roots(),
    }
    .map_err(|e| format_connection_error(&e, &address))?;
    execute(cli, StompClient::new(config, transport), &address).await
}

async fn execute<T: Transport>(
    cli: &Cli,
    client: StompClient<T>,
    address: &str,
) -> Result<(), (String, u8)> {
    match &cli.command {
        Command::Send {
            destination,
            message,
        } => {
            client
                .send_message(destination, message)
                .await
                .map_err(|e| format_connection_error(&e, address))?;
            println!("Sent to {}", destination);
        }
        Command::Fetch {
            queue,
            ack,
            frame: false,
        } => {
            let text = client
                .fetch_one(queue, *ack)
                .await
                .map_err(|e| format_connection_error(&e, address))?;
            println!("{}", text);
        }
        Command::Fetch {
            queue,
            ack,
            frame: true,
        } => {
            let received = client
                .fetch_frame(queue, *ack)
                .await
                .map_err(|e| format_connection_error(&e, address))?;
            match received {
                Some(frame) => {
                    print!("{}", frame);
                    println!("{}", frame.body_text());
                }
                None => println!("{}", NO_VALUE),
            }
        }
    }
    Ok(())
}

/// Format a client error with user-friendly messaging and an exit code.
pub fn format_connection_error(err: &ConnError, address: &str) -> (String, u8) {
    match err {
        ConnError::Io(io_err) => {
            let message = match io_err.kind() {
                std::io::ErrorKind::ConnectionRefused => {
                    format!("Connection refused: {}", address)
                }
                std::io::ErrorKind::TimedOut => {
                    format!("Connection timed out: {}", address)
                }
                _ => {
                    format!("Connection failed: {}", io_err)
                }
            };
            (message, exit_codes::NETWORK_ERROR)
        }
        ConnError::ServerRejected(server_err) => {
            let mut message = format!("Authentication failed: {}", server_err.message);
            if let Some(body) = &server_err.body {
                message.push_str(&format!(" ({})", body));
            }
            (message, exit_codes::AUTH_ERROR)
        }
        ConnError::Protocol(msg) => (
            format!("Protocol error: {}", msg),
            exit_codes::PROTOCOL_ERROR,
        ),
        ConnError::TransportUnavailable(msg) => (
            format!("TLS setup failed: {}", msg),
            exit_codes::CONFIG_ERROR,
        ),
    }
}
