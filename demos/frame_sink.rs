//! Minimal CMND receiver.
//!
//! Listens on loopback and logs every frame it decodes. Pair it with
//! `trigger_stdin` for a local end-to-end run.
//!
//! Usage:
//!
//! ```text
//! cargo run --example frame_sink -- [--port 29200] [--debug]
//! ```

mod common;

use anyhow::Result;
use cmnd_link::DEFAULT_PORT;
use cmnd_link::protocol::read_frame;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let args = common::Args::parse();
    common::init_logging(args.debug);

    let port = args.port.unwrap_or(DEFAULT_PORT);
    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    info!(port, "Frame sink listening");

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (mut stream, peer) = accepted?;
                info!(%peer, "Client connected");

                tokio::spawn(async move {
                    loop {
                        match read_frame(&mut stream).await {
                            Ok(Some(payload)) => {
                                info!(%peer, command = %String::from_utf8_lossy(&payload), "Command received");
                            }
                            Ok(None) => {
                                info!(%peer, "Client disconnected");
                                break;
                            }
                            Err(e) => {
                                warn!(%peer, error = %e, "Dropping client");
                                break;
                            }
                        }
                    }
                });
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}
