//! BlueLock CLI entry point.
//!
//! A thin shell over the connectors for development and desk use: the real
//! product surface is a handheld UI that embeds the library crates the same
//! way.
//!
//! ```text
//! bluelock unlock                       scan, connect, send unlock command
//! bluelock lock                         scan, connect, send lock command
//! bluelock session --addr <host:port>   stream session: auth + telemetry
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use bluelock_client::infrastructure::ble_central::btle::BtleplugCentral;
use bluelock_client::infrastructure::ble_central::{
    BleCentralPort, BleUnlockConnector, ConnectionState,
};
use bluelock_client::infrastructure::stream_link::tcp::TcpMedium;
use bluelock_client::infrastructure::stream_link::StreamSessionConnector;
use bluelock_core::identity::PeerIdentity;
use bluelock_core::protocol::command::CommandId;

/// How long the whole scan-connect-resolve flow may take before the CLI
/// gives up (the connector's own scan timeout is 10 s).
const CONNECT_DEADLINE: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "bluelock")]
#[command(about = "Remote unlock, lock, and telemetry for a BlueLock peer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan for the peer over BLE and send the unlock-by-PIN command
    Unlock,
    /// Scan for the peer over BLE and send the lock command
    Lock,
    /// Open a stream session: authenticate, then watch telemetry
    Session {
        /// Peer address (host:port for the TCP medium)
        #[arg(long, env = "BLUELOCK_PEER_ADDR")]
        addr: String,
        /// Session PIN submitted for authentication
        #[arg(long, env = "BLUELOCK_PIN")]
        pin: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Unlock => send_ble_command(CommandId::UnlockPin).await,
        Commands::Lock => send_ble_command(CommandId::Lock).await,
        Commands::Session { addr, pin } => run_session(&addr, &pin).await,
    }
}

/// Runs the scan → connect → resolve → write flow for one command.
async fn send_ble_command(command: CommandId) -> anyhow::Result<()> {
    let (port, events) = BtleplugCentral::new()
        .await
        .context("could not open a bluetooth adapter")?;
    let connector = BleUnlockConnector::new(port as Arc<dyn BleCentralPort>, events);

    // Echo status transitions while the state machine runs.
    let mut status = connector.status();
    tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let line = status.borrow().clone();
            info!(status = %line);
        }
    });

    connector.start_scan().await;

    let mut state = connector.state();
    let connected = tokio::time::timeout(
        CONNECT_DEADLINE,
        state.wait_for(|s| *s == ConnectionState::Connected),
    )
    .await;
    if !matches!(connected, Ok(Ok(_))) {
        connector.disconnect().await;
        bail!("peer not reachable: {}", connector.status().borrow().clone());
    }

    connector.send_command(command).await;
    // Give the write confirmation a moment to land in the status field.
    tokio::time::sleep(Duration::from_secs(1)).await;
    info!(result = %connector.status().borrow().clone(), "done");

    connector.disconnect().await;
    Ok(())
}

/// Connects the stream session, authenticates, and prints telemetry until
/// Ctrl-C or disconnect.
async fn run_session(addr: &str, pin: &str) -> anyhow::Result<()> {
    let connector = StreamSessionConnector::new(Arc::new(TcpMedium));
    let peer = PeerIdentity::new(addr);

    connector
        .connect(&peer)
        .await
        .with_context(|| format!("could not reach {addr}"))?;
    connector.send_pin(pin).await;

    let mut telemetry = connector.telemetry();
    let mut connected = connector.connected();
    let mut auth = connector.auth();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted; closing session");
                break;
            }
            changed = auth.changed() => {
                if changed.is_err() {
                    break;
                }
                info!(auth = ?*auth.borrow(), "auth state");
            }
            changed = telemetry.changed() => {
                if changed.is_err() {
                    break;
                }
                let sample = *telemetry.borrow();
                println!("CPU {:3}%   RAM {:3}%", sample.cpu, sample.ram);
            }
            _ = connected.changed() => {
                if !*connected.borrow() {
                    info!("peer closed the session");
                    break;
                }
            }
        }
    }

    connector.close().await;
    Ok(())
}
