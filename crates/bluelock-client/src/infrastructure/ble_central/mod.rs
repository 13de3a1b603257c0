//! Discovery & attribute-transport connector.
//!
//! Scans for the peer's advertisement, connects, resolves the unlock
//! service's command characteristic, and writes one-byte command codes to
//! it.  One linear state machine per connection attempt:
//!
//! ```text
//! Disconnected ──start_scan()──> Scanning ──match──> Connecting ──resolve──> Connected
//!       ^                           │                    │                      │
//!       └──── timeout / error ──────┴────────────────────┴──── disconnect ─────┘
//! ```
//!
//! Transitions are monotonic within one attempt; every error path lands back
//! on `Disconnected` so the caller can retry from a clean slate.  There is
//! no retry loop in here.
//!
//! # Scanning
//!
//! The scan is deliberately **unfiltered**.  Some peer stacks emit
//! advertisements with the service UUID list truncated or malformed, which a
//! platform-side filter would silently drop; instead every result is matched
//! here by advertised name fragment *or* service signature (either alone
//! suffices).  First match wins: scanning stops immediately and a connection
//! attempt begins.
//!
//! The 10-second timeout is a delayed self-cancelling check: when it fires
//! it acts only if the connector is still `Scanning`, so racing against a
//! concurrent successful match is safe.

pub mod btle;
pub mod mock;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use bluelock_core::identity::{PeerIdentity, TARGET_NAME_FRAGMENT, UNLOCK_SERVICE_UUID};
use bluelock_core::protocol::command::CommandId;

/// How long an unanswered scan runs before giving up.
pub const SCAN_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors surfaced by a [`BleCentralPort`] implementation.
#[derive(Debug, Error)]
pub enum BleCentralError {
    /// The radio is powered off.
    #[error("bluetooth radio is powered off")]
    PoweredOff,
    /// The platform has no usable scanner.
    #[error("scanning unavailable")]
    ScanUnavailable,
    /// No connection (or no resolved command attribute) to operate on.
    #[error("not connected")]
    NotConnected,
    /// Any other platform-level failure.
    #[error("platform error: {0}")]
    Platform(String),
}

/// Connection lifecycle of the attribute transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Scanning,
    Connecting,
    Connected,
}

/// Events delivered by the platform adapter to the connector.
#[derive(Debug, Clone)]
pub enum BleCentralEvent {
    /// A scan result: one advertising peer and its advertised service list.
    Advertisement {
        peer: PeerIdentity,
        services: Vec<Uuid>,
    },
    /// The platform scanner reported a failure.
    ScanFailed { reason: String },
    /// The connection attempt was accepted.
    Connected,
    /// The link dropped (or the connect attempt failed).
    Disconnected { reason: String },
    /// Service discovery finished; reports whether the command
    /// characteristic was found.
    ServicesResolved { command_attribute_found: bool },
    /// Completion of an attribute write.
    WriteConfirmed { success: bool },
}

/// Platform boundary for the BLE central role.
#[async_trait]
pub trait BleCentralPort: Send + Sync {
    /// Whether the radio is powered on.
    async fn is_powered(&self) -> bool;

    /// Starts an unfiltered scan; results arrive as
    /// [`BleCentralEvent::Advertisement`]s.
    async fn start_scan(&self) -> Result<(), BleCentralError>;

    /// Stops scanning.  Safe to call when not scanning.
    async fn stop_scan(&self);

    /// Requests a connection; acceptance arrives as
    /// [`BleCentralEvent::Connected`].
    async fn connect(&self, peer: &PeerIdentity) -> Result<(), BleCentralError>;

    /// Starts service discovery on the live connection; the outcome arrives
    /// as [`BleCentralEvent::ServicesResolved`].
    async fn discover_services(&self) -> Result<(), BleCentralError>;

    /// Writes one command byte to the resolved command characteristic; the
    /// outcome arrives as [`BleCentralEvent::WriteConfirmed`].
    async fn write_command(&self, value: u8) -> Result<(), BleCentralError>;

    /// Releases the connection handle.  Idempotent: implementations must
    /// guard against double release.
    async fn disconnect(&self);
}

/// Match rule applied to each scan result: advertised name contains the
/// target fragment (case-insensitive) OR the advertised services include the
/// unlock service signature.
fn is_target(peer: &PeerIdentity, services: &[Uuid]) -> bool {
    let name_match = peer
        .name
        .as_deref()
        .is_some_and(|n| n.to_uppercase().contains(TARGET_NAME_FRAGMENT));
    name_match || services.contains(&UNLOCK_SERVICE_UUID)
}

struct ConnectorInner {
    port: Arc<dyn BleCentralPort>,
    state_tx: watch::Sender<ConnectionState>,
    status_tx: watch::Sender<String>,
}

/// The discovery & attribute-transport connector.
pub struct BleUnlockConnector {
    inner: Arc<ConnectorInner>,
}

impl BleUnlockConnector {
    /// Creates the connector and spawns its event pump over `events`.
    pub fn new(port: Arc<dyn BleCentralPort>, events: mpsc::Receiver<BleCentralEvent>) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let (status_tx, _) = watch::channel("Idle".to_string());
        let inner = Arc::new(ConnectorInner { port, state_tx, status_tx });

        tokio::spawn(ConnectorInner::event_pump(Arc::clone(&inner), events));
        Self { inner }
    }

    /// Observes the connection state.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// Observes the human-readable status line.
    pub fn status(&self) -> watch::Receiver<String> {
        self.inner.status_tx.subscribe()
    }

    /// Begins an unfiltered scan for the target peer and arms the timeout.
    ///
    /// No-op (with the reason in the status field) if the radio is off or
    /// scanning is unavailable.
    pub async fn start_scan(&self) {
        let inner = &self.inner;
        if !inner.port.is_powered().await {
            inner.status_tx.send_replace("Bluetooth disabled".to_string());
            return;
        }
        if let Err(e) = inner.port.start_scan().await {
            warn!(error = %e, "could not start scan");
            inner.status_tx.send_replace(format!("Scan unavailable: {e}"));
            inner.state_tx.send_replace(ConnectionState::Disconnected);
            return;
        }

        inner.status_tx.send_replace("Scanning...".to_string());
        inner.state_tx.send_replace(ConnectionState::Scanning);

        // Delayed self-cancelling timeout: acts only if still scanning when
        // it fires, so it races safely against a concurrent match.
        let timeout_inner = Arc::clone(inner);
        tokio::spawn(async move {
            tokio::time::sleep(SCAN_TIMEOUT).await;
            if *timeout_inner.state_tx.borrow() == ConnectionState::Scanning {
                info!("scan timed out with no matching peer");
                timeout_inner.port.stop_scan().await;
                timeout_inner
                    .status_tx
                    .send_replace("Device not found (timeout)".to_string());
                timeout_inner.state_tx.send_replace(ConnectionState::Disconnected);
            }
        });
    }

    /// Stops an in-progress scan and returns to `Disconnected`.
    pub async fn stop_scan(&self) {
        self.inner.port.stop_scan().await;
        if *self.inner.state_tx.borrow() == ConnectionState::Scanning {
            self.inner.state_tx.send_replace(ConnectionState::Disconnected);
        }
    }

    /// Writes a command byte to the resolved command attribute.
    ///
    /// Success or failure is reported asynchronously through the
    /// write-confirmation event into the status field, not returned here.
    pub async fn send_command(&self, command: CommandId) {
        let inner = &self.inner;
        if *inner.state_tx.borrow() != ConnectionState::Connected {
            inner.status_tx.send_replace("Not connected".to_string());
            return;
        }
        inner
            .status_tx
            .send_replace(format!("Sending Command: 0x{:02X}...", command.as_byte()));
        if let Err(e) = inner.port.write_command(command.as_byte()).await {
            warn!(command = ?command, error = %e, "command write could not be issued");
            inner.status_tx.send_replace(format!("Write Failed: {e}"));
        }
    }

    /// Sends the unlock-by-PIN command (0x01).
    pub async fn send_unlock(&self) {
        self.send_command(CommandId::UnlockPin).await;
    }

    /// Sends the lock command (0x03).
    pub async fn send_lock(&self) {
        self.send_command(CommandId::Lock).await;
    }

    /// Drops any live connection and returns to `Disconnected`.  Idempotent.
    pub async fn disconnect(&self) {
        self.inner.port.disconnect().await;
        self.inner.state_tx.send_replace(ConnectionState::Disconnected);
        self.inner.status_tx.send_replace("Disconnected".to_string());
    }
}

impl ConnectorInner {
    async fn event_pump(self: Arc<Self>, mut events: mpsc::Receiver<BleCentralEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
        debug!("ble event channel closed; pump exiting");
    }

    async fn handle_event(&self, event: BleCentralEvent) {
        match event {
            BleCentralEvent::Advertisement { peer, services } => {
                // First match wins; results after the transition are stale.
                if *self.state_tx.borrow() != ConnectionState::Scanning {
                    return;
                }
                if !is_target(&peer, &services) {
                    return;
                }
                info!(peer = %peer, "found target peer");
                self.port.stop_scan().await;
                self.status_tx
                    .send_replace(format!("Found {}. Connecting...", peer.label()));
                self.state_tx.send_replace(ConnectionState::Connecting);
                if let Err(e) = self.port.connect(&peer).await {
                    warn!(peer = %peer, error = %e, "connect attempt failed");
                    self.status_tx.send_replace(format!("Connect failed: {e}"));
                    self.state_tx.send_replace(ConnectionState::Disconnected);
                }
            }
            BleCentralEvent::ScanFailed { reason } => {
                warn!(reason, "scan failed");
                self.status_tx.send_replace(format!("Scan failed: {reason}"));
                self.state_tx.send_replace(ConnectionState::Disconnected);
            }
            BleCentralEvent::Connected => {
                self.status_tx
                    .send_replace("Connected. Discovering Services...".to_string());
                if let Err(e) = self.port.discover_services().await {
                    warn!(error = %e, "service discovery failed");
                    self.status_tx.send_replace(format!("Discovery failed: {e}"));
                    self.port.disconnect().await;
                    self.state_tx.send_replace(ConnectionState::Disconnected);
                }
            }
            BleCentralEvent::ServicesResolved { command_attribute_found } => {
                if command_attribute_found {
                    self.status_tx.send_replace("Ready to Unlock".to_string());
                    self.state_tx.send_replace(ConnectionState::Connected);
                } else {
                    // No discovery retry: disconnect and report.
                    warn!("peer lacks the unlock service; disconnecting");
                    self.status_tx.send_replace("Service not found!".to_string());
                    self.port.disconnect().await;
                    self.state_tx.send_replace(ConnectionState::Disconnected);
                }
            }
            BleCentralEvent::Disconnected { reason } => {
                info!(reason, "link disconnected");
                self.port.disconnect().await;
                self.status_tx.send_replace(format!("Disconnected ({reason})"));
                self.state_tx.send_replace(ConnectionState::Disconnected);
            }
            BleCentralEvent::WriteConfirmed { success } => {
                if success {
                    self.status_tx.send_replace("Unlock Command Sent!".to_string());
                } else {
                    self.status_tx.send_replace("Write Failed".to_string());
                }
            }
        }
    }
}
