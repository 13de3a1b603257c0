//! The input-injection actuator: presents the handheld as a Bluetooth HID
//! keyboard and types on whichever host is bound to it.
//!
//! # Registration lifecycle
//!
//! ```text
//! Unregistered ──initialize()──> Registering ──adapter event──> Registered
//!                                                                │
//!                                                    host bound / host unbound
//! ```
//!
//! `initialize()` always unregisters before registering.  Hosts cache HID
//! descriptors and a half-torn-down previous registration otherwise leaves
//! the peer seeing a stale "Other Device"; starting from a clean slate
//! recovers from that.  An "already unregistered" outcome is a no-op, not a
//! failure.
//!
//! # Send ordering
//!
//! Report frames travel over an unordered callback channel, but keystrokes
//! must land on the peer in character order, so every `send_*` operation
//! holds an internal async mutex for its full frame sequence.  Concurrent
//! callers queue behind each other rather than interleaving frames.
//!
//! The per-frame `hold` delay from the encoder is honored here: the encoder
//! states the timing contract, the actuator sleeps it.

pub mod mock;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, info, warn};

use bluelock_core::hid::descriptor::{QosSettings, SdpRecord, KEYBOARD_REPORT_MAP};
use bluelock_core::hid::encoder::{encode_action, encode_text, KeyAction, TimedReport};
use bluelock_core::hid::report::KEYBOARD_REPORT_ID;
use bluelock_core::identity::PeerIdentity;

/// Errors surfaced by a [`HidPeripheralPort`] implementation.
#[derive(Debug, Error)]
pub enum HidPeripheralError {
    /// The peripheral has no active registration (tolerated by
    /// `initialize()`'s pre-unregister step).
    #[error("peripheral is not registered")]
    NotRegistered,
    /// The requested peer is not known to the platform.
    #[error("no such peer: {0}")]
    UnknownPeer(String),
    /// Any other platform-level failure.
    #[error("platform error: {0}")]
    Platform(String),
}

/// Registration state of the emulated keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    Unregistered,
    /// A register (or the preceding clean-slate unregister) is in flight.
    Registering,
    Registered,
}

/// Events delivered by the platform adapter to the actuator.
#[derive(Debug, Clone)]
pub enum HidPeripheralEvent {
    /// The platform confirmed or revoked the app registration.  `plugged`
    /// carries a host that was already connected when registration landed.
    RegistrationChanged {
        registered: bool,
        plugged: Option<PeerIdentity>,
    },
    /// A host accepted our connection and can now receive reports.
    HostConnected(PeerIdentity),
    /// The bound host went away.
    HostDisconnected,
}

/// Platform boundary for the HID device profile.
///
/// The embedding platform (Android `BluetoothHidDevice`, BlueZ profile
/// registration, ...) supplies the implementation; tests use
/// [`mock::MockHidPeripheral`].
#[async_trait]
pub trait HidPeripheralPort: Send + Sync {
    /// Whether the underlying radio is powered on.
    async fn is_radio_enabled(&self) -> bool;

    /// Removes any existing registration.  Implementations must return
    /// [`HidPeripheralError::NotRegistered`] (not success) when there was
    /// nothing to remove, so callers can distinguish the cases if they care.
    async fn unregister(&self) -> Result<(), HidPeripheralError>;

    /// Registers the keyboard app with the given SDP record, QoS settings,
    /// and report descriptor.  Completion is reported asynchronously via
    /// [`HidPeripheralEvent::RegistrationChanged`].
    async fn register(
        &self,
        sdp: SdpRecord,
        qos: QosSettings,
        report_map: &[u8],
    ) -> Result<(), HidPeripheralError>;

    /// Peers bonded at the platform level.
    async fn bonded_peers(&self) -> Vec<PeerIdentity>;

    /// Requests a connection to `peer`.  Acceptance is reported via
    /// [`HidPeripheralEvent::HostConnected`].
    async fn connect(&self, peer: &PeerIdentity) -> Result<(), HidPeripheralError>;

    /// Sends one input report to the bound host.
    async fn send_report(&self, report_id: u8, frame: &[u8; 8])
        -> Result<(), HidPeripheralError>;
}

/// The input-injection actuator.
///
/// Owns the peripheral registration, tracks the bound host, and drives the
/// keystroke encoder to emit report frames.  All observable state is
/// published on `watch` channels with this component as the single writer.
pub struct InputActuator {
    port: Arc<dyn HidPeripheralPort>,
    registration_tx: watch::Sender<RegistrationState>,
    host_tx: watch::Sender<Option<PeerIdentity>>,
    status_tx: watch::Sender<String>,
    /// Serializes whole send operations so frame sequences never interleave.
    send_gate: Mutex<()>,
}

impl InputActuator {
    /// Creates the actuator and spawns its event pump over `events`.
    pub fn new(
        port: Arc<dyn HidPeripheralPort>,
        events: mpsc::Receiver<HidPeripheralEvent>,
    ) -> Arc<Self> {
        let (registration_tx, _) = watch::channel(RegistrationState::Unregistered);
        let (host_tx, _) = watch::channel(None);
        let (status_tx, _) = watch::channel("Disconnected".to_string());

        let actuator = Arc::new(Self {
            port,
            registration_tx,
            host_tx,
            status_tx,
            send_gate: Mutex::new(()),
        });

        tokio::spawn(Self::event_pump(Arc::clone(&actuator), events));
        actuator
    }

    /// Observes the registration lifecycle.
    pub fn registration(&self) -> watch::Receiver<RegistrationState> {
        self.registration_tx.subscribe()
    }

    /// Observes the currently bound host (0 or 1 peer).
    pub fn bound_host(&self) -> watch::Receiver<Option<PeerIdentity>> {
        self.host_tx.subscribe()
    }

    /// Observes the human-readable connection status.
    pub fn status(&self) -> watch::Receiver<String> {
        self.status_tx.subscribe()
    }

    /// Peers bonded at the platform level, for caller-side target pickers.
    pub async fn bonded_peers(&self) -> Vec<PeerIdentity> {
        self.port.bonded_peers().await
    }

    /// Registers the handheld as an input peripheral.
    ///
    /// Returns `false` without state change (beyond status) if the radio is
    /// off, and `false` after resetting to `Unregistered` if the register
    /// request itself could not be issued.  `true` means the request went
    /// out; confirmation arrives as a `RegistrationChanged` event.
    pub async fn initialize(&self) -> bool {
        if !self.port.is_radio_enabled().await {
            self.status_tx.send_replace("Bluetooth off".to_string());
            return false;
        }

        self.registration_tx.send_replace(RegistrationState::Registering);

        // Clean-slate unregister; "nothing registered" is the normal case.
        match self.port.unregister().await {
            Ok(()) => debug!("cleared previous registration"),
            Err(HidPeripheralError::NotRegistered) => {}
            Err(e) => warn!(error = %e, "pre-register unregister failed"),
        }

        match self
            .port
            .register(
                SdpRecord::keyboard(),
                QosSettings::best_effort(),
                &KEYBOARD_REPORT_MAP,
            )
            .await
        {
            Ok(()) => {
                info!("keyboard registration requested");
                true
            }
            Err(e) => {
                warn!(error = %e, "keyboard registration failed");
                self.registration_tx.send_replace(RegistrationState::Unregistered);
                self.status_tx.send_replace("Registration failed".to_string());
                false
            }
        }
    }

    /// Connects to a peer by address, preferring a live bonded-peer record
    /// over a raw address lookup.
    ///
    /// Returns `false` if the peripheral is not registered or the connect
    /// request could not be issued.
    pub async fn connect_to_address(&self, address: &str) -> bool {
        if *self.registration_tx.borrow() != RegistrationState::Registered {
            warn!(address, "connect requested before registration completed");
            return false;
        }

        let peer = self
            .port
            .bonded_peers()
            .await
            .into_iter()
            .find(|p| p.address == address)
            .unwrap_or_else(|| PeerIdentity::new(address));

        debug!(peer = %peer, "connecting to saved host");
        match self.port.connect(&peer).await {
            Ok(()) => true,
            Err(e) => {
                warn!(peer = %peer, error = %e, "connect failed");
                false
            }
        }
    }

    /// Best-effort fan-out: issues an independent connect attempt to every
    /// bonded peer.  Returns `true` iff at least one attempt was issued;
    /// no ordering or acceptance is implied.
    pub async fn connect_to_any_bonded(&self) -> bool {
        let mut attempted = false;
        for peer in self.port.bonded_peers().await {
            debug!(peer = %peer, "fan-out connect attempt");
            match self.port.connect(&peer).await {
                Ok(()) => attempted = true,
                Err(e) => warn!(peer = %peer, error = %e, "fan-out connect failed"),
            }
        }
        attempted
    }

    /// Types `text` on the bound host, character by character.
    ///
    /// Returns `false` with zero frames transmitted if no host is bound.
    /// Individual report failures are logged and skipped; a half-typed
    /// credential is recoverable by the caller, a torn-down session is not.
    pub async fn send_text(&self, text: &str) -> bool {
        let _gate = self.send_gate.lock().await;
        if self.host_tx.borrow().is_none() {
            return false;
        }
        for report in encode_text(text) {
            self.transmit(&report).await;
        }
        true
    }

    /// Sends Ctrl+A (select-all) to the bound host.
    pub async fn send_select_all(&self) -> bool {
        self.send_action(KeyAction::SelectAll).await
    }

    /// Sends Backspace to the bound host.
    pub async fn send_backspace(&self) -> bool {
        self.send_action(KeyAction::Backspace).await
    }

    /// Sends the lock shortcut (GUI+L) to the bound host.
    pub async fn send_lock_shortcut(&self) -> bool {
        self.send_action(KeyAction::LockShortcut).await
    }

    async fn send_action(&self, action: KeyAction) -> bool {
        let _gate = self.send_gate.lock().await;
        if self.host_tx.borrow().is_none() {
            return false;
        }
        for report in encode_action(action) {
            self.transmit(&report).await;
        }
        true
    }

    async fn transmit(&self, report: &TimedReport) {
        if let Err(e) = self
            .port
            .send_report(KEYBOARD_REPORT_ID, report.frame.as_bytes())
            .await
        {
            warn!(error = %e, "report send failed");
        }
        tokio::time::sleep(report.hold).await;
    }

    async fn event_pump(self: Arc<Self>, mut events: mpsc::Receiver<HidPeripheralEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                HidPeripheralEvent::RegistrationChanged { registered, plugged } => {
                    debug!(registered, "registration changed");
                    if registered {
                        self.registration_tx.send_replace(RegistrationState::Registered);
                        match plugged {
                            Some(host) => {
                                self.status_tx.send_replace("Connected".to_string());
                                self.host_tx.send_replace(Some(host));
                            }
                            None => {
                                self.status_tx.send_replace("Disconnected".to_string());
                                self.host_tx.send_replace(None);
                            }
                        }
                    } else {
                        self.registration_tx.send_replace(RegistrationState::Unregistered);
                        self.host_tx.send_replace(None);
                        self.status_tx.send_replace("Disconnected".to_string());
                    }
                }
                HidPeripheralEvent::HostConnected(host) => {
                    info!(host = %host, "host bound");
                    self.host_tx.send_replace(Some(host));
                    self.status_tx.send_replace("Connected".to_string());
                }
                HidPeripheralEvent::HostDisconnected => {
                    info!("host unbound");
                    self.host_tx.send_replace(None);
                    self.status_tx.send_replace("Disconnected".to_string());
                }
            }
        }
        debug!("hid event channel closed; pump exiting");
    }
}
