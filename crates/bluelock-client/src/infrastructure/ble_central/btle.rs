//! `btleplug`-backed implementation of [`BleCentralPort`].
//!
//! Bridges the crate's [`CentralEvent`] stream into the connector's event
//! channel and owns the live peripheral handle plus the resolved command
//! characteristic.
//!
//! Two places deliberately synthesize events instead of forwarding platform
//! ones:
//!
//! - `connect` emits [`BleCentralEvent::Connected`] itself once the connect
//!   future resolves (and the bridge ignores `DeviceConnected`), so the
//!   connector sees exactly one connection event per attempt.
//! - `write_command` emits [`BleCentralEvent::WriteConfirmed`] from the
//!   write future's result, because `btleplug` reports write completion
//!   inline rather than through a separate confirmation callback.

use std::sync::Arc;

use async_trait::async_trait;
use btleplug::api::{
    Central, CentralEvent, CentralState, Characteristic, Manager as _, Peripheral as _,
    ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

use bluelock_core::identity::{PeerIdentity, COMMAND_CHAR_UUID};

use super::{BleCentralError, BleCentralEvent, BleCentralPort};

fn platform_err(e: btleplug::Error) -> BleCentralError {
    BleCentralError::Platform(e.to_string())
}

/// The real BLE central adapter.
pub struct BtleplugCentral {
    adapter: Adapter,
    /// The connected peripheral, if any.  `Option::take` in `disconnect`
    /// guards against double release.
    peripheral: Mutex<Option<Peripheral>>,
    /// The resolved command characteristic on the live connection.
    command_char: Mutex<Option<Characteristic>>,
    event_tx: mpsc::Sender<BleCentralEvent>,
}

impl BtleplugCentral {
    /// Opens the first system Bluetooth adapter and starts the event bridge.
    ///
    /// Returns the port plus the event receiver to hand to
    /// [`BleUnlockConnector::new`](super::BleUnlockConnector::new).
    pub async fn new() -> Result<(Arc<Self>, mpsc::Receiver<BleCentralEvent>), BleCentralError> {
        let manager = Manager::new().await.map_err(platform_err)?;
        let adapter = manager
            .adapters()
            .await
            .map_err(platform_err)?
            .into_iter()
            .next()
            .ok_or_else(|| BleCentralError::Platform("no bluetooth adapter found".into()))?;

        let (event_tx, event_rx) = mpsc::channel(64);
        let central = Arc::new(Self {
            adapter,
            peripheral: Mutex::new(None),
            command_char: Mutex::new(None),
            event_tx,
        });

        let raw_events = central
            .adapter
            .events()
            .await
            .map_err(platform_err)?;
        tokio::spawn(Arc::clone(&central).event_bridge(raw_events));

        Ok((central, event_rx))
    }

    async fn event_bridge(
        self: Arc<Self>,
        mut raw: std::pin::Pin<Box<dyn futures::Stream<Item = CentralEvent> + Send>>,
    ) {
        while let Some(event) = raw.next().await {
            match event {
                CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => {
                    let Ok(peripheral) = self.adapter.peripheral(&id).await else {
                        continue;
                    };
                    let Ok(Some(props)) = peripheral.properties().await else {
                        continue;
                    };
                    let peer = PeerIdentity {
                        address: props.address.to_string(),
                        name: props.local_name.clone(),
                    };
                    let _ = self
                        .event_tx
                        .send(BleCentralEvent::Advertisement { peer, services: props.services })
                        .await;
                }
                CentralEvent::DeviceDisconnected(id) => {
                    let is_current = self
                        .peripheral
                        .lock()
                        .await
                        .as_ref()
                        .is_some_and(|p| p.id() == id);
                    if is_current {
                        let _ = self
                            .event_tx
                            .send(BleCentralEvent::Disconnected { reason: "link lost".into() })
                            .await;
                    }
                }
                // `Connected` is synthesized by `connect` (see module docs);
                // manufacturer/service-data advertisements carry nothing the
                // connector matches on beyond what DeviceUpdated provides.
                _ => {}
            }
        }
        debug!("btleplug event stream ended");
    }
}

#[async_trait]
impl BleCentralPort for BtleplugCentral {
    async fn is_powered(&self) -> bool {
        matches!(self.adapter.adapter_state().await, Ok(CentralState::PoweredOn))
    }

    async fn start_scan(&self) -> Result<(), BleCentralError> {
        // Unfiltered scan: matching happens in the connector, which also
        // accepts name-only advertisements a UUID filter would drop.
        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(platform_err)
    }

    async fn stop_scan(&self) {
        if let Err(e) = self.adapter.stop_scan().await {
            warn!(error = %e, "stop_scan failed");
        }
    }

    async fn connect(&self, peer: &PeerIdentity) -> Result<(), BleCentralError> {
        let found = self
            .adapter
            .peripherals()
            .await
            .map_err(platform_err)?
            .into_iter()
            .find(|p| p.address().to_string() == peer.address)
            .ok_or_else(|| {
                BleCentralError::Platform(format!("peer {} not in scan cache", peer.address))
            })?;

        found.connect().await.map_err(platform_err)?;
        *self.peripheral.lock().await = Some(found);
        let _ = self.event_tx.send(BleCentralEvent::Connected).await;
        Ok(())
    }

    async fn discover_services(&self) -> Result<(), BleCentralError> {
        let guard = self.peripheral.lock().await;
        let peripheral = guard.as_ref().ok_or(BleCentralError::NotConnected)?;

        peripheral.discover_services().await.map_err(platform_err)?;
        let command_char = peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == COMMAND_CHAR_UUID);
        let found = command_char.is_some();
        *self.command_char.lock().await = command_char;

        let _ = self
            .event_tx
            .send(BleCentralEvent::ServicesResolved { command_attribute_found: found })
            .await;
        Ok(())
    }

    async fn write_command(&self, value: u8) -> Result<(), BleCentralError> {
        let guard = self.peripheral.lock().await;
        let peripheral = guard.as_ref().ok_or(BleCentralError::NotConnected)?;
        let char_guard = self.command_char.lock().await;
        let characteristic = char_guard.as_ref().ok_or(BleCentralError::NotConnected)?;

        let result = peripheral
            .write(characteristic, &[value], WriteType::WithResponse)
            .await;
        if let Err(ref e) = result {
            warn!(error = %e, "command write failed");
        }
        let _ = self
            .event_tx
            .send(BleCentralEvent::WriteConfirmed { success: result.is_ok() })
            .await;
        // The outcome is reported through the confirmation event; an issued
        // write is a success from the caller's point of view.
        Ok(())
    }

    async fn disconnect(&self) {
        self.command_char.lock().await.take();
        if let Some(peripheral) = self.peripheral.lock().await.take() {
            if let Err(e) = peripheral.disconnect().await {
                warn!(error = %e, "peripheral disconnect failed");
            }
        }
    }
}
