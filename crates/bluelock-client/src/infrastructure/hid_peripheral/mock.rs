//! Mock HID peripheral for unit testing the input actuator.
//!
//! The real adapter talks to a platform Bluetooth HID profile that needs a
//! radio, a bonded host, and user-visible pairing.  The mock replaces every
//! call with in-memory recording so tests can assert exactly which reports
//! were emitted and in what order, and lets the test script adapter events
//! (registration, host attach/detach) through [`MockHidPeripheral::emit`].

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use bluelock_core::hid::descriptor::{QosSettings, SdpRecord};
use bluelock_core::identity::PeerIdentity;

use super::{HidPeripheralError, HidPeripheralEvent, HidPeripheralPort};

/// Records every port call; behavior toggles let tests exercise error paths.
pub struct MockHidPeripheral {
    /// Backs `is_radio_enabled`.
    radio_enabled: AtomicBool,
    /// When set, `send_report` fails with a platform error.
    fail_sends: AtomicBool,
    /// When set, `register` fails with a platform error.
    fail_register: AtomicBool,
    /// Peers returned by `bonded_peers`.
    bonded: Mutex<Vec<PeerIdentity>>,
    /// Every SDP record passed to `register`.
    pub register_calls: Mutex<Vec<(SdpRecord, QosSettings, usize)>>,
    /// Number of `unregister` calls.
    unregister_calls: AtomicUsize,
    /// Every peer passed to `connect`.
    pub connect_calls: Mutex<Vec<PeerIdentity>>,
    /// Every `(report_id, frame)` passed to `send_report`, in order.
    pub sent_reports: Mutex<Vec<(u8, [u8; 8])>>,
    event_tx: mpsc::Sender<HidPeripheralEvent>,
}

impl MockHidPeripheral {
    /// Creates the mock plus the event receiver to hand to the actuator.
    pub fn new() -> (Arc<Self>, mpsc::Receiver<HidPeripheralEvent>) {
        let (event_tx, event_rx) = mpsc::channel(16);
        let mock = Arc::new(Self {
            radio_enabled: AtomicBool::new(true),
            fail_sends: AtomicBool::new(false),
            fail_register: AtomicBool::new(false),
            bonded: Mutex::new(Vec::new()),
            register_calls: Mutex::new(Vec::new()),
            unregister_calls: AtomicUsize::new(0),
            connect_calls: Mutex::new(Vec::new()),
            sent_reports: Mutex::new(Vec::new()),
            event_tx,
        });
        (mock, event_rx)
    }

    /// Injects an adapter event as if the platform delivered it.
    pub async fn emit(&self, event: HidPeripheralEvent) {
        self.event_tx.send(event).await.expect("actuator dropped its event channel");
    }

    pub fn set_radio_enabled(&self, enabled: bool) {
        self.radio_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_register(&self, fail: bool) {
        self.fail_register.store(fail, Ordering::SeqCst);
    }

    pub fn add_bonded(&self, peer: PeerIdentity) {
        self.bonded.lock().unwrap().push(peer);
    }

    pub fn unregister_count(&self) -> usize {
        self.unregister_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HidPeripheralPort for MockHidPeripheral {
    async fn is_radio_enabled(&self) -> bool {
        self.radio_enabled.load(Ordering::SeqCst)
    }

    /// Always reports `NotRegistered`: the common real-world case the
    /// actuator must tolerate during its clean-slate pre-unregister.
    async fn unregister(&self) -> Result<(), HidPeripheralError> {
        self.unregister_calls.fetch_add(1, Ordering::SeqCst);
        Err(HidPeripheralError::NotRegistered)
    }

    async fn register(
        &self,
        sdp: SdpRecord,
        qos: QosSettings,
        report_map: &[u8],
    ) -> Result<(), HidPeripheralError> {
        if self.fail_register.load(Ordering::SeqCst) {
            return Err(HidPeripheralError::Platform("mock register failure".into()));
        }
        self.register_calls.lock().unwrap().push((sdp, qos, report_map.len()));
        Ok(())
    }

    async fn bonded_peers(&self) -> Vec<PeerIdentity> {
        self.bonded.lock().unwrap().clone()
    }

    async fn connect(&self, peer: &PeerIdentity) -> Result<(), HidPeripheralError> {
        self.connect_calls.lock().unwrap().push(peer.clone());
        Ok(())
    }

    async fn send_report(
        &self,
        report_id: u8,
        frame: &[u8; 8],
    ) -> Result<(), HidPeripheralError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(HidPeripheralError::Platform("mock send failure".into()));
        }
        self.sent_reports.lock().unwrap().push((report_id, *frame));
        Ok(())
    }
}
