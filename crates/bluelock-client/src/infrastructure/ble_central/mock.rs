//! Mock BLE central for unit testing the unlock connector.
//!
//! Records every port call and lets tests script adapter events (scan
//! results, connection transitions, write confirmations) through
//! [`MockBleCentral::emit`], mirroring how the real platform delivers its
//! callbacks.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use bluelock_core::identity::PeerIdentity;

use super::{BleCentralError, BleCentralEvent, BleCentralPort};

/// Records every port call; behavior toggles let tests exercise error paths.
pub struct MockBleCentral {
    powered: AtomicBool,
    /// When set, `start_scan` fails with `ScanUnavailable`.
    fail_scan: AtomicBool,
    /// When set, `connect` fails with a platform error.
    fail_connect: AtomicBool,
    start_scan_calls: AtomicUsize,
    stop_scan_calls: AtomicUsize,
    discover_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
    /// Every peer passed to `connect`.
    pub connect_calls: Mutex<Vec<PeerIdentity>>,
    /// Every byte passed to `write_command`, in order.
    pub written_commands: Mutex<Vec<u8>>,
    event_tx: mpsc::Sender<BleCentralEvent>,
}

impl MockBleCentral {
    /// Creates the mock plus the event receiver to hand to the connector.
    pub fn new() -> (Arc<Self>, mpsc::Receiver<BleCentralEvent>) {
        let (event_tx, event_rx) = mpsc::channel(16);
        let mock = Arc::new(Self {
            powered: AtomicBool::new(true),
            fail_scan: AtomicBool::new(false),
            fail_connect: AtomicBool::new(false),
            start_scan_calls: AtomicUsize::new(0),
            stop_scan_calls: AtomicUsize::new(0),
            discover_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
            connect_calls: Mutex::new(Vec::new()),
            written_commands: Mutex::new(Vec::new()),
            event_tx,
        });
        (mock, event_rx)
    }

    /// Injects an adapter event as if the platform delivered it.
    pub async fn emit(&self, event: BleCentralEvent) {
        self.event_tx.send(event).await.expect("connector dropped its event channel");
    }

    pub fn set_powered(&self, powered: bool) {
        self.powered.store(powered, Ordering::SeqCst);
    }

    pub fn set_fail_scan(&self, fail: bool) {
        self.fail_scan.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }

    pub fn start_scan_count(&self) -> usize {
        self.start_scan_calls.load(Ordering::SeqCst)
    }

    pub fn stop_scan_count(&self) -> usize {
        self.stop_scan_calls.load(Ordering::SeqCst)
    }

    pub fn discover_count(&self) -> usize {
        self.discover_calls.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BleCentralPort for MockBleCentral {
    async fn is_powered(&self) -> bool {
        self.powered.load(Ordering::SeqCst)
    }

    async fn start_scan(&self) -> Result<(), BleCentralError> {
        if self.fail_scan.load(Ordering::SeqCst) {
            return Err(BleCentralError::ScanUnavailable);
        }
        self.start_scan_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stop_scan(&self) {
        self.stop_scan_calls.fetch_add(1, Ordering::SeqCst);
    }

    async fn connect(&self, peer: &PeerIdentity) -> Result<(), BleCentralError> {
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(BleCentralError::Platform("mock connect failure".into()));
        }
        self.connect_calls.lock().unwrap().push(peer.clone());
        Ok(())
    }

    async fn discover_services(&self) -> Result<(), BleCentralError> {
        self.discover_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn write_command(&self, value: u8) -> Result<(), BleCentralError> {
        self.written_commands.lock().unwrap().push(value);
        Ok(())
    }

    async fn disconnect(&self) {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
    }
}
