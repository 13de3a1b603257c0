//! bluelock-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/` and
//! the binary entry point in `main.rs` share the same module tree.
//!
//! # What does bluelock-client do? (for beginners)
//!
//! This is the handheld side of BlueLock.  It can reach the peer computer
//! over three independent Bluetooth bindings, each wrapped in its own
//! connector with its own lifecycle:
//!
//! 1. **BLE attribute connector** – scans for the peer's advertisement,
//!    connects, resolves the unlock service, and writes one-byte commands
//!    (unlock, lock) to the command characteristic.
//!
//! 2. **Stream session connector** – opens a bidirectional byte stream to a
//!    bonded peer and speaks the line protocol: PIN authentication,
//!    lock/unlock commands, and CPU/RAM telemetry pushed by the peer.
//!
//! 3. **HID input actuator** – registers the handheld as a Bluetooth
//!    keyboard, then types text on the peer by sending timed 8-byte report
//!    frames.  The unlock orchestrator composes these keystrokes into the
//!    wake → clear field → type credential sequence.
//!
//! Each connector exposes its state through `tokio::sync::watch` channels:
//! exactly one task writes each field and any number of UI-level readers can
//! observe it without locking.  Platform radio APIs sit behind ports
//! (`BleCentralPort`, `HidPeripheralPort`, `StreamMedium`) with mock
//! implementations for tests and a `btleplug`-backed adapter for the BLE
//! central role.

/// Application layer: use cases composed from actuator primitives.
pub mod application;

/// Infrastructure layer: transport connectors, platform ports, and adapters.
pub mod infrastructure;
