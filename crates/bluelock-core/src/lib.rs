//! # bluelock-core
//!
//! Shared library for BlueLock containing the session protocol grammar, the
//! HID keystroke encoder, and the telemetry model.
//!
//! This crate is pure: it performs no I/O and has zero dependencies on
//! Bluetooth stacks, OS APIs, or async runtimes.  Everything here is a total
//! function over bytes and strings, which is what makes the transport layers
//! in `bluelock-client` testable without a radio.
//!
//! # Architecture overview (for beginners)
//!
//! BlueLock lets a handheld device unlock, lock, and monitor a nearby
//! computer over Bluetooth without touching its keyboard.  Three transports
//! cooperate:
//!
//! - **Attribute transport (BLE/GATT)** – the peer advertises a fixed service
//!   signature; the handheld writes one-byte command codes (unlock, lock) to
//!   a writable characteristic.
//!
//! - **Stream transport (RFCOMM-style)** – a long-lived byte stream carrying
//!   a newline-terminated ASCII protocol: PIN authentication, lock/unlock
//!   commands, and CPU/RAM telemetry pushed by the peer.
//!
//! - **Input-peripheral transport (Bluetooth HID)** – the handheld registers
//!   itself as a keyboard and types the credential into the peer's lock
//!   screen using 8-byte HID report frames.
//!
//! This crate defines the *payloads* for all three: command bytes and the
//! line grammar in [`protocol`], report frames and the keystroke encoder in
//! [`hid`], clamped metrics in [`telemetry`], and the fixed 128-bit service
//! signatures in [`identity`].

pub mod hid;
pub mod identity;
pub mod protocol;
pub mod telemetry;

// Re-export the most-used types at the crate root so callers can write
// `bluelock_core::HidReportFrame` instead of the full path.
pub use hid::encoder::{encode_action, encode_char, encode_text, KeyAction, TimedReport};
pub use hid::report::{HidReportFrame, KEYBOARD_REPORT_ID};
pub use identity::PeerIdentity;
pub use protocol::command::CommandId;
pub use protocol::line::{parse_line, SessionCommand, SessionEvent};
pub use telemetry::{MetricsUpdate, Telemetry};
