//! The two wire vocabularies shared with the peer's unlock agent.
//!
//! - [`command`] – single-byte command codes written to the BLE command
//!   characteristic, plus the peer-reported status bytes.
//! - [`line`] – the newline-terminated ASCII grammar spoken over the
//!   stream transport (authentication, lock/unlock, telemetry).

pub mod command;
pub mod line;

pub use command::{CommandId, STATUS_LOCKED, STATUS_UNLOCKED};
pub use line::{parse_line, SessionCommand, SessionEvent};
