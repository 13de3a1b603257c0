//! Bluetooth HID keyboard emulation primitives.
//!
//! Everything needed to present this device as a boot-protocol keyboard and
//! to turn text into report frames:
//!
//! - [`keymap`] – character → (modifier, usage ID) translation table.
//! - [`report`] – the fixed 8-byte input report frame.
//! - [`descriptor`] – the report map and SDP/QoS registration parameters.
//! - [`encoder`] – the keystroke encoder: text and composite actions to
//!   timed press/release frame sequences.

pub mod descriptor;
pub mod encoder;
pub mod keymap;
pub mod report;
