//! Infrastructure layer: transport connectors, platform ports, and adapters.
//!
//! Each transport has its own submodule with the same internal shape:
//! a port trait describing the platform boundary, a mock implementation for
//! tests, and the connector state machine that consumes adapter events from
//! an `mpsc` channel and publishes observable state on `watch` channels.

pub mod ble_central;
pub mod hid_peripheral;
pub mod stream_link;
