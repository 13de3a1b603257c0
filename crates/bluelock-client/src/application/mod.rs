//! Application layer: use cases composed from actuator primitives.

pub mod unlock_sequence;
