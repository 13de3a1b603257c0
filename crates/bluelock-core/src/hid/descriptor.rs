//! Peripheral registration parameters: the keyboard report map plus the
//! SDP record and QoS settings presented to the platform HID profile.
//!
//! These values are fixed.  The report map must match the frame layout in
//! [`crate::hid::report`] byte for byte, and hosts cache it aggressively —
//! changing it without also changing the device identity tends to leave the
//! peer with a stale descriptor.

/// Boot-style keyboard report descriptor: report ID 1, 8 modifier bits,
/// one reserved byte, and a 6-slot key array (usage IDs 0–101).
pub const KEYBOARD_REPORT_MAP: [u8; 47] = [
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    0x85, 0x01, //   Report ID (1)
    0x05, 0x07, //   Usage Page (Key Codes)
    0x19, 0xE0, //   Usage Minimum (224)
    0x29, 0xE7, //   Usage Maximum (231)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute) – modifier byte
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x01, //   Input (Constant) – reserved byte
    0x95, 0x06, //   Report Count (6)
    0x75, 0x08, //   Report Size (8)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x65, //   Logical Maximum (101)
    0x05, 0x07, //   Usage Page (Key Codes)
    0x19, 0x00, //   Usage Minimum (0)
    0x29, 0x65, //   Usage Maximum (101)
    0x81, 0x00, //   Input (Data, Array) – 6-key rollover array
    0xC0, //       End Collection
];

/// Device subclass advertised in the SDP record: keyboard only.
///
/// Keyboard-only (rather than combo keyboard+pointer) makes hosts show a
/// keyboard icon and apply keyboard input policies to the connection.
pub const SUBCLASS_KEYBOARD: u8 = 0x40;

/// The SDP-equivalent registration record for the emulated keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdpRecord {
    /// Device label shown in the host's device list.
    pub name: String,
    /// Provider label.
    pub provider: String,
    /// Application description.
    pub description: String,
    /// HID device subclass byte.
    pub subclass: u8,
}

impl SdpRecord {
    /// The fixed record BlueLock registers under.
    pub fn keyboard() -> Self {
        Self {
            name: "BlueLock Keyboard".to_string(),
            provider: "BlueLock HID Provider".to_string(),
            description: "BlueLock".to_string(),
            subclass: SUBCLASS_KEYBOARD,
        }
    }
}

/// Best-effort quality-of-service parameters for the HID channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QosSettings {
    /// Token rate in bytes/second.
    pub token_rate: u32,
    /// Token bucket size in bytes.
    pub token_bucket_size: u32,
    /// Peak bandwidth in bytes/second (0 = don't care).
    pub peak_bandwidth: u32,
    /// Latency in microseconds.
    pub latency_us: u32,
    /// Delay variation in microseconds (`u32::MAX` = don't care).
    pub delay_variation_us: u32,
}

impl QosSettings {
    /// The fixed best-effort settings used for registration.
    pub const fn best_effort() -> Self {
        Self {
            token_rate: 800,
            token_bucket_size: 9,
            peak_bandwidth: 0,
            latency_us: 11250,
            delay_variation_us: u32::MAX,
        }
    }
}
