//! The fixed 8-byte HID keyboard input report frame.
//!
//! Wire format (boot-protocol keyboard, report ID 1):
//! ```text
//! [modifier:1][reserved=0:1][usage:1][0:1][0:1][0:1][0:1][0:1]
//! ```
//! The descriptor allows up to six simultaneous usage IDs in bytes 2–7;
//! BlueLock only ever populates byte 2.  A "key released" frame is always
//! the all-zero variant.

use crate::hid::keymap::KeyStroke;

/// Report ID under which keyboard frames are sent (matches the report map
/// in [`crate::hid::descriptor`]).
pub const KEYBOARD_REPORT_ID: u8 = 1;

/// One 8-byte keyboard input report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HidReportFrame([u8; 8]);

impl HidReportFrame {
    /// The all-zero "all keys released" frame.
    pub const RELEASE: HidReportFrame = HidReportFrame([0; 8]);

    /// Builds a press frame for one key plus its modifier bits.
    pub const fn press(modifier: u8, usage: u8) -> Self {
        HidReportFrame([modifier, 0, usage, 0, 0, 0, 0, 0])
    }

    /// Builds the press frame for a translated keystroke.
    pub const fn from_keystroke(stroke: KeyStroke) -> Self {
        Self::press(stroke.modifier, stroke.usage)
    }

    /// True if this is the all-zero release frame.
    pub fn is_release(&self) -> bool {
        self.0 == [0; 8]
    }

    /// The raw bytes exactly as they go over the report channel.
    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// Modifier byte (byte 0).
    pub fn modifier(&self) -> u8 {
        self.0[0]
    }

    /// Usage ID slot (byte 2).
    pub fn usage(&self) -> u8 {
        self.0[2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hid::keymap::{MOD_LEFT_GUI, USAGE_L};

    #[test]
    fn test_press_frame_layout_is_byte_exact() {
        let frame = HidReportFrame::press(MOD_LEFT_GUI, USAGE_L);
        assert_eq!(frame.as_bytes(), &[0x08, 0x00, 0x0F, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_reserved_byte_is_always_zero() {
        let frame = HidReportFrame::press(0xFF, 0xFF);
        assert_eq!(frame.as_bytes()[1], 0);
    }

    #[test]
    fn test_release_frame_is_all_zero() {
        assert_eq!(HidReportFrame::RELEASE.as_bytes(), &[0u8; 8]);
        assert!(HidReportFrame::RELEASE.is_release());
        assert!(!HidReportFrame::press(0, 0x04).is_release());
    }
}
