//! The keystroke encoder: characters and composite actions to timed report
//! frame sequences.
//!
//! # Contract
//!
//! `encode_*` returns an ordered sequence of ([`HidReportFrame`], hold
//! duration) pairs.  Two rules are load-bearing for the peer:
//!
//! 1. Every non-release frame is followed by exactly one all-zero release
//!    frame before the next non-release frame.  Hosts latch the last report
//!    they received; skipping a release leaves a key held down ("stuck key")
//!    on the peer until the connection drops.
//!
//! 2. The `hold` duration attached to each frame is a **required** minimum
//!    delay the sender must observe after transmitting it, not a hint.  The
//!    encoder cannot enforce timing itself (it does no I/O); the actuator
//!    that transmits the frames owns that obligation.
//!
//! The encoder is a total function: unknown characters degrade to the space
//! key via [`map_char`](crate::hid::keymap::map_char), never an error.

use std::time::Duration;

use crate::hid::keymap::{map_char, KeyStroke, MOD_LEFT_CTRL, MOD_LEFT_GUI, USAGE_A, USAGE_BACKSPACE, USAGE_L};
use crate::hid::report::HidReportFrame;

/// Minimum delay between consecutive symbols, required by peer input-rate
/// expectations (lock-screen input handlers drop faster bursts).
pub const INTER_KEY_DELAY: Duration = Duration::from_millis(20);

/// One report frame plus the minimum time the sender must wait after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedReport {
    pub frame: HidReportFrame,
    pub hold: Duration,
}

/// Composite actions with a fixed frame sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Ctrl+A.
    SelectAll,
    /// The Backspace key.
    Backspace,
    /// GUI+L – the peer's lock shortcut.
    LockShortcut,
}

fn press_release(stroke: KeyStroke) -> [TimedReport; 2] {
    [
        TimedReport {
            frame: HidReportFrame::from_keystroke(stroke),
            hold: INTER_KEY_DELAY,
        },
        TimedReport {
            frame: HidReportFrame::RELEASE,
            hold: INTER_KEY_DELAY,
        },
    ]
}

/// Encodes one character as a press frame followed by its release frame.
pub fn encode_char(c: char) -> [TimedReport; 2] {
    press_release(map_char(c))
}

/// Encodes a string as per-character press/release pairs, in order.
pub fn encode_text(text: &str) -> Vec<TimedReport> {
    let mut out = Vec::with_capacity(text.chars().count() * 2);
    for c in text.chars() {
        out.extend_from_slice(&encode_char(c));
    }
    out
}

/// Encodes a composite action as its fixed press/release sequence.
pub fn encode_action(action: KeyAction) -> [TimedReport; 2] {
    let stroke = match action {
        KeyAction::SelectAll => KeyStroke { modifier: MOD_LEFT_CTRL, usage: USAGE_A },
        KeyAction::Backspace => KeyStroke::plain(USAGE_BACKSPACE),
        KeyAction::LockShortcut => KeyStroke { modifier: MOD_LEFT_GUI, usage: USAGE_L },
    };
    press_release(stroke)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hid::keymap::MOD_LEFT_SHIFT;

    /// Checks the stuck-key invariant: press frames and release frames
    /// strictly alternate, starting with a press and ending with a release.
    fn assert_alternating(seq: &[TimedReport]) {
        assert!(!seq.is_empty());
        assert_eq!(seq.len() % 2, 0, "sequence must pair press with release");
        for pair in seq.chunks(2) {
            assert!(!pair[0].frame.is_release(), "even slots must be presses");
            assert!(pair[1].frame.is_release(), "odd slots must be releases");
        }
    }

    #[test]
    fn test_every_lowercase_letter_is_press_then_single_release() {
        for c in 'a'..='z' {
            let seq = encode_char(c);
            assert_alternating(&seq);
            assert_eq!(seq[0].frame.usage(), c as u8 - b'a' + 0x04);
            // Deterministic across repeated calls.
            assert_eq!(encode_char(c), seq);
        }
    }

    #[test]
    fn test_uppercase_sets_shift_on_press_only() {
        let seq = encode_char('Z');
        assert_eq!(seq[0].frame.modifier(), MOD_LEFT_SHIFT);
        assert_eq!(seq[1].frame.modifier(), 0);
    }

    #[test]
    fn test_encode_text_preserves_character_order() {
        let seq = encode_text("ab1");
        assert_alternating(&seq);
        let usages: Vec<u8> = seq
            .iter()
            .filter(|r| !r.frame.is_release())
            .map(|r| r.frame.usage())
            .collect();
        assert_eq!(usages, vec![0x04, 0x05, 0x1E]);
    }

    #[test]
    fn test_encode_text_empty_is_empty() {
        assert!(encode_text("").is_empty());
    }

    #[test]
    fn test_select_all_is_ctrl_a() {
        let seq = encode_action(KeyAction::SelectAll);
        assert_alternating(&seq);
        assert_eq!(seq[0].frame.modifier(), MOD_LEFT_CTRL);
        assert_eq!(seq[0].frame.usage(), USAGE_A);
    }

    #[test]
    fn test_lock_shortcut_is_gui_l() {
        let seq = encode_action(KeyAction::LockShortcut);
        assert_eq!(seq[0].frame.modifier(), MOD_LEFT_GUI);
        assert_eq!(seq[0].frame.usage(), USAGE_L);
        assert!(seq[1].frame.is_release());
    }

    #[test]
    fn test_backspace_has_no_modifier() {
        let seq = encode_action(KeyAction::Backspace);
        assert_eq!(seq[0].frame.modifier(), 0);
        assert_eq!(seq[0].frame.usage(), USAGE_BACKSPACE);
    }

    #[test]
    fn test_every_frame_carries_minimum_hold() {
        for report in encode_text("Hi@ 9\n") {
            assert!(report.hold >= INTER_KEY_DELAY);
        }
    }
}
