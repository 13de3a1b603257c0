//! Character to HID usage-ID translation (page 0x07, Keyboard/Keypad page).
//!
//! # What is a HID Usage ID? (for beginners)
//!
//! The USB HID standard assigns every key a number called a *Usage ID*,
//! grouped by *Usage Page*; all keyboard keys live on page 0x07.  Letter `a`
//! is 0x04, `b` is 0x05, Enter is 0x28.  Usage IDs name **physical key
//! positions**, not characters: `A` and `a` are the same key, distinguished
//! only by the Shift bit in the report's modifier byte.
//!
//! Reference: USB HID Usage Tables 1.3, Section 10.
//!
//! # Guaranteed character set
//!
//! Only a minimal set is mapped: `a`–`z`, `A`–`Z`, `0`–`9`, space, newline
//! (Enter), and `@` (Shift+2 on a US layout).  Everything else falls back to
//! the space key.  The fallback is deliberate and lossy – a credential typed
//! into a lock screen must never silently drop characters mid-string, and a
//! visible wrong character is easier to diagnose than a shortened PIN.

/// No modifier bits set.
pub const MOD_NONE: u8 = 0x00;
/// Left Ctrl bit of the report modifier byte.
pub const MOD_LEFT_CTRL: u8 = 0x01;
/// Left Shift bit of the report modifier byte.
pub const MOD_LEFT_SHIFT: u8 = 0x02;
/// Left Alt bit of the report modifier byte.
pub const MOD_LEFT_ALT: u8 = 0x04;
/// Left GUI (Windows / Command) bit of the report modifier byte.
pub const MOD_LEFT_GUI: u8 = 0x08;

/// Usage ID of the `A` key; letters are contiguous from here (0x04–0x1D).
pub const USAGE_A: u8 = 0x04;
/// Usage ID of the `L` key (used by the lock shortcut, GUI+L).
pub const USAGE_L: u8 = 0x0F;
/// Usage ID of the `1` key; digits 1–9 are contiguous from here.
pub const USAGE_1: u8 = 0x1E;
/// Usage ID of the `2` key (`@` is Shift+2 on the US layout).
pub const USAGE_2: u8 = 0x1F;
/// Usage ID of the `0` key (out of sequence: after `9`).
pub const USAGE_0: u8 = 0x27;
/// Usage ID of the Enter key.
pub const USAGE_ENTER: u8 = 0x28;
/// Usage ID of the Backspace key.
pub const USAGE_BACKSPACE: u8 = 0x2A;
/// Usage ID of the space bar.
pub const USAGE_SPACE: u8 = 0x2C;

/// One keyboard key press: the modifier byte plus a single usage ID.
///
/// The report frame format allows up to six simultaneous usage IDs, but
/// BlueLock only ever presses one key at a time (plus modifiers), so a
/// single usage is all the encoder needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStroke {
    /// Modifier bitmask (`MOD_*` constants OR'd together).
    pub modifier: u8,
    /// HID usage ID on the keyboard page.
    pub usage: u8,
}

impl KeyStroke {
    /// A key with no modifier held.
    pub const fn plain(usage: u8) -> Self {
        Self { modifier: MOD_NONE, usage }
    }

    /// A key with Left Shift held.
    pub const fn shifted(usage: u8) -> Self {
        Self { modifier: MOD_LEFT_SHIFT, usage }
    }
}

/// Translates a character to its HID keystroke.
///
/// Total function: characters outside the guaranteed set map to the space
/// key (documented lossy fallback, never an error).
pub fn map_char(c: char) -> KeyStroke {
    match c {
        'a'..='z' => KeyStroke::plain(c as u8 - b'a' + USAGE_A),
        'A'..='Z' => KeyStroke::shifted(c as u8 - b'A' + USAGE_A),
        '1'..='9' => KeyStroke::plain(c as u8 - b'1' + USAGE_1),
        '0' => KeyStroke::plain(USAGE_0),
        ' ' => KeyStroke::plain(USAGE_SPACE),
        '\n' => KeyStroke::plain(USAGE_ENTER),
        '@' => KeyStroke::shifted(USAGE_2),
        _ => KeyStroke::plain(USAGE_SPACE),
    }
}
