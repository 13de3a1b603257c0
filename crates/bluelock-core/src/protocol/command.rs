//! Single-byte command codes for the attribute transport.
//!
//! Each command is one byte written to the peer's command characteristic
//! ([`COMMAND_CHAR_UUID`](crate::identity::COMMAND_CHAR_UUID)).  The peer
//! reports its lock state back on the session characteristic using the
//! `STATUS_*` bytes; this core declares them for symmetry but never reads
//! them itself.

/// Commands accepted by the peer's unlock agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandId {
    /// Unlock using the pre-shared PIN held by the peer.
    UnlockPin = 0x01,
    /// Unlock after a biometric confirmation on the handheld.
    UnlockBio = 0x02,
    /// Lock the peer.
    Lock = 0x03,
}

impl CommandId {
    /// The wire byte for this command.
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Parses a wire byte back into a command, if recognised.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(CommandId::UnlockPin),
            0x02 => Some(CommandId::UnlockBio),
            0x03 => Some(CommandId::Lock),
            _ => None,
        }
    }
}

/// Peer-reported status byte: session is locked.
pub const STATUS_LOCKED: u8 = 0x00;
/// Peer-reported status byte: session is unlocked.
pub const STATUS_UNLOCKED: u8 = 0x01;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_wire_bytes() {
        assert_eq!(CommandId::UnlockPin.as_byte(), 0x01);
        assert_eq!(CommandId::UnlockBio.as_byte(), 0x02);
        assert_eq!(CommandId::Lock.as_byte(), 0x03);
    }

    #[test]
    fn test_from_byte_round_trips_known_codes() {
        for cmd in [CommandId::UnlockPin, CommandId::UnlockBio, CommandId::Lock] {
            assert_eq!(CommandId::from_byte(cmd.as_byte()), Some(cmd));
        }
    }

    #[test]
    fn test_from_byte_rejects_unknown() {
        assert_eq!(CommandId::from_byte(0x00), None);
        assert_eq!(CommandId::from_byte(0x04), None);
        assert_eq!(CommandId::from_byte(0xFF), None);
    }
}
