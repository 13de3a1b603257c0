//! Peer identity and the fixed 128-bit service signatures.
//!
//! The signatures must match the peer's advertisement and service records
//! exactly; they are shared constants of the whole system, not
//! configuration.

use std::fmt;

use uuid::Uuid;

/// BLE service advertised by the peer's unlock agent.
///
/// Format: 5A401569-F53B-4444-A512-FB7115852555
pub const UNLOCK_SERVICE_UUID: Uuid = Uuid::from_u128(0x5A401569_F53B_4444_A512_FB7115852555);

/// Writable command characteristic inside the unlock service (one-byte
/// [`CommandId`](crate::protocol::command::CommandId) values are written
/// here).
pub const COMMAND_CHAR_UUID: Uuid = Uuid::from_u128(0x5A401569_F53B_4444_A512_FB7115852558);

/// Read/notify session-state characteristic (peer-reported lock status;
/// declared for completeness, not consumed by this core).
pub const SESSION_CHAR_UUID: Uuid = Uuid::from_u128(0x5A401569_F53B_4444_A512_FB7115852557);

/// RFCOMM-equivalent service record for the stream transport.  The peer
/// registers the stream listener under the same value as the unlock
/// service.
pub const STREAM_SERVICE_UUID: Uuid = UNLOCK_SERVICE_UUID;

/// Case-insensitive fragment matched against advertised device names during
/// discovery.  Name matching is a fallback for peers whose advertisement
/// omits or truncates the service UUID list.
pub const TARGET_NAME_FRAGMENT: &str = "BLUELOCK";

/// An opaque peer address plus an optional display name.
///
/// Equality and hashing use the address only: two scan results for the same
/// radio are the same peer even if one of them resolved a name and the
/// other did not.
#[derive(Debug, Clone)]
pub struct PeerIdentity {
    /// Platform address string (e.g. "AA:BB:CC:DD:EE:FF").
    pub address: String,
    /// Advertised or bonded display name, if known.
    pub name: Option<String>,
}

impl PeerIdentity {
    pub fn new(address: impl Into<String>) -> Self {
        Self { address: address.into(), name: None }
    }

    pub fn named(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self { address: address.into(), name: Some(name.into()) }
    }

    /// The display name if known, otherwise the address.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.address)
    }
}

impl PartialEq for PeerIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for PeerIdentity {}

impl std::hash::Hash for PeerIdentity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.address.hash(state);
    }
}

impl fmt::Display for PeerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} ({})", self.address),
            None => write!(f, "{}", self.address),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_uuid_matches_peer_constant() {
        assert_eq!(
            UNLOCK_SERVICE_UUID.to_string(),
            "5a401569-f53b-4444-a512-fb7115852555"
        );
    }

    #[test]
    fn test_command_char_is_distinct_from_service() {
        assert_ne!(COMMAND_CHAR_UUID, UNLOCK_SERVICE_UUID);
        assert_ne!(COMMAND_CHAR_UUID, SESSION_CHAR_UUID);
    }

    #[test]
    fn test_peer_equality_ignores_name() {
        let a = PeerIdentity::named("AA:BB", "Desk PC");
        let b = PeerIdentity::new("AA:BB");
        let c = PeerIdentity::new("CC:DD");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_label_prefers_name() {
        assert_eq!(PeerIdentity::named("AA:BB", "Desk PC").label(), "Desk PC");
        assert_eq!(PeerIdentity::new("AA:BB").label(), "AA:BB");
    }
}
