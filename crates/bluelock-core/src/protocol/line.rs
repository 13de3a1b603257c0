//! The line-oriented ASCII grammar of the stream transport.
//!
//! Wire format: one message per `\n`-terminated line.
//!
//! Outbound (handheld → peer):
//! ```text
//! AUTH:<pin>\n
//! CMD:LOCK\n
//! CMD:UNLOCK:<pin>\n
//! ```
//!
//! Inbound (peer → handheld):
//! ```text
//! METRICS:KEY=VAL[;KEY=VAL...]\n   e.g. METRICS:CPU=12;RAM=45
//! AUTH:OK\n
//! AUTH:FAIL\n
//! ```
//!
//! # Parsing philosophy
//!
//! Inbound parsing is *total*: there is no error variant.  The peer agent is
//! a separate codebase on another machine, and a malformed line from it must
//! never take down the session.  Unrecognised lines surface as
//! [`SessionEvent::Other`] (diagnostic only), and malformed `KEY=VALUE`
//! pairs inside a `METRICS:` payload are skipped individually, keeping the
//! pairs around them.
//!
//! Matching is substring-based (`contains`) rather than prefix-based: the
//! peer occasionally coalesces writes, and a marker mid-buffer still
//! identifies the message.

use tracing::debug;

use crate::telemetry::{clamp_percent, MetricsUpdate};

/// Outbound messages the handheld can send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Submit the session PIN for verification.
    Auth(String),
    /// Ask the peer to lock.
    Lock,
    /// Ask the peer to unlock with the given credential payload.
    Unlock(String),
}

impl SessionCommand {
    /// Renders the command as its newline-terminated wire line.
    pub fn to_line(&self) -> String {
        match self {
            SessionCommand::Auth(pin) => format!("AUTH:{pin}\n"),
            SessionCommand::Lock => "CMD:LOCK\n".to_string(),
            SessionCommand::Unlock(pin) => format!("CMD:UNLOCK:{pin}\n"),
        }
    }
}

/// Inbound messages parsed from one received line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The peer accepted the submitted PIN.
    AuthOk,
    /// The peer rejected the submitted PIN.
    AuthFail,
    /// A telemetry sample (fields already clamped to `0..=100`).
    Metrics(MetricsUpdate),
    /// Anything else; kept for diagnostics, otherwise ignored.
    Other(String),
}

/// Parses one received line (leading/trailing whitespace ignored).
pub fn parse_line(line: &str) -> SessionEvent {
    let line = line.trim();

    if let Some(idx) = line.find("METRICS:") {
        let payload = &line[idx + "METRICS:".len()..];
        return SessionEvent::Metrics(parse_metrics(payload));
    }
    if line.contains("AUTH:OK") {
        return SessionEvent::AuthOk;
    }
    if line.contains("AUTH:FAIL") {
        return SessionEvent::AuthFail;
    }
    SessionEvent::Other(line.to_string())
}

/// Parses `KEY=VAL[;KEY=VAL...]`, skipping malformed pairs individually.
fn parse_metrics(payload: &str) -> MetricsUpdate {
    let mut update = MetricsUpdate::default();
    for pair in payload.split(';') {
        let mut kv = pair.splitn(2, '=');
        let (Some(key), Some(value)) = (kv.next(), kv.next()) else {
            debug!(pair, "skipping metrics pair without '='");
            continue;
        };
        let Ok(value) = value.trim().parse::<i64>() else {
            debug!(pair, "skipping metrics pair with non-numeric value");
            continue;
        };
        match key.trim() {
            "CPU" => update.cpu = Some(clamp_percent(value)),
            "RAM" => update.ram = Some(clamp_percent(value)),
            other => debug!(key = other, "ignoring unknown metrics key"),
        }
    }
    update
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Outbound ─────────────────────────────────────────────────────────────

    #[test]
    fn test_auth_line_carries_pin_and_newline() {
        assert_eq!(SessionCommand::Auth("1234".into()).to_line(), "AUTH:1234\n");
    }

    #[test]
    fn test_lock_and_unlock_lines() {
        assert_eq!(SessionCommand::Lock.to_line(), "CMD:LOCK\n");
        assert_eq!(
            SessionCommand::Unlock("s3cret".into()).to_line(),
            "CMD:UNLOCK:s3cret\n"
        );
    }

    // ── Inbound: auth ────────────────────────────────────────────────────────

    #[test]
    fn test_parse_auth_ok_and_fail() {
        assert_eq!(parse_line("AUTH:OK"), SessionEvent::AuthOk);
        assert_eq!(parse_line("AUTH:FAIL"), SessionEvent::AuthFail);
        // Whitespace from the peer's line terminator handling is tolerated.
        assert_eq!(parse_line("  AUTH:OK \r"), SessionEvent::AuthOk);
    }

    // ── Inbound: metrics ─────────────────────────────────────────────────────

    #[test]
    fn test_parse_metrics_both_fields() {
        assert_eq!(
            parse_line("METRICS:CPU=12;RAM=45"),
            SessionEvent::Metrics(MetricsUpdate { cpu: Some(12), ram: Some(45) })
        );
    }

    #[test]
    fn test_parse_metrics_clamps_out_of_range() {
        assert_eq!(
            parse_line("METRICS:CPU=150;RAM=-5"),
            SessionEvent::Metrics(MetricsUpdate { cpu: Some(100), ram: Some(0) })
        );
    }

    #[test]
    fn test_malformed_pair_is_skipped_not_fatal() {
        // The broken CPU pair is dropped; the RAM pair still lands.
        assert_eq!(
            parse_line("METRICS:CPU=abc;RAM=45"),
            SessionEvent::Metrics(MetricsUpdate { cpu: None, ram: Some(45) })
        );
        assert_eq!(
            parse_line("METRICS:garbage;RAM=7"),
            SessionEvent::Metrics(MetricsUpdate { cpu: None, ram: Some(7) })
        );
    }

    #[test]
    fn test_unknown_metrics_keys_are_ignored() {
        assert_eq!(
            parse_line("METRICS:GPU=50;CPU=10"),
            SessionEvent::Metrics(MetricsUpdate { cpu: Some(10), ram: None })
        );
    }

    #[test]
    fn test_metrics_marker_mid_buffer_still_parses() {
        assert_eq!(
            parse_line("xxMETRICS:CPU=1;RAM=2"),
            SessionEvent::Metrics(MetricsUpdate { cpu: Some(1), ram: Some(2) })
        );
    }

    // ── Inbound: fallthrough ─────────────────────────────────────────────────

    #[test]
    fn test_unrecognised_line_is_other() {
        assert_eq!(
            parse_line("HELLO WORLD"),
            SessionEvent::Other("HELLO WORLD".to_string())
        );
    }
}
