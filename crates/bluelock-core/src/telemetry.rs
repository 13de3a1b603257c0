//! Peer telemetry: CPU and RAM utilisation percentages.
//!
//! Values are clamped into `0..=100` at the parse boundary so the rest of
//! the system can treat a [`Telemetry`] as always-valid.  Samples have no
//! expiry: a stale value persists until a newer sample overwrites it.

/// Latest known peer utilisation, each field in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Telemetry {
    pub cpu: u8,
    pub ram: u8,
}

impl Telemetry {
    /// Applies a partial update, keeping fields the update does not carry.
    pub fn apply(&mut self, update: MetricsUpdate) {
        if let Some(cpu) = update.cpu {
            self.cpu = cpu;
        }
        if let Some(ram) = update.ram {
            self.ram = ram;
        }
    }
}

/// A partial telemetry sample parsed from one `METRICS:` line.  A field is
/// `None` when the line did not carry it or its pair was malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsUpdate {
    pub cpu: Option<u8>,
    pub ram: Option<u8>,
}

impl MetricsUpdate {
    /// True if the update carries at least one field.
    pub fn is_empty(&self) -> bool {
        self.cpu.is_none() && self.ram.is_none()
    }
}

/// Clamps any integer into a valid percentage.
pub fn clamp_percent(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_percent_bounds() {
        assert_eq!(clamp_percent(-5), 0);
        assert_eq!(clamp_percent(0), 0);
        assert_eq!(clamp_percent(42), 42);
        assert_eq!(clamp_percent(100), 100);
        assert_eq!(clamp_percent(150), 100);
        assert_eq!(clamp_percent(i64::MAX), 100);
        assert_eq!(clamp_percent(i64::MIN), 0);
    }

    #[test]
    fn test_apply_keeps_missing_fields() {
        let mut t = Telemetry { cpu: 30, ram: 60 };
        t.apply(MetricsUpdate { cpu: Some(55), ram: None });
        assert_eq!(t, Telemetry { cpu: 55, ram: 60 });
    }

    #[test]
    fn test_apply_full_update_overwrites_both() {
        let mut t = Telemetry::default();
        t.apply(MetricsUpdate { cpu: Some(1), ram: Some(2) });
        assert_eq!(t, Telemetry { cpu: 1, ram: 2 });
    }
}
