//! Operational limits (normative defaults).

use serde::{Deserialize, Serialize};

/// Tunables the coordinator enforces.
///
/// Values are intentionally explicit about their units to avoid
/// confusion. Partial config files work: any omitted field takes its
/// default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupLimits {
    /// WAL segment size of the host install. Power of two, 1 MiB..=1 GiB.
    pub wal_segment_bytes: u64,
    /// Cap on the operator-supplied label string.
    pub max_label_bytes: usize,
}

impl Default for BackupLimits {
    fn default() -> Self {
        Self {
            wal_segment_bytes: 16 * 1024 * 1024,
            max_label_bytes: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BackupLimits;

    #[test]
    fn limits_defaults_are_pinned() {
        let limits = BackupLimits::default();
        assert_eq!(limits.wal_segment_bytes, 16 * 1024 * 1024);
        assert_eq!(limits.max_label_bytes, 1024);
    }

    #[test]
    fn partial_config_keeps_defaults_for_the_rest() {
        let limits: BackupLimits = serde_json::from_str(r#"{"max_label_bytes": 64}"#).unwrap();
        assert_eq!(limits.max_label_bytes, 64);
        assert_eq!(limits.wal_segment_bytes, 16 * 1024 * 1024);
    }
}
