//! Wall-clock time for session timestamps.

use serde::{Deserialize, Serialize};

/// Unix-epoch milliseconds.
///
/// Copy is fine here - it's just a measurement, not causality. The label
/// artifact renders this as RFC 3339 UTC and parses it back exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WallClock(pub u64);

impl WallClock {
    pub fn now() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self(ms)
    }
}
