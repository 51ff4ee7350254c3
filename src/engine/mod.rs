//! The seam between backup coordination and the WAL-producing host.
//!
//! Everything the coordinator needs from the database engine fits a
//! four-method trait: role, wal level, checkpoints, and one record
//! append. Keeping the seam this narrow is what lets the whole session
//! protocol run against [`MemoryWalEngine`] in tests.

pub mod memory;

pub use memory::MemoryWalEngine;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::wal::{Lsn, TimelineId, WalPosition};
use crate::error::{Effect, Transience};

/// Whether the node is serving writes or replaying a primary's WAL.
///
/// One snapshot per coordinator operation: a session start or stop reads
/// this once and acts on what it saw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecoveryStatus {
    Primary { timeline: TimelineId },
    /// Replaying WAL. `position` is the last applied record, `None`
    /// until the first record lands.
    Replaying { position: Option<WalPosition> },
}

impl RecoveryStatus {
    pub fn is_replaying(self) -> bool {
        matches!(self, RecoveryStatus::Replaying { .. })
    }
}

/// WAL verbosity of the host install.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalLevel {
    Minimal,
    Replica,
    Logical,
}

impl WalLevel {
    /// `Minimal` skips the full-page writes online backup depends on.
    pub fn supports_online_backup(self) -> bool {
        self >= WalLevel::Replica
    }
}

impl fmt::Display for WalLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WalLevel::Minimal => "minimal",
            WalLevel::Replica => "replica",
            WalLevel::Logical => "logical",
        })
    }
}

/// How urgently a requested checkpoint should complete.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckpointMode {
    /// Throttled to spare concurrent load.
    Spread,
    /// Flush at full speed; the session start waits on it.
    Immediate,
}

impl CheckpointMode {
    pub fn from_fast(fast: bool) -> Self {
        if fast {
            CheckpointMode::Immediate
        } else {
            CheckpointMode::Spread
        }
    }
}

/// A completed checkpoint, as the engine reports it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Checkpoint {
    /// Where replay must begin for this checkpoint: the backup's start.
    pub redo: Lsn,
    /// Location of the checkpoint record itself. Never before `redo`.
    pub location: Lsn,
}

/// Failure surfaced by the host engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngineError {
    #[error("checkpoint request failed: {reason}")]
    Checkpoint { reason: String },
    #[error("wal append failed: {reason}")]
    WalAppend { reason: String },
}

impl EngineError {
    pub fn transience(&self) -> Transience {
        // The engine stays up across these; the same request can be retried.
        Transience::Retryable
    }

    pub fn effect(&self) -> Effect {
        Effect::None
    }
}

/// What backup coordination requires of the WAL-producing engine.
pub trait WalEngine: Send + Sync {
    fn recovery_status(&self) -> RecoveryStatus;

    fn wal_level(&self) -> WalLevel;

    /// Complete a checkpoint and report it.
    ///
    /// On a primary this may coalesce with a checkpoint already in
    /// progress. During replay it returns the latest restartpoint
    /// instead; replaying nodes cannot create checkpoints.
    fn force_checkpoint(&self, mode: CheckpointMode) -> Result<Checkpoint, EngineError>;

    /// Append the end-of-backup record and return the position after it.
    ///
    /// Fails during replay: only a primary writes WAL.
    fn append_stop_record(&self) -> Result<Lsn, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wal_level_gate() {
        assert!(!WalLevel::Minimal.supports_online_backup());
        assert!(WalLevel::Replica.supports_online_backup());
        assert!(WalLevel::Logical.supports_online_backup());
    }

    #[test]
    fn checkpoint_mode_from_fast() {
        assert_eq!(CheckpointMode::from_fast(true), CheckpointMode::Immediate);
        assert_eq!(CheckpointMode::from_fast(false), CheckpointMode::Spread);
    }
}
