//! Session operation errors.

use thiserror::Error;

use crate::core::error::{InvalidLabel, LabelError};
use crate::engine::{EngineError, WalLevel};
use crate::error::{Effect, Transience};

/// Why a session start or stop was refused.
///
/// Every variant is a clean refusal: the active-session count and the
/// engine's backup state are exactly what they were before the call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BackupError {
    #[error("permission denied: {required} privilege required")]
    PermissionDenied { required: &'static str },

    #[error("malformed label artifact: {0}")]
    MalformedLabel(#[from] LabelError),

    #[error(transparent)]
    InvalidLabel(#[from] InvalidLabel),

    #[error("could not establish a starting checkpoint: {source}")]
    CheckpointFailed { source: EngineError },

    #[error("backup timeline could not be determined: {reason}")]
    InconsistentTimeline { reason: String },

    #[error("could not write the end-of-backup record: {source}")]
    StopRecordFailed { source: EngineError },

    #[error("wal level `{level}` does not support online backup")]
    UnsupportedWalLevel { level: WalLevel },

    #[error("the standby was promoted during online backup; this backup is not usable")]
    PromotedDuringBackup,

    #[error("backup session is already stopped")]
    AlreadyStopped,
}

impl BackupError {
    pub fn transience(&self) -> Transience {
        match self {
            BackupError::PermissionDenied { .. }
            | BackupError::MalformedLabel(_)
            | BackupError::InvalidLabel(_)
            | BackupError::UnsupportedWalLevel { .. }
            | BackupError::PromotedDuringBackup
            | BackupError::AlreadyStopped => Transience::Permanent,
            BackupError::CheckpointFailed { .. }
            | BackupError::InconsistentTimeline { .. }
            | BackupError::StopRecordFailed { .. } => Transience::Retryable,
        }
    }

    pub fn effect(&self) -> Effect {
        // Refusals happen before the registry is touched.
        Effect::None
    }
}
