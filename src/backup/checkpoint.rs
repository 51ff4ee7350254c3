//! The starting checkpoint of a session.
//!
//! Every backup starts from a completed checkpoint: its redo position is
//! the first record replay needs, so data files copied afterwards can
//! only be newer than it. The engine decides how the checkpoint happens
//! (fresh pass, coalesced with one in flight, or a standby's
//! restartpoint); this step just demands one and vets the answer.

use crate::engine::{Checkpoint, CheckpointMode, EngineError, WalEngine};

use super::error::BackupError;

pub fn establish_checkpoint(
    engine: &dyn WalEngine,
    mode: CheckpointMode,
) -> Result<Checkpoint, BackupError> {
    let checkpoint = engine
        .force_checkpoint(mode)
        .map_err(|source| BackupError::CheckpointFailed { source })?;
    if checkpoint.redo > checkpoint.location {
        // An engine answer we cannot anchor a backup to.
        return Err(BackupError::CheckpointFailed {
            source: EngineError::Checkpoint {
                reason: format!(
                    "redo {} is past the checkpoint record at {}",
                    checkpoint.redo, checkpoint.location
                ),
            },
        });
    }
    tracing::debug!(redo = %checkpoint.redo, location = %checkpoint.location, ?mode, "checkpoint established");
    Ok(checkpoint)
}
