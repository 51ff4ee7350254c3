//! In-memory [`WalEngine`] with deterministic WAL geometry.
//!
//! Models one node of the host database closely enough to exercise every
//! session path: role changes, checkpoint coalescing, wal-level gates,
//! and injected failures. Positions move in fixed record sizes so tests
//! can place a stop position exactly where they want it.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::core::wal::{Lsn, TimelineId, WalPosition};

use super::{Checkpoint, CheckpointMode, EngineError, RecoveryStatus, WalEngine, WalLevel};

/// Fresh primaries begin a short way into segment 1, as if bootstrap
/// records filled segment 0.
const INITIAL_INSERT: Lsn = Lsn::new(0x0100_0028);

#[derive(Debug)]
struct EngineState {
    status: RecoveryStatus,
    /// Next byte new WAL goes to. Meaningful on a primary only.
    insert_lsn: Lsn,
    wal_level: WalLevel,
    last_checkpoint: Option<Checkpoint>,
    /// Insert position right after the last checkpoint pass.
    checkpointed_up_to: Lsn,
    checkpoint_passes: u64,
    last_checkpoint_mode: Option<CheckpointMode>,
    fail_checkpoint: Option<String>,
    fail_stop_record: Option<String>,
}

/// See the module docs.
#[derive(Debug)]
pub struct MemoryWalEngine {
    state: Mutex<EngineState>,
}

impl MemoryWalEngine {
    /// Bytes a checkpoint record occupies in this model.
    pub const CHECKPOINT_RECORD_BYTES: u64 = 0x68;
    /// Bytes the end-of-backup record occupies in this model.
    pub const STOP_RECORD_BYTES: u64 = 0x28;

    /// A primary on `timeline`, insert position at a fixed early LSN.
    pub fn primary(timeline: TimelineId) -> Self {
        Self::with_state(EngineState {
            status: RecoveryStatus::Primary { timeline },
            insert_lsn: INITIAL_INSERT,
            wal_level: WalLevel::Replica,
            last_checkpoint: None,
            checkpointed_up_to: Lsn::new(0),
            checkpoint_passes: 0,
            last_checkpoint_mode: None,
            fail_checkpoint: None,
            fail_stop_record: None,
        })
    }

    /// A standby that has replayed up to `replayed` on `timeline`, with a
    /// restartpoint already established there.
    pub fn standby(timeline: TimelineId, replayed: Lsn) -> Self {
        Self::with_state(EngineState {
            status: RecoveryStatus::Replaying {
                position: Some(WalPosition::new(timeline, replayed)),
            },
            insert_lsn: replayed,
            wal_level: WalLevel::Replica,
            last_checkpoint: Some(Checkpoint {
                redo: replayed,
                location: replayed,
            }),
            checkpointed_up_to: replayed,
            checkpoint_passes: 0,
            last_checkpoint_mode: None,
            fail_checkpoint: None,
            fail_stop_record: None,
        })
    }

    /// A node still in early recovery: replaying, nothing applied yet.
    pub fn recovering_without_replay() -> Self {
        Self::with_state(EngineState {
            status: RecoveryStatus::Replaying { position: None },
            insert_lsn: Lsn::new(0),
            wal_level: WalLevel::Replica,
            last_checkpoint: None,
            checkpointed_up_to: Lsn::new(0),
            checkpoint_passes: 0,
            last_checkpoint_mode: None,
            fail_checkpoint: None,
            fail_stop_record: None,
        })
    }

    fn with_state(state: EngineState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    fn state(&self) -> MutexGuard<'_, EngineState> {
        // A panicked holder leaves fully-written state behind; take it.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_wal_level(&self, level: WalLevel) {
        self.state().wal_level = level;
    }

    pub fn insert_position(&self) -> Lsn {
        self.state().insert_lsn
    }

    /// Pin the insert position. Boundary tests use this to land a stop
    /// record exactly on a segment edge.
    pub fn set_insert_position(&self, lsn: Lsn) {
        self.state().insert_lsn = lsn;
    }

    /// Simulate `bytes` of regular workload WAL.
    pub fn advance(&self, bytes: u64) {
        let mut state = self.state();
        state.insert_lsn = Lsn::new(state.insert_lsn.get() + bytes);
    }

    /// Move a replaying node's applied position forward.
    pub fn set_replay_position(&self, position: WalPosition) {
        let mut state = self.state();
        state.status = RecoveryStatus::Replaying {
            position: Some(position),
        };
        state.insert_lsn = position.lsn;
    }

    /// End recovery: the node starts a new timeline and serves writes.
    pub fn promote(&self) {
        let mut state = self.state();
        if let RecoveryStatus::Replaying { position } = state.status {
            let timeline = match position {
                Some(pos) => TimelineId::new(pos.timeline.get() + 1),
                None => TimelineId::new(1),
            };
            state.status = RecoveryStatus::Primary { timeline };
        }
    }

    /// Checkpoint passes actually performed (coalesced requests don't count).
    pub fn checkpoint_passes(&self) -> u64 {
        self.state().checkpoint_passes
    }

    /// Mode of the most recent checkpoint request, coalesced or not.
    pub fn last_checkpoint_mode(&self) -> Option<CheckpointMode> {
        self.state().last_checkpoint_mode
    }

    pub fn fail_next_checkpoint(&self, reason: &str) {
        self.state().fail_checkpoint = Some(reason.to_string());
    }

    pub fn fail_next_stop_record(&self, reason: &str) {
        self.state().fail_stop_record = Some(reason.to_string());
    }
}

impl WalEngine for MemoryWalEngine {
    fn recovery_status(&self) -> RecoveryStatus {
        self.state().status
    }

    fn wal_level(&self) -> WalLevel {
        self.state().wal_level
    }

    fn force_checkpoint(&self, mode: CheckpointMode) -> Result<Checkpoint, EngineError> {
        let mut state = self.state();
        state.last_checkpoint_mode = Some(mode);
        if let Some(reason) = state.fail_checkpoint.take() {
            return Err(EngineError::Checkpoint { reason });
        }
        if state.status.is_replaying() {
            return state.last_checkpoint.ok_or(EngineError::Checkpoint {
                reason: "no restartpoint established yet".to_string(),
            });
        }
        if let Some(last) = state.last_checkpoint {
            if state.checkpointed_up_to == state.insert_lsn {
                // No WAL since the last pass; this request coalesces.
                return Ok(last);
            }
        }
        // Idle-system model: redo and the record location coincide, then
        // the record itself advances the insert position.
        let redo = state.insert_lsn;
        let checkpoint = Checkpoint {
            redo,
            location: redo,
        };
        state.insert_lsn = Lsn::new(redo.get() + Self::CHECKPOINT_RECORD_BYTES);
        state.checkpointed_up_to = state.insert_lsn;
        state.last_checkpoint = Some(checkpoint);
        state.checkpoint_passes += 1;
        Ok(checkpoint)
    }

    fn append_stop_record(&self) -> Result<Lsn, EngineError> {
        let mut state = self.state();
        if let Some(reason) = state.fail_stop_record.take() {
            return Err(EngineError::WalAppend { reason });
        }
        if state.status.is_replaying() {
            return Err(EngineError::WalAppend {
                reason: "node is replaying; WAL writes are refused".to_string(),
            });
        }
        state.insert_lsn = Lsn::new(state.insert_lsn.get() + Self::STOP_RECORD_BYTES);
        Ok(state.insert_lsn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_requests_coalesce_into_one_pass() {
        let engine = MemoryWalEngine::primary(TimelineId::new(1));
        let first = engine.force_checkpoint(CheckpointMode::Immediate).unwrap();
        let second = engine.force_checkpoint(CheckpointMode::Spread).unwrap();
        assert_eq!(first, second);
        assert_eq!(engine.checkpoint_passes(), 1);
        assert_eq!(engine.last_checkpoint_mode(), Some(CheckpointMode::Spread));
    }

    #[test]
    fn new_wal_forces_a_new_pass() {
        let engine = MemoryWalEngine::primary(TimelineId::new(1));
        let first = engine.force_checkpoint(CheckpointMode::Immediate).unwrap();
        engine.advance(0x1000);
        let second = engine.force_checkpoint(CheckpointMode::Immediate).unwrap();
        assert!(second.redo > first.redo);
        assert_eq!(engine.checkpoint_passes(), 2);
    }

    #[test]
    fn standby_serves_its_restartpoint() {
        let engine = MemoryWalEngine::standby(TimelineId::new(2), Lsn::new(0x500_0000));
        let checkpoint = engine.force_checkpoint(CheckpointMode::Immediate).unwrap();
        assert_eq!(checkpoint.redo, Lsn::new(0x500_0000));
        assert_eq!(engine.checkpoint_passes(), 0);
    }

    #[test]
    fn early_recovery_has_no_restartpoint() {
        let engine = MemoryWalEngine::recovering_without_replay();
        assert!(engine.force_checkpoint(CheckpointMode::Immediate).is_err());
    }

    #[test]
    fn stop_record_returns_the_position_after_it() {
        let engine = MemoryWalEngine::primary(TimelineId::new(1));
        let before = engine.insert_position();
        let stop = engine.append_stop_record().unwrap();
        assert_eq!(stop.get(), before.get() + MemoryWalEngine::STOP_RECORD_BYTES);
        assert_eq!(engine.insert_position(), stop);
    }

    #[test]
    fn replaying_node_refuses_wal_appends() {
        let engine = MemoryWalEngine::standby(TimelineId::new(1), Lsn::new(0x100));
        assert!(matches!(
            engine.append_stop_record(),
            Err(EngineError::WalAppend { .. })
        ));
    }

    #[test]
    fn injected_failures_fire_once() {
        let engine = MemoryWalEngine::primary(TimelineId::new(1));
        engine.fail_next_checkpoint("disk full");
        assert!(engine.force_checkpoint(CheckpointMode::Immediate).is_err());
        assert!(engine.force_checkpoint(CheckpointMode::Immediate).is_ok());

        engine.fail_next_stop_record("io error");
        assert!(engine.append_stop_record().is_err());
        assert!(engine.append_stop_record().is_ok());
    }

    #[test]
    fn promotion_starts_the_next_timeline() {
        let engine = MemoryWalEngine::standby(TimelineId::new(3), Lsn::new(0x100));
        engine.promote();
        assert_eq!(
            engine.recovery_status(),
            RecoveryStatus::Primary {
                timeline: TimelineId::new(4)
            }
        );
    }
}
