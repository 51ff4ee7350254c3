//! The session coordinator: start and stop, made atomic.
//!
//! Both operations follow the same discipline: every check and every
//! fallible engine call happens before the registry is touched, so a
//! failure anywhere leaves no trace. The only registry mutations are the
//! enter at the very end of a successful start and the release at the
//! very end of a successful stop.

use std::sync::Arc;

use crate::core::error::InvalidSegmentSize;
use crate::core::label::{validate_label, BackupLabel, BackupOrigin};
use crate::core::limits::BackupLimits;
use crate::core::session::BackupSession;
use crate::core::time::WallClock;
use crate::core::wal::{SegmentName, WalPosition, WalSegmentSize};
use crate::engine::{CheckpointMode, RecoveryStatus, WalEngine};

use super::checkpoint::establish_checkpoint;
use super::error::BackupError;
use super::privilege::{require_backup_privilege, Caller};
use super::registry::SessionRegistry;
use super::timeline::resolve_current_timeline;

/// A successfully started session.
#[derive(Clone, Debug)]
pub struct StartedBackup {
    pub session: BackupSession,
    /// Rendered label artifact; store it with the copied files.
    pub artifact: String,
}

/// Finalized coordinates of a stopped session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoppedBackup {
    /// Position WAL must be archived through for the copy to restore.
    pub stop: WalPosition,
    /// Name of the last segment the backup needs.
    pub last_segment: SegmentName,
}

/// Drives backup sessions against one WAL engine.
pub struct SessionCoordinator {
    engine: Arc<dyn WalEngine>,
    registry: SessionRegistry,
    segment_size: WalSegmentSize,
    max_label_bytes: usize,
}

impl SessionCoordinator {
    pub fn new(
        engine: Arc<dyn WalEngine>,
        limits: &BackupLimits,
    ) -> Result<Self, InvalidSegmentSize> {
        Self::with_registry(engine, SessionRegistry::new(), limits)
    }

    /// Share an existing registry, e.g. with the host's retention logic.
    pub fn with_registry(
        engine: Arc<dyn WalEngine>,
        registry: SessionRegistry,
        limits: &BackupLimits,
    ) -> Result<Self, InvalidSegmentSize> {
        Ok(Self {
            engine,
            registry,
            segment_size: WalSegmentSize::new(limits.wal_segment_bytes)?,
            max_label_bytes: limits.max_label_bytes,
        })
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn active_sessions(&self) -> usize {
        self.registry.active()
    }

    pub fn segment_size(&self) -> WalSegmentSize {
        self.segment_size
    }

    /// Register a new backup session.
    ///
    /// On success the operator copies the data files and keeps the
    /// returned artifact with them. The session stays active, holding
    /// segment retention open, until a stop call consumes the artifact.
    /// `fast` trades an immediate checkpoint's I/O burst for a prompt
    /// start.
    pub fn start_backup(
        &self,
        caller: &Caller,
        label: &str,
        fast: bool,
    ) -> Result<StartedBackup, BackupError> {
        require_backup_privilege(caller)?;
        validate_label(label, self.max_label_bytes)?;

        let status = self.engine.recovery_status();
        self.check_wal_level(status)?;
        let timeline = resolve_current_timeline(status)?;
        let checkpoint =
            establish_checkpoint(self.engine.as_ref(), CheckpointMode::from_fast(fast))?;

        let origin = if status.is_replaying() {
            BackupOrigin::Standby
        } else {
            BackupOrigin::Primary
        };
        let mut session = BackupSession::prepare(
            BackupLabel {
                label: label.to_string(),
                start: WalPosition::new(timeline, checkpoint.redo),
                checkpoint: checkpoint.location,
                started_at: WallClock::now(),
                origin,
            },
            fast,
        );

        // Nothing fallible remains; the entry goes live and outlives
        // this call.
        self.registry.enter().detach();
        session.activate();
        let artifact = session.label.render(self.segment_size);
        tracing::info!(
            session = %session.id,
            start = %session.label.start.lsn,
            timeline = timeline.get(),
            origin = %origin,
            active = self.registry.active(),
            "backup session started"
        );
        Ok(StartedBackup { session, artifact })
    }

    /// Finalize the session behind `artifact`.
    ///
    /// Works from the artifact alone, so any privileged caller may stop
    /// a session started elsewhere. The registry entry is released only
    /// after every check and WAL write has succeeded; a failed stop
    /// leaves the session running and the call retryable.
    pub fn stop_backup(
        &self,
        caller: &Caller,
        artifact: &str,
    ) -> Result<StoppedBackup, BackupError> {
        require_backup_privilege(caller)?;
        let label = BackupLabel::parse(artifact, self.segment_size)?;
        self.finish(&label)
    }

    /// Stop a session this process started.
    ///
    /// Same semantics as [`SessionCoordinator::stop_backup`], plus the
    /// in-memory lifecycle: the session moves to `Stopped` on success
    /// and refuses a second stop.
    pub fn stop_session(
        &self,
        caller: &Caller,
        session: &mut BackupSession,
    ) -> Result<StoppedBackup, BackupError> {
        require_backup_privilege(caller)?;
        if !session.is_active() {
            return Err(BackupError::AlreadyStopped);
        }
        let stopped = self.finish(&session.label)?;
        session.mark_stopped();
        Ok(stopped)
    }

    fn finish(&self, label: &BackupLabel) -> Result<StoppedBackup, BackupError> {
        let status = self.engine.recovery_status();
        if label.origin == BackupOrigin::Standby && !status.is_replaying() {
            // The history this backup follows ended when recovery did.
            return Err(BackupError::PromotedDuringBackup);
        }
        self.check_wal_level(status)?;
        let timeline = resolve_current_timeline(status)?;

        // The artifact's origin picks the stop source. A primary-origin
        // backup ends with an end-of-backup record, and the engine will
        // refuse that append if the node is replaying. A standby-origin
        // backup ends at the applied position; promotion was already
        // refused above, so the node is still replaying here.
        let stop_lsn = match (label.origin, status) {
            (BackupOrigin::Primary, _) => self
                .engine
                .append_stop_record()
                .map_err(|source| BackupError::StopRecordFailed { source })?,
            (
                BackupOrigin::Standby,
                RecoveryStatus::Replaying {
                    position: Some(position),
                },
            ) => position.lsn,
            (BackupOrigin::Standby, _) => {
                return Err(BackupError::InconsistentTimeline {
                    reason: "replay position unavailable".to_string(),
                })
            }
        };

        self.registry.leave_detached();
        let last_segment = SegmentName::format(
            timeline,
            stop_lsn.last_required_segment(self.segment_size),
            self.segment_size,
        );
        tracing::info!(
            stop = %stop_lsn,
            timeline = timeline.get(),
            last_segment = %last_segment,
            active = self.registry.active(),
            "backup session stopped"
        );
        Ok(StoppedBackup {
            stop: WalPosition::new(timeline, stop_lsn),
            last_segment,
        })
    }

    fn check_wal_level(&self, status: RecoveryStatus) -> Result<(), BackupError> {
        if status.is_replaying() {
            // A node cannot replay WAL the primary never produced, so
            // the primary's level already passed this gate.
            return Ok(());
        }
        let level = self.engine.wal_level();
        if level.supports_online_backup() {
            Ok(())
        } else {
            Err(BackupError::UnsupportedWalLevel { level })
        }
    }
}
