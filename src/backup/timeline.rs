//! Timeline resolution.
//!
//! A backup is consistent along exactly one timeline. On a primary that
//! is the timeline being written; on a replaying node it is the timeline
//! of the last applied record. The replaying branch is not optional:
//! standby backups are a first-class path, and a node that has not
//! applied anything yet simply cannot say which history it is on.

use crate::core::wal::TimelineId;
use crate::engine::RecoveryStatus;

use super::error::BackupError;

/// Timeline the node is on, per one [`RecoveryStatus`] snapshot.
///
/// Timeline 0 from either branch means the engine itself does not know
/// yet, and no session may anchor to it.
pub fn resolve_current_timeline(status: RecoveryStatus) -> Result<TimelineId, BackupError> {
    let timeline = match status {
        RecoveryStatus::Primary { timeline } => timeline,
        RecoveryStatus::Replaying { position: None } => {
            return Err(BackupError::InconsistentTimeline {
                reason: "no WAL applied yet".to_string(),
            });
        }
        RecoveryStatus::Replaying {
            position: Some(position),
        } => {
            tracing::debug!(
                timeline = position.timeline.get(),
                replayed = %position.lsn,
                "timeline taken from replay position"
            );
            position.timeline
        }
    };
    if !timeline.is_valid() {
        return Err(BackupError::InconsistentTimeline {
            reason: "engine reported timeline 0".to_string(),
        });
    }
    Ok(timeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::wal::{Lsn, WalPosition};

    #[test]
    fn primary_uses_its_write_timeline() {
        let status = RecoveryStatus::Primary {
            timeline: TimelineId::new(4),
        };
        assert_eq!(resolve_current_timeline(status).unwrap(), TimelineId::new(4));
    }

    #[test]
    fn replaying_node_uses_the_applied_timeline() {
        let status = RecoveryStatus::Replaying {
            position: Some(WalPosition::new(TimelineId::new(2), Lsn::new(0x9000))),
        };
        assert_eq!(resolve_current_timeline(status).unwrap(), TimelineId::new(2));
    }

    #[test]
    fn nothing_applied_is_inconsistent() {
        let status = RecoveryStatus::Replaying { position: None };
        assert!(matches!(
            resolve_current_timeline(status),
            Err(BackupError::InconsistentTimeline { .. })
        ));
    }

    #[test]
    fn timeline_zero_is_refused_on_both_branches() {
        let primary = RecoveryStatus::Primary {
            timeline: TimelineId::new(0),
        };
        assert!(resolve_current_timeline(primary).is_err());
        let replaying = RecoveryStatus::Replaying {
            position: Some(WalPosition::new(TimelineId::new(0), Lsn::new(0x9000))),
        };
        assert!(resolve_current_timeline(replaying).is_err());
    }
}
