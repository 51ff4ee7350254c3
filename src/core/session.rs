//! Backup session identity and lifecycle.

use std::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::label::BackupLabel;

/// Unique id of one backup session.
///
/// Ids only disambiguate log lines and concurrent sessions; the durable
/// artifact does not carry them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let mut bytes = [0u8; 16];
        rng.fill_bytes(&mut bytes);
        Self(Uuid::from_bytes(bytes))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a session as the coordinator drives it.
///
/// `NotStarted` covers the window between building the session's label
/// and its registry entry going live; the flip to `Active` is the moment
/// segment retention starts covering it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    Active,
    Stopped,
}

/// One in-flight backup session.
///
/// Runtime state only. The durable subset lives in [`BackupLabel`] and
/// travels through the artifact; `fast` and the lifecycle state die with
/// the process.
#[derive(Clone, Debug)]
pub struct BackupSession {
    pub id: SessionId,
    pub label: BackupLabel,
    /// Whether the starting checkpoint was requested immediate.
    pub fast: bool,
    state: SessionState,
}

impl BackupSession {
    pub(crate) fn prepare(label: BackupLabel, fast: bool) -> Self {
        Self {
            id: SessionId::generate(),
            label,
            fast,
            state: SessionState::NotStarted,
        }
    }

    pub(crate) fn activate(&mut self) {
        self.state = SessionState::Active;
    }

    pub(crate) fn mark_stopped(&mut self) {
        self.state = SessionState::Stopped;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::label::BackupOrigin;
    use crate::core::time::WallClock;
    use crate::core::wal::{Lsn, TimelineId, WalPosition};

    fn label() -> BackupLabel {
        BackupLabel {
            label: "t".to_string(),
            start: WalPosition::new(TimelineId::new(1), Lsn::new(0x100)),
            checkpoint: Lsn::new(0x100),
            started_at: WallClock(0),
            origin: BackupOrigin::Primary,
        }
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }

    #[test]
    fn id_debug_wraps_the_uuid() {
        let id = SessionId::generate();
        assert_eq!(format!("{id:?}"), format!("SessionId({id})"));
    }

    #[test]
    fn lifecycle_walks_forward() {
        let mut session = BackupSession::prepare(label(), true);
        assert_eq!(session.state(), SessionState::NotStarted);
        assert!(!session.is_active());
        session.activate();
        assert!(session.is_active());
        session.mark_stopped();
        assert_eq!(session.state(), SessionState::Stopped);
        assert!(!session.is_active());
    }
}
