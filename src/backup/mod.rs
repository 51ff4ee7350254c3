//! Backup session coordination.
//!
//! Modules in operation order:
//! - privilege: who may start and stop sessions
//! - timeline: which WAL history a session anchors to
//! - checkpoint: the starting checkpoint every session needs
//! - registry: the count of running sessions gating WAL retention
//! - coordinator: start/stop, tying the above together atomically
//! - error: refusal reasons for all of it

pub mod checkpoint;
pub mod coordinator;
pub mod error;
pub mod privilege;
pub mod registry;
pub mod timeline;

pub use checkpoint::establish_checkpoint;
pub use coordinator::{SessionCoordinator, StartedBackup, StoppedBackup};
pub use error::BackupError;
pub use privilege::{Caller, require_backup_privilege};
pub use registry::{SessionRegistry, SessionToken};
pub use timeline::resolve_current_timeline;
