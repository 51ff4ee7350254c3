#![forbid(unsafe_code)]

pub mod backup;
pub mod core;
pub mod engine;
pub mod error;
pub mod telemetry;

pub use error::{Effect, Error, Transience};
pub type Result<T> = std::result::Result<T, Error>;

// Re-export the working set at crate root for convenience
pub use crate::backup::{
    BackupError, Caller, SessionCoordinator, SessionRegistry, SessionToken, StartedBackup,
    StoppedBackup,
};
pub use crate::core::{
    BackupLabel, BackupLimits, BackupOrigin, BackupSession, CoreError, LabelError, Lsn,
    SegmentName, SessionId, SessionState, TimelineId, WalPosition, WalSegmentSize, WallClock,
};
pub use crate::engine::{
    Checkpoint, CheckpointMode, EngineError, MemoryWalEngine, RecoveryStatus, WalEngine, WalLevel,
};
