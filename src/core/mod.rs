//! Core domain types for backup coordination
//!
//! Module hierarchy follows type dependency order:
//! - time: wall-clock stamps (Layer 0)
//! - wal: TimelineId, Lsn, WalPosition, segment math (Layer 1)
//! - error: core error enums (Layer 2)
//! - label: BackupLabel artifact codec (Layer 3)
//! - session: SessionId, BackupSession lifecycle (Layer 4)
//! - limits: operational limits (Layer 5)

pub mod error;
pub mod label;
pub mod limits;
pub mod session;
pub mod time;
pub mod wal;

pub use error::{CoreError, InvalidLabel, InvalidSegmentSize, InvalidWalText, LabelError};
pub use label::{BackupLabel, BackupOrigin, validate_label};
pub use limits::BackupLimits;
pub use session::{BackupSession, SessionId, SessionState};
pub use time::WallClock;
pub use wal::{Lsn, SegmentName, SegmentNumber, TimelineId, WalPosition, WalSegmentSize};
