#![allow(dead_code)]

use std::sync::Arc;

use hotbackup::core::{BackupLimits, Lsn, TimelineId};
use hotbackup::engine::{MemoryWalEngine, WalEngine};
use hotbackup::{Caller, SessionCoordinator};

/// Default segment size in these tests: 16 MiB.
pub const SEG: u64 = 16 * 1024 * 1024;

/// A coordinator wired to an in-memory engine, with the engine handle
/// kept around for fault injection and position control.
pub struct Harness {
    pub engine: Arc<MemoryWalEngine>,
    pub coordinator: SessionCoordinator,
}

pub fn primary_harness() -> Harness {
    harness(MemoryWalEngine::primary(TimelineId::new(1)), &BackupLimits::default())
}

pub fn standby_harness(timeline: u32, replayed: u64) -> Harness {
    harness(
        MemoryWalEngine::standby(TimelineId::new(timeline), Lsn::new(replayed)),
        &BackupLimits::default(),
    )
}

pub fn harness(engine: MemoryWalEngine, limits: &BackupLimits) -> Harness {
    let engine = Arc::new(engine);
    let coordinator =
        SessionCoordinator::new(Arc::clone(&engine) as Arc<dyn WalEngine>, limits)
            .expect("limits hold a valid segment size");
    Harness {
        engine,
        coordinator,
    }
}

pub fn operator() -> Caller {
    Caller::superuser("postgres")
}

pub fn streamer() -> Caller {
    Caller::replication("wal_streamer")
}

pub fn app_role() -> Caller {
    Caller::unprivileged("app")
}

/// First line of an artifact, for comparing start coordinates.
pub fn start_line(artifact: &str) -> &str {
    artifact.lines().next().expect("artifact has a first line")
}
