//! The active-session registry.
//!
//! One shared counter answers the only question WAL retention asks: is
//! any backup session still running? While the count is above zero the
//! host must keep every segment from the oldest running session's start
//! position onward.
//!
//! Entries outlive the process that created them conceptually: a started
//! session is finished by whoever presents its artifact, not necessarily
//! by the starting thread. Tokens therefore split into two modes: an
//! undetached token releases its entry on drop (abandoned starts cannot
//! leak), a detached one hands the entry over to the artifact.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Count of running backup sessions. Clones share one count.
#[derive(Clone, Debug, Default)]
pub struct SessionRegistry {
    active: Arc<AtomicUsize>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions currently holding the retention gate open.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Record one more active session.
    pub fn enter(&self) -> SessionToken {
        self.active.fetch_add(1, Ordering::AcqRel);
        SessionToken {
            active: Arc::clone(&self.active),
            released: false,
        }
    }

    /// Release `token`'s entry.
    ///
    /// Dropping the token does the same; this form reads better where
    /// the release is deliberate.
    pub fn leave(&self, token: SessionToken) {
        debug_assert!(
            Arc::ptr_eq(&self.active, &token.active),
            "token belongs to another registry"
        );
        drop(token);
    }

    /// Release an entry whose token was detached at session start.
    pub(crate) fn leave_detached(&self) {
        release_one(&self.active);
    }
}

/// Proof of one registry entry.
#[derive(Debug)]
pub struct SessionToken {
    active: Arc<AtomicUsize>,
    released: bool,
}

impl SessionToken {
    /// Keep the entry alive past this token.
    ///
    /// Called once a session start is fully committed; the matching
    /// release happens when a stop call consumes the artifact.
    pub(crate) fn detach(mut self) {
        self.released = true;
    }
}

impl Drop for SessionToken {
    fn drop(&mut self) {
        if !self.released {
            release_one(&self.active);
        }
    }
}

fn release_one(active: &AtomicUsize) {
    let result = active.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    if result.is_err() {
        tracing::warn!("session release without a matching entry; active count stays at 0");
    }
}
