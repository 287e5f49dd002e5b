//! Single-slot request guard.

use std::sync::atomic::{AtomicBool, Ordering};

/// Admits at most one in-flight request at a time.
///
/// The slot is taken with [`RequestGuard::try_acquire`] and released when the
/// returned [`PendingRequest`] is dropped.
#[derive(Debug, Default)]
pub struct RequestGuard {
    busy: AtomicBool,
}

impl RequestGuard {
    /// Create an idle guard.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
        }
    }

    /// Take the slot, or `None` if a request is already pending.
    pub fn try_acquire(&self) -> Option<PendingRequest<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PendingRequest { guard: self })
    }

    /// Whether the slot is currently taken.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Occupied slot of a [`RequestGuard`].
#[derive(Debug)]
#[must_use = "the slot is released as soon as this value is dropped"]
pub struct PendingRequest<'a> {
    guard: &'a RequestGuard,
}

impl Drop for PendingRequest<'_> {
    fn drop(&mut self) {
        self.guard.busy.store(false, Ordering::Release);
    }
}
