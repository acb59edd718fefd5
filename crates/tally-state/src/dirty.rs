//! Coalescing change flag.

use std::sync::atomic::{AtomicBool, Ordering};

/// "Unpublished changes exist since the last publish."
///
/// Producers call [`mark`](Self::mark) after every accepted mutation; the
/// refresh loop calls [`take`](Self::take) once per tick. Any number of marks
/// between two takes collapse into one refresh.
#[derive(Debug, Default)]
pub struct DirtyFlag {
    dirty: AtomicBool,
}

impl DirtyFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal that state changed.
    pub fn mark(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Clear the flag, returning whether it was set.
    pub fn take(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    pub fn clear(&self) {
        self.dirty.store(false, Ordering::Release);
    }
}
