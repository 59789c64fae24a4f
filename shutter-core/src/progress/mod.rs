//! Progress reporting surface shared by firmware and host targets.
//!
//! The sequencer emits exactly one progress update per completed shot; the
//! firmware forwards each update to the notification characteristic while the
//! bench and emulator record them for inspection.

use heapless::Vec;

/// Maximum number of notifications retained by [`ProgressLog`].
pub const MAX_LOGGED_NOTIFICATIONS: usize = 32;

/// Consumer of per-shot progress updates.
pub trait ProgressSink {
    /// Called once after each completed shot with the running total.
    fn progress_updated(&mut self, shots_completed: u16);
}

/// Progress sink that drops every update.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullProgressSink;

impl NullProgressSink {
    /// Creates a new discarding sink.
    pub const fn new() -> Self {
        Self
    }
}

impl ProgressSink for NullProgressSink {
    fn progress_updated(&mut self, _: u16) {}
}

/// Bounded recorder of progress updates, oldest first.
#[derive(Clone, Debug, Default)]
pub struct ProgressLog {
    entries: Vec<u16, MAX_LOGGED_NOTIFICATIONS>,
}

impl ProgressLog {
    /// Creates an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Returns the recorded updates in emission order.
    #[must_use]
    pub fn entries(&self) -> &[u16] {
        &self.entries
    }

    /// Returns the most recent update, if any.
    #[must_use]
    pub fn latest(&self) -> Option<u16> {
        self.entries.last().copied()
    }

    /// Returns the number of recorded updates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Discards all recorded updates.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl ProgressSink for ProgressLog {
    fn progress_updated(&mut self, shots_completed: u16) {
        let _ = self.entries.push(shots_completed);
    }
}
