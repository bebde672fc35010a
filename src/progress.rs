//! Training progress snapshots.
//!
//! The training thread is the only writer. It publishes an immutable
//! [`Progress`] into a single-slot [`Mailbox`] after every sample and every
//! pass, overwriting whatever was there. Any number of [`Watcher`]s can read
//! the latest snapshot from other threads; a read only holds the slot for
//! as long as it takes to copy it out.

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Telemetry for the most recent `Network::train` call.
///
/// `iteration` is relative to that call: it restarts at 0 for every chunk of
/// passes. Callers that train in chunks track the total themselves.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub struct Progress {
    /// Index of the last completed pass within the current call.
    pub iteration: usize,
    /// Index of the sample most recently fed forward.
    pub input_index: usize,
    /// Mean squared error over the last completed pass.
    pub error: f64,
    /// Largest single-sample error seen so far in the current pass.
    pub max_error: f64,
    /// Index of the sample that produced `max_error`.
    pub max_error_index: usize,
}

type Slot = Arc<Mutex<Option<Progress>>>;

fn lock(slot: &Slot) -> MutexGuard<'_, Option<Progress>> {
    // A snapshot is plain data, so a panic mid-write cannot leave it torn.
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The publishing side of a progress slot.
#[derive(Clone, Debug, Default)]
pub struct Mailbox {
    slot: Slot,
}

impl Mailbox {
    pub fn new() -> Self {
        Mailbox::default()
    }

    /// Replaces the current snapshot with `progress`.
    pub fn publish(&self, progress: Progress) {
        *lock(&self.slot) = Some(progress);
    }

    /// Returns a new reader for this mailbox.
    pub fn watcher(&self) -> Watcher {
        Watcher {
            slot: Arc::clone(&self.slot),
        }
    }
}

/// The reading side of a progress slot.
#[derive(Clone, Debug)]
pub struct Watcher {
    slot: Slot,
}

impl Watcher {
    /// Returns the most recently published snapshot, if any.
    pub fn latest(&self) -> Option<Progress> {
        *lock(&self.slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn watcher_sees_latest_snapshot_only() {
        let mailbox = Mailbox::new();
        let watcher = mailbox.watcher();
        assert_eq!(watcher.latest(), None);

        mailbox.publish(Progress {
            input_index: 1,
            ..Progress::default()
        });
        mailbox.publish(Progress {
            input_index: 2,
            ..Progress::default()
        });
        assert_eq!(watcher.latest().map(|p| p.input_index), Some(2));
        // Reading does not consume.
        assert_eq!(watcher.latest().map(|p| p.input_index), Some(2));
    }

    #[test]
    fn publishes_across_threads() {
        let mailbox = Mailbox::new();
        let watcher = mailbox.watcher();
        thread::spawn(move || {
            for i in 0..100 {
                mailbox.publish(Progress {
                    iteration: i,
                    ..Progress::default()
                });
            }
        })
        .join()
        .unwrap();
        assert_eq!(watcher.latest().map(|p| p.iteration), Some(99));
    }
}
