//! Readiness signal shared by every channel registered in one
//! [`crate::select::select`] call.
//!
//! A select call creates exactly one [`ReadySignal`] and hands an `Arc` of it
//! to every channel it registers with. Each channel posts to every signal it
//! currently holds alongside its own `not_full`/`not_empty` notifications, so
//! a poller sleeping on [`ReadySignal::wait`] wakes whenever any registered
//! channel changes state. Registration and deregistration are explicit and
//! symmetric (see [`crate::channel::Shared::register_signal`] and
//! `deregister_signal`), which is what keeps this safe: the source this
//! design is drawn from leaves a raw pointer to the signal dangling on the
//! channel after select returns, a classic use-after-free. Here the channel
//! only ever holds an owned, reference-counted handle, and select removes its
//! own handle before returning.

use crate::loom_exports::sync::{Condvar, Mutex};

/// A small counting semaphore, built from the same `Mutex` + `Condvar`
/// primitives the channel itself uses for `not_full`/`not_empty`.
#[derive(Debug, Default)]
pub(crate) struct ReadySignal {
    count: Mutex<usize>,
    avail: Condvar,
}

impl ReadySignal {
    pub(crate) fn new() -> Self {
        Self {
            count: Mutex::new(0),
            avail: Condvar::new(),
        }
    }

    /// Posts once, waking at most one waiter blocked in [`ReadySignal::wait`].
    pub(crate) fn post(&self) {
        let mut count = self.count.lock().unwrap();
        *count += 1;
        self.avail.notify_one();
    }

    /// Blocks until at least one post has been recorded, then consumes it.
    pub(crate) fn wait(&self) {
        let mut count = self.count.lock().unwrap();
        while *count == 0 {
            count = self.avail.wait(count).unwrap();
        }
        *count -= 1;
    }
}
