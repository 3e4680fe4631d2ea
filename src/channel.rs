//! The channel's synchronization engine.
//!
//! `Shared<T>` serializes every read and write of a bounded buffer behind a
//! single `Mutex`, and drives two condition variables: `not_full` gates
//! blocking senders, `not_empty` gates blocking receivers. Closing a channel
//! is a one-way `open -> closed` transition that broadcasts both conditions
//! so every waiter observes it, and posts once to every readiness signal a
//! concurrent [`crate::select::select`] call has registered.
//!
//! [`Sender`]/[`Receiver`] are thin, cloneable, ref-counted handles onto one
//! shared `Shared<T>` — the same split the single-consumer channel this
//! crate's core loop is modeled on uses, generalized here to multiple
//! receivers (`senders`/`receivers` counts kept symmetrically instead of
//! just `senders`).
//!
//! Every blocking wait re-checks both the closed flag and the size predicate
//! in a loop: a condition variable's wakeup is never proof that the
//! predicate that justified the wait still holds.

use tracing::{debug, trace, warn};

use crate::buffer::Bounded;
use crate::error::{ChanError, ChanResult};
use crate::loom_exports::sync::{Arc, Condvar, Mutex};
use crate::signal::ReadySignal;

pub(crate) struct Inner<T> {
    buffer: Bounded<T>,
    open: bool,
    senders: usize,
    // Kept symmetrically with `senders`, though nothing currently reads it:
    // unlike the last sender, the last receiver dropping is not a
    // cancellation signal this channel acts on (see `Drop for Receiver`).
    #[allow(dead_code)]
    receivers: usize,
    signals: Vec<Arc<ReadySignal>>,
}

pub(crate) struct Shared<T> {
    inner: Mutex<Inner<T>>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T> Shared<T> {
    fn close(&self) -> ChanResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.open {
            return Err(ChanError::Closed);
        }
        inner.open = false;
        debug!("channel closing, waking all waiters");
        self.not_full.notify_all();
        self.not_empty.notify_all();
        for signal in &inner.signals {
            signal.post();
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        !self.inner.lock().unwrap().open
    }

    fn len(&self) -> usize {
        self.inner.lock().unwrap().buffer.len()
    }

    fn capacity(&self) -> usize {
        self.inner.lock().unwrap().buffer.capacity()
    }

    pub(crate) fn is_send_ready(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        !inner.open || !inner.buffer.is_full()
    }

    pub(crate) fn is_recv_ready(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        !inner.buffer.is_empty() || !inner.open
    }

    pub(crate) fn register_signal(&self, signal: &Arc<ReadySignal>) {
        self.inner.lock().unwrap().signals.push(Arc::clone(signal));
    }

    pub(crate) fn deregister_signal(&self, signal: &Arc<ReadySignal>) {
        self.inner
            .lock()
            .unwrap()
            .signals
            .retain(|registered| !Arc::ptr_eq(registered, signal));
    }

    fn send(&self, value: T, blocking: bool) -> ChanResult<()> {
        let mut guard = self.inner.lock().unwrap();
        loop {
            if !guard.open {
                return Err(ChanError::Closed);
            }
            if !guard.buffer.is_full() {
                break;
            }
            if !blocking {
                return Err(ChanError::WouldBlock);
            }
            trace!("send blocking on not_full");
            guard = self.not_full.wait(guard).unwrap();
        }

        if guard.buffer.push(value).is_err() {
            warn!("buffer rejected a push while holding the lock and seeing room");
            return Err(ChanError::Other(
                "buffer rejected a push under a non-full lock".into(),
            ));
        }

        // Signaling happens while the lock is still held: the happens-before
        // edge this buys is part of the channel's contract, not an
        // optimization to undo.
        for signal in &guard.signals {
            signal.post();
        }
        self.not_empty.notify_one();
        Ok(())
    }

    /// Returns `Ok(T)` as long as the buffer holds a value, even after close
    /// — a closed-but-nonempty channel still drains. Only once the buffer is
    /// empty AND the channel is closed does this return `Err(Closed)`.
    fn recv(&self, blocking: bool) -> ChanResult<T> {
        let mut guard = self.inner.lock().unwrap();
        loop {
            if let Some(value) = guard.buffer.pop() {
                for signal in &guard.signals {
                    signal.post();
                }
                self.not_full.notify_one();
                return Ok(value);
            }
            if !guard.open {
                return Err(ChanError::Closed);
            }
            if !blocking {
                return Err(ChanError::WouldBlock);
            }
            trace!("recv blocking on not_empty");
            guard = self.not_empty.wait(guard).unwrap();
        }
    }
}

/// The sending half of a bounded channel. Cloneable: any number of senders
/// may share one channel.
pub struct Sender<T> {
    pub(crate) inner: Arc<Shared<T>>,
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        self.inner.inner.lock().unwrap().senders += 1;
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Drop for Sender<T> {
    fn drop(&mut self) {
        let senders = {
            let mut inner = self.inner.inner.lock().unwrap();
            inner.senders -= 1;
            inner.senders
        };
        if senders == 0 {
            // Last sender gone: close so blocked receivers don't wait forever.
            // `close` is idempotent-by-contract; a prior explicit close means
            // this is a harmless no-op.
            let _ = self.inner.close();
        }
    }
}

impl<T> Sender<T> {
    /// Blocks until the value is enqueued or the channel closes.
    pub fn send(&self, value: T) -> ChanResult<()> {
        self.inner.send(value, true)
    }

    /// Enqueues `value` without blocking; returns `WouldBlock` if the buffer
    /// is full and open, `Closed` if the channel is closed.
    pub fn try_send(&self, value: T) -> ChanResult<()> {
        self.inner.send(value, false)
    }

    /// Closes the channel. A second call from any handle returns `Closed`.
    pub fn close(&self) -> ChanResult<()> {
        self.inner.close()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

/// The receiving half of a bounded channel. Cloneable: any number of
/// receivers may share one channel (fan-out), though delivery to any single
/// message is still at-most-once.
pub struct Receiver<T> {
    pub(crate) inner: Arc<Shared<T>>,
}

impl<T> Clone for Receiver<T> {
    fn clone(&self) -> Self {
        self.inner.inner.lock().unwrap().receivers += 1;
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Drop for Receiver<T> {
    fn drop(&mut self) {
        // Dropping a receiver never changes channel state: messages already
        // enqueued are still owned by the channel until some receiver
        // dequeues them, and the channel does not track "last receiver gone"
        // as a cancellation signal the way it does for senders.
        self.inner.inner.lock().unwrap().receivers -= 1;
    }
}

impl<T> Receiver<T> {
    /// Blocks until a value is available or the channel is closed and drained.
    pub fn recv(&self) -> ChanResult<T> {
        self.inner.recv(true)
    }

    /// Dequeues a value without blocking; `WouldBlock` if empty and open,
    /// `Closed` if empty and closed.
    pub fn try_recv(&self) -> ChanResult<T> {
        self.inner.recv(false)
    }

    /// Closes the channel. A second call from any handle returns `Closed`.
    pub fn close(&self) -> ChanResult<()> {
        self.inner.close()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// A blocking iterator that yields values until the channel is closed
    /// and drained, mirroring `std::sync::mpsc::Receiver::iter`.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { receiver: self }
    }

    /// A non-blocking iterator that stops at the first `WouldBlock` or
    /// `Closed`, mirroring `std::sync::mpsc::Receiver::try_iter`.
    pub fn try_iter(&self) -> TryIter<'_, T> {
        TryIter { receiver: self }
    }
}

impl<'a, T> IntoIterator for &'a Receiver<T> {
    type Item = T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Blocking iterator over a [`Receiver`]. See [`Receiver::iter`].
pub struct Iter<'a, T> {
    receiver: &'a Receiver<T>,
}

impl<T> Iterator for Iter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.receiver.recv().ok()
    }
}

/// Non-blocking iterator over a [`Receiver`]. See [`Receiver::try_iter`].
pub struct TryIter<'a, T> {
    receiver: &'a Receiver<T>,
}

impl<T> Iterator for TryIter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()
    }
}

/// Creates a new open, empty bounded channel. `capacity` must be positive —
/// rendezvous (capacity-0) channels are out of scope for this crate.
pub fn channel<T>(capacity: usize) -> ChanResult<(Sender<T>, Receiver<T>)> {
    if capacity == 0 {
        return Err(ChanError::InvalidCapacity);
    }

    trace!(capacity, "creating channel");
    let shared = Arc::new(Shared {
        inner: Mutex::new(Inner {
            buffer: Bounded::new(capacity),
            open: true,
            senders: 1,
            receivers: 1,
            signals: Vec::new(),
        }),
        not_full: Condvar::new(),
        not_empty: Condvar::new(),
    });

    Ok((
        Sender {
            inner: Arc::clone(&shared),
        },
        Receiver { inner: shared },
    ))
}
