//! The select coordinator.
//!
//! [`select`] takes a list of pending send/receive descriptors against any
//! number of channels (possibly of different element types), and completes
//! exactly one of them: the first, in list order, that becomes ready.
//!
//! Because a single `select` call may span channels carrying different `T`,
//! the descriptors are trait objects ([`SelectOp`]) rather than a
//! homogeneous struct — the direction, readiness check, and commit are all
//! that select itself needs, so the payload type never has to appear in
//! select's own signature. [`SendOp`] and [`RecvOp`] are the two concrete
//! descriptors a caller builds: `SendOp` carries its own value, `RecvOp`
//! writes its result into a caller-supplied slot, matching the
//! channel/payload-slot shape of a descriptor.

use std::cell::Cell;

use tracing::trace;

use crate::channel::{Receiver, Sender};
use crate::error::ChanResult;
use crate::loom_exports::sync::Arc;
use crate::signal::ReadySignal;

/// The direction of one descriptor in a [`select`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Send,
    Recv,
}

/// One descriptor in a [`select`] call: a channel, a direction, and (for
/// send) the value to enqueue or (for receive) a slot to receive into.
///
/// Implemented by [`SendOp`] and [`RecvOp`]; not meant to be implemented
/// outside this crate.
pub trait SelectOp {
    /// Whether this descriptor is a send or a receive.
    fn direction(&self) -> Direction;

    /// True if this operation could complete immediately right now, checked
    /// under the target channel's own lock.
    fn is_ready(&self) -> bool;

    /// Attaches `signal` to this descriptor's channel so that any state
    /// change on it wakes a sleeping [`select`] poll.
    fn register(&self, signal: &Arc<ReadySignal>);

    /// Detaches `signal`. Called once for every [`SelectOp::register`], even
    /// on the descriptor that won — its channel may still be registered by
    /// an unrelated, concurrent `select` call sharing the same channel.
    fn deregister(&self, signal: &Arc<ReadySignal>);

    /// Performs the blocking operation. Only called once, on the single
    /// descriptor `select` has chosen; by the time this runs the channel may
    /// have changed state again (another thread could have raced in), so
    /// this can itself block briefly — exactly as a direct blocking
    /// `send`/`recv` call would.
    fn commit(&self) -> ChanResult<()>;
}

/// A send descriptor: enqueue `value` onto `sender` if and when ready.
pub struct SendOp<'a, T> {
    sender: &'a Sender<T>,
    value: Cell<Option<T>>,
}

impl<'a, T> SendOp<'a, T> {
    pub fn new(sender: &'a Sender<T>, value: T) -> Self {
        Self {
            sender,
            value: Cell::new(Some(value)),
        }
    }
}

impl<T> SelectOp for SendOp<'_, T> {
    fn direction(&self) -> Direction {
        Direction::Send
    }

    fn is_ready(&self) -> bool {
        self.sender.inner.is_send_ready()
    }

    fn register(&self, signal: &Arc<ReadySignal>) {
        self.sender.inner.register_signal(signal);
    }

    fn deregister(&self, signal: &Arc<ReadySignal>) {
        self.sender.inner.deregister_signal(signal);
    }

    fn commit(&self) -> ChanResult<()> {
        let value = self
            .value
            .take()
            .expect("SendOp::commit called more than once");
        self.sender.send(value)
    }
}

/// A receive descriptor: dequeue from `receiver` into `slot` if and when
/// ready. `slot` is read by the caller after [`select`] returns.
pub struct RecvOp<'a, T> {
    receiver: &'a Receiver<T>,
    slot: &'a Cell<Option<T>>,
}

impl<'a, T> RecvOp<'a, T> {
    pub fn new(receiver: &'a Receiver<T>, slot: &'a Cell<Option<T>>) -> Self {
        Self { receiver, slot }
    }
}

impl<T> SelectOp for RecvOp<'_, T> {
    fn direction(&self) -> Direction {
        Direction::Recv
    }

    fn is_ready(&self) -> bool {
        self.receiver.inner.is_recv_ready()
    }

    fn register(&self, signal: &Arc<ReadySignal>) {
        self.receiver.inner.register_signal(signal);
    }

    fn deregister(&self, signal: &Arc<ReadySignal>) {
        self.receiver.inner.deregister_signal(signal);
    }

    fn commit(&self) -> ChanResult<()> {
        let value = self.receiver.recv()?;
        self.slot.set(Some(value));
        Ok(())
    }
}

/// Blocks until at least one descriptor in `ops` can complete, then
/// completes exactly one — the lowest-indexed ready descriptor on the
/// winning poll pass — and returns its index and status.
///
/// Descriptors are scanned in order on every pass; duplicate channels in the
/// list are permitted and behave as independent entries. Registration and
/// deregistration of this call's readiness signal are symmetric: every
/// descriptor is deregistered before `select` returns, including the one
/// that committed.
pub fn select(ops: &[&dyn SelectOp]) -> (usize, ChanResult<()>) {
    let signal = Arc::new(ReadySignal::new());

    trace!(count = ops.len(), "select registering readiness signal");
    for op in ops {
        op.register(&signal);
    }

    let outcome = loop {
        let ready = ops.iter().enumerate().find(|(_, op)| op.is_ready());

        match ready {
            Some((index, op)) => {
                trace!(index, direction = ?op.direction(), "select committing");
                break (index, op.commit());
            }
            None => signal.wait(),
        }
    };

    for op in ops {
        op.deregister(&signal);
    }
    trace!("select deregistered readiness signal");

    outcome
}

#[cfg(all(test, not(bmpmc_loom)))]
mod tests {
    use super::*;
    use crate::channel::channel;
    use crate::error::ChanError;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn picks_the_lowest_indexed_ready_descriptor() {
        let (tx_x, _rx_x) = channel::<u8>(1).unwrap();
        let (tx_y, rx_y) = channel::<u8>(1).unwrap();
        tx_y.send(7).unwrap();

        let send_x = SendOp::new(&tx_x, 99);
        let slot = Cell::new(None);
        let recv_y = RecvOp::new(&rx_y, &slot);

        let (index, status) = select(&[&send_x, &recv_y]);

        assert_eq!(index, 0);
        assert!(status.is_ok());
        assert_eq!(tx_x.len(), 1);
        assert!(slot.take().is_none());
    }

    #[test]
    fn completes_the_only_ready_descriptor_even_if_not_first() {
        let (tx_x, _rx_x) = channel::<u8>(1).unwrap();
        tx_x.send(1).unwrap(); // X is now full: send-to-X is not ready.
        let (tx_y, rx_y) = channel::<u8>(1).unwrap();
        tx_y.send(7).unwrap();

        let send_x = SendOp::new(&tx_x, 99);
        let slot = Cell::new(None);
        let recv_y = RecvOp::new(&rx_y, &slot);

        let (index, status) = select(&[&send_x, &recv_y]);

        assert_eq!(index, 1);
        assert!(status.is_ok());
        assert_eq!(slot.take(), Some(7));
    }

    #[test]
    fn blocks_until_a_descriptor_becomes_ready() {
        let (tx, rx) = channel::<u8>(1).unwrap();
        let slot = Cell::new(None);
        let recv = RecvOp::new(&rx, &slot);

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            tx.send(5).unwrap();
        });

        let (index, status) = select(&[&recv]);
        assert_eq!(index, 0);
        assert!(status.is_ok());
        assert_eq!(slot.take(), Some(5));

        handle.join().unwrap();
    }

    #[test]
    fn unblocks_with_closed_on_close() {
        let (tx_a, rx_a) = channel::<u8>(1).unwrap();
        let (_tx_b, rx_b) = channel::<u8>(1).unwrap();

        let slot_a = Cell::new(None);
        let slot_b = Cell::new(None);
        let recv_a = RecvOp::new(&rx_a, &slot_a);
        let recv_b = RecvOp::new(&rx_b, &slot_b);

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            tx_a.close().unwrap();
        });

        let (index, status) = select(&[&recv_a, &recv_b]);
        assert_eq!(index, 0);
        assert_eq!(status.unwrap_err(), ChanError::Closed);

        handle.join().unwrap();
    }

    #[test]
    fn send_only_select_unblocks_with_closed_when_its_channel_closes() {
        // `is_send_ready` treats a closed channel as ready (see
        // `Shared::is_send_ready` and DESIGN.md) specifically so that a
        // select over only send descriptors still terminates after close,
        // rather than sleeping forever once the single close-time signal
        // post has already been consumed.
        let (tx, rx) = channel::<u8>(1).unwrap();
        tx.send(0).unwrap(); // fill the only slot so the send is not ready yet

        let closer = {
            let tx = tx.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                tx.close().unwrap();
            })
        };

        let send = SendOp::new(&tx, 1);
        let (index, status) = select(&[&send]);

        assert_eq!(index, 0);
        assert_eq!(status.unwrap_err(), ChanError::Closed);

        closer.join().unwrap();
        drop(rx);
    }

    #[test]
    fn duplicate_channels_behave_as_independent_entries() {
        let (tx, rx) = channel::<u8>(1).unwrap();
        tx.send(3).unwrap();

        let slot_a = Cell::new(None);
        let slot_b = Cell::new(None);
        let recv_a = RecvOp::new(&rx, &slot_a);
        let recv_b = RecvOp::new(&rx, &slot_b);

        let (index, status) = select(&[&recv_a, &recv_b]);
        assert_eq!(index, 0);
        assert!(status.is_ok());
        assert_eq!(slot_a.take(), Some(3));
        assert!(slot_b.take().is_none());
    }
}
