//! A bounded, multi-producer/multi-consumer blocking channel.
//!
//! [`channel::channel`] conveys values between concurrent threads through a
//! fixed-capacity FIFO, with blocking, non-blocking, and multi-channel-wait
//! ("select") operations. Three pieces make this up:
//!
//! - a bounded FIFO buffer — an external collaborator with no notion of
//!   blocking or threads.
//! - [`channel`] — the synchronization engine: one `Mutex`-guarded buffer,
//!   two `Condvar`s (`not_full`, `not_empty`), a one-way open/closed
//!   transition, and an optional set of attached readiness signals.
//! - [`select`] — a per-call coordinator that registers a shared readiness
//!   signal on a list of channels and commits the first operation to become
//!   ready.
//!
//! ```
//! use bmpmc::channel::channel;
//!
//! let (tx, rx) = channel(4).unwrap();
//! tx.send(1).unwrap();
//! tx.send(2).unwrap();
//! tx.close().unwrap();
//!
//! assert_eq!(rx.recv().unwrap(), 1);
//! assert_eq!(rx.recv().unwrap(), 2);
//! assert!(rx.recv().is_err()); // drained and closed
//! ```

mod buffer;
pub mod channel;
pub mod error;
mod loom_exports;
pub mod select;
mod signal;

pub use channel::{Receiver, Sender};
pub use error::{ChanError, ChanResult};
pub use select::{select, Direction, RecvOp, SelectOp, SendOp};
