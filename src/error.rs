//! Status codes returned at the channel's API boundary.
//!
//! There is no background error state: every failure mode a caller can
//! observe is returned inline from the call that produced it.

use thiserror::Error;

/// The result of a channel or select operation.
pub type ChanResult<T> = Result<T, ChanError>;

/// Failure modes a caller can observe from [`crate::channel`] and
/// [`crate::select`] operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChanError {
    /// A non-blocking call found the channel full (send) or empty (recv).
    /// Transient: the caller decides whether to retry.
    #[error("operation would block")]
    WouldBlock,

    /// The channel has completed its one-way OPEN -> CLOSED transition and,
    /// for `recv`, its buffer has been fully drained. Terminal, not an
    /// exception: an expected end-of-stream.
    #[error("channel is closed")]
    Closed,

    /// Returned by a would-be `destroy` on a channel still open. Kept as a
    /// status variant even though this crate's safe API never constructs it
    /// at runtime (see DESIGN.md).
    #[error("destroy called on a channel that is still open")]
    DestroyError,

    /// [`crate::channel::channel`] was asked for capacity zero. Rendezvous
    /// (unbuffered) channels are out of scope.
    #[error("channel capacity must be greater than zero")]
    InvalidCapacity,

    /// A lower-level failure that leaves channel state coherent: the buffer
    /// contract was violated, or an internal invariant did not hold at the
    /// point of failure. Caller may retry or abandon.
    #[error("channel operation failed: {0}")]
    Other(String),
}
