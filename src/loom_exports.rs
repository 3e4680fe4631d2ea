//! Swaps `std::sync` primitives for `loom`'s model-checked equivalents when
//! built with `--cfg bmpmc_loom`, the same indirection
//! `asynchronics-tachyonix` uses in its own `loom_exports` module. Everything
//! in [`crate::channel`], [`crate::signal`], and [`crate::select`] goes
//! through this module instead of `std::sync` directly, so the lock/condvar
//! protocol can be exhaustively interleaved by loom rather than only
//! spot-checked with real threads.

#[cfg(all(test, bmpmc_loom))]
pub(crate) mod sync {
    pub(crate) use loom::sync::{Arc, Condvar, Mutex};
}

#[cfg(not(all(test, bmpmc_loom)))]
pub(crate) mod sync {
    pub(crate) use std::sync::{Arc, Condvar, Mutex};
}
