//! # fault-bag
//!
//! `fault-bag` is an in-process error-rate monitor. Callers report the
//! outcome of each completed operation; failures accumulate in a bounded
//! bucket that leaks at a fixed rate on a background task. When the bucket
//! saturates, the monitor reports a throttling status carrying an advisory
//! wait hint so callers can back off.
//!
//! ## Core Philosophy
//!
//! The monitor measures failure *density over time*, not a success/failure
//! ratio: successes never lower the level, only the leak task does. A burst
//! of failures saturates the bucket quickly; a quiet period drains it back
//! to normal. The monitor only reports status. It never retries, cancels or
//! delays the caller's work itself.
//!
//! ## Key Concepts
//!
//! * **Single Guard**: the failure level and the leak-task handle live
//!   behind one mutex, so every mutation is linearizable and there are no
//!   lock-ordering hazards.
//! * **Leak Task**: a tokio task owned by [`Bucket::start`]/[`Bucket::stop`]
//!   that drains one unit per interval while running.
//! * **Status Snapshot**: [`Status`] is derived from the level at the
//!   instant of observation, never stored.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use fault_bag::Bucket;
//!
//! let bag = Bucket::new(3, Duration::from_secs(5), Duration::from_secs(1)).unwrap();
//!
//! for _ in 0..3 {
//!     bag.record(true);
//! }
//! assert!(bag.status().is_throttling());
//! ```

use std::time::Duration;

mod bucket;

pub use bucket::Bucket;

/// The condition of the bucket at the instant it was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The failure level is below capacity.
    Ok,
    /// The bucket is saturated. Callers should back off for `wait_hint`
    /// before retrying; the hint is advisory and copied verbatim from the
    /// bucket's configuration.
    Throttling { wait_hint: Duration },
}

impl Status {
    /// Returns `true` if the bucket was saturated when this status was taken.
    pub fn is_throttling(&self) -> bool {
        matches!(self, Self::Throttling { .. })
    }

    /// The advisory backoff duration, if throttling.
    pub fn wait_hint(&self) -> Option<Duration> {
        match self {
            Self::Throttling { wait_hint } => Some(*wait_hint),
            Self::Ok => None,
        }
    }
}

/// Errors produced by [`Bucket`] construction and lifecycle operations.
///
/// These are returned to the immediate caller and never logged internally;
/// surfacing them is entirely the caller's responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BagError {
    /// Capacity, wait hint and leak interval must all be non-zero.
    #[error("capacity, wait hint and leak interval must all be non-zero")]
    InvalidConfiguration,

    /// The leak task is already running; stop it before starting again.
    #[error("leak task is already running")]
    AlreadyRunning,

    /// The leak task is not running.
    #[error("leak task is not running")]
    NotRunning,
}
