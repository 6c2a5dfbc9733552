//! Lock discipline (J), global lock-order deadlock detection (K), and
//! structured-concurrency task tracking (L).

pub mod graph;
pub mod lock;
pub mod tasks;

pub use graph::{Cycle, LockIdentity, LockOrderGraph};
pub use lock::{AcquireOutcome, LockAcquisition, LockKey, LockKind, LockState, ReleaseOutcome};
pub use tasks::{ConcurrencyTracker, Resolution};
