//! Combinators for orchestrating collections of asynchronous tasks.
//!
//! Every combinator launches caller-supplied tasks, watches them settle, and
//! reports the aggregate through a settle-once [`Promise`]:
//! * [`do_in_parallel`]: launch everything at once, fail fast or fail slow.
//! * [`do_sequentially`]: launch one task after another, stop or continue on failure.
//! * [`do_in_parallel_aggregate_errors`]: parallel, with a per-item failure list.
//! * [`with_timeout`]: race one future against a timer.
//!
//! plus [`first_sequentially`], [`wait_for_all`], [`chain`],
//! [`do_sequentially_in_background`], [`promisify`] and [`PromiseQueue`].
//!
//! A task is a closure `(item, index) -> impl Future<Output = Result<R, E>>`.
//! Calling it launches the task; the returned future is spawned on the current
//! tokio runtime (or a shared fallback runtime) right away, so tasks keep
//! running even after the promise observing them has settled. Nothing here
//! cancels a launched task.

#![warn(missing_docs)]

mod aggregate;
mod background;
mod chain;
mod deferred;
mod error;
mod first;
mod join_set;
mod parallel;
mod queue;
mod sequential;
mod spawn;
mod timeout;
mod wait;

pub use aggregate::do_in_parallel_aggregate_errors;
pub use background::{BackgroundBudget, do_sequentially_in_background};
pub use chain::{ChainStep, chain};
pub use deferred::{Callback, Deferred, Promise, PromiseState, promisify};
pub use error::{AggregateError, ErrorRecord, TaskFailed, TimeoutError};
pub use first::first_sequentially;
pub use parallel::{ParallelMode, do_in_parallel};
pub use queue::PromiseQueue;
pub use sequential::{SequentialMode, do_sequentially};
pub use timeout::{with_timeout, with_timeout_resolving};
pub use wait::wait_for_all;
