use std::future::IntoFuture;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::deferred::{Deferred, Promise};
use crate::error::TimeoutError;
use crate::spawn::{log_join_error, spawn};

/// Races `future` against a timer of `timeout`.
///
/// The returned promise settles with whichever comes first:
/// * `future` settles: its value or reason is passed through unchanged
///   (a reason arrives wrapped in [`TimeoutError::Failed`]), and the timer is
///   disarmed.
/// * the timer fires: the promise rejects with [`TimeoutError::TimedOut`].
/// * `future` panics: the promise rejects with [`TimeoutError::Panicked`]
///   right away, and the timer is disarmed.
///
/// `future` is never cancelled. After a timeout it keeps running and its
/// eventual outcome is discarded. A `timeout` too large to represent as a
/// deadline, such as [`Duration::MAX`], never fires.
pub fn with_timeout<F, T, E>(future: F, timeout: Duration) -> Promise<T, TimeoutError<E>>
where
	F: IntoFuture<Output = Result<T, E>>,
	F::IntoFuture: Send + 'static,
	T: Send + 'static,
	E: Send + 'static,
{
	race(
		future,
		timeout,
		Outcomes {
			timed_out: || Err(TimeoutError::TimedOut),
			settled: |outcome| outcome.map_err(TimeoutError::Failed),
			panicked: || Err(TimeoutError::Panicked),
		},
	)
}

/// Like [`with_timeout`], but the timer fulfills the promise with `None`
/// instead of rejecting it. A real fulfillment arrives as `Some(value)`.
///
/// A panicking `future` has no value either, so it also fulfills with `None`,
/// without waiting for the timer.
pub fn with_timeout_resolving<F, T, E>(future: F, timeout: Duration) -> Promise<Option<T>, E>
where
	F: IntoFuture<Output = Result<T, E>>,
	F::IntoFuture: Send + 'static,
	T: Send + 'static,
	E: Send + 'static,
{
	race(
		future,
		timeout,
		Outcomes {
			timed_out: || Ok(None),
			settled: |outcome| outcome.map(Some),
			panicked: || Ok(None),
		},
	)
}

/// How each way a race can end maps onto the wrapper's outcome.
struct Outcomes<T, E, U, V> {
	timed_out: fn() -> Result<U, V>,
	settled: fn(Result<T, E>) -> Result<U, V>,
	panicked: fn() -> Result<U, V>,
}

fn race<F, T, E, U, V>(future: F, timeout: Duration, outcomes: Outcomes<T, E, U, V>) -> Promise<U, V>
where
	F: IntoFuture<Output = Result<T, E>>,
	F::IntoFuture: Send + 'static,
	T: Send + 'static,
	E: Send + 'static,
	U: Send + 'static,
	V: Send + 'static,
{
	let wrapper = Deferred::new();
	let promise = wrapper.promise();
	let future = future.into_future();

	let timer = arm_timer(wrapper.clone(), timeout, outcomes.timed_out);
	let original = spawn("timeout.original", future);
	spawn("timeout.watch", async move {
		let outcome = match original.await {
			Ok(outcome) => (outcomes.settled)(outcome),
			Err(err) => {
				log_join_error(err);
				(outcomes.panicked)()
			}
		};
		timer.abort();
		if !wrapper.settle(outcome) {
			tracing::trace!("async.timeout.late_outcome");
		}
	});

	promise
}

/// Settles `target` with `on_timeout()` once `timeout` has elapsed, unless the
/// returned handle is aborted first. Settling an already settled target is a
/// no-op. Timeouts past the clock's range are clamped and never fire.
pub(crate) fn arm_timer<U, V>(target: Deferred<U, V>, timeout: Duration, on_timeout: fn() -> Result<U, V>) -> JoinHandle<()>
where
	U: Send + 'static,
	V: Send + 'static,
{
	spawn("timeout.timer", async move {
		tokio::time::sleep(timeout).await;
		if target.settle(on_timeout()) {
			tracing::debug!("async.timeout.fired");
		}
	})
}
