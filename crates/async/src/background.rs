use std::convert::Infallible;
use std::time::Duration;

use tokio::time::Instant;

use crate::deferred::Promise;
use crate::error::TaskFailed;
use crate::sequential::{SequentialMode, do_sequentially};

/// Time-slicing budget for [`do_sequentially_in_background`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundBudget {
	/// Longest stretch of back-to-back processing before yielding.
	pub max_blocking: Duration,
	/// How long to yield once `max_blocking` is used up.
	pub idle: Duration,
}

impl Default for BackgroundBudget {
	fn default() -> Self {
		Self {
			max_blocking: Duration::from_millis(15),
			idle: Duration::from_millis(30),
		}
	}
}

/// Runs a synchronous `process` over every item in order, spread across time
/// slices no longer than `budget.max_blocking`, idling for `budget.idle`
/// between slices.
///
/// The first item is processed before this function returns. The promise
/// always fulfills.
pub fn do_sequentially_in_background<I, P>(items: I, mut process: P, budget: BackgroundBudget) -> Promise<(), TaskFailed>
where
	I: IntoIterator,
	I::Item: Send + 'static,
	P: FnMut(I::Item, usize) + Send + 'static,
{
	let mut slice_start = Instant::now();

	do_sequentially(
		items,
		move |item, index| {
			process(item, index);

			let now = Instant::now();
			let pause = if now.saturating_duration_since(slice_start) >= budget.max_blocking {
				// The next slice begins once the idle period is over.
				slice_start = now.checked_add(budget.idle).unwrap_or(now);
				Some(budget.idle)
			} else {
				None
			};

			async move {
				if let Some(idle) = pause {
					tracing::trace!(index, ?idle, "async.background.yield");
					tokio::time::sleep(idle).await;
				}
				Ok::<(), Infallible>(())
			}
		},
		SequentialMode::ContinueOnFailure,
	)
}
