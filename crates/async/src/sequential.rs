use std::future::Future;

use crate::deferred::{Deferred, Promise};
use crate::error::TaskFailed;
use crate::spawn::{spawn, task_succeeded};

/// Failure policy for [`do_sequentially`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SequentialMode {
	/// Reject on the first failure and never launch the remaining items.
	StopOnFailure,
	/// Keep going after a failure; reject once the last item has settled.
	#[default]
	ContinueOnFailure,
}

impl From<bool> for SequentialMode {
	fn from(fail_and_stop_fast: bool) -> Self {
		if fail_and_stop_fast { Self::StopOnFailure } else { Self::ContinueOnFailure }
	}
}

/// Runs one task per item, strictly one at a time in index order.
///
/// Task `i + 1` is launched only after task `i` has settled. The first task is
/// launched before this function returns; an empty `items` fulfills the
/// master promise immediately.
///
/// ```text
/// ContinueOnFailure:    StopOnFailure:
///  M  ------------F      M  ---------F
///  1 >---d     .  .      1 >---d     .
///  2     >--d  .  .      2     >--d  .
///  3        >--F  .      3        >--F
///  4           >--d      4          (never launched)
/// ```
pub fn do_sequentially<I, F, Fut, R, E>(items: I, mut launch: F, mode: impl Into<SequentialMode>) -> Promise<(), TaskFailed>
where
	I: IntoIterator,
	I::Item: Send + 'static,
	F: FnMut(I::Item, usize) -> Fut + Send + 'static,
	Fut: Future<Output = Result<R, E>> + Send + 'static,
	R: Send + 'static,
	E: Send + 'static,
{
	let mode = mode.into();
	let master = Deferred::new();
	let promise = master.promise();

	let mut pending = items.into_iter().collect::<Vec<_>>().into_iter().enumerate();
	let total = pending.len();
	let Some((first_index, first_item)) = pending.next() else {
		tracing::trace!("async.sequential.empty");
		master.resolve(());
		return promise;
	};

	tracing::debug!(total, ?mode, "async.sequential.start");
	let first = spawn("sequential.task", launch(first_item, first_index));

	spawn("sequential", async move {
		let mut index = first_index;
		let mut current = first;
		let mut failed = false;

		loop {
			if !task_succeeded(current.await) {
				match mode {
					SequentialMode::StopOnFailure => {
						tracing::debug!(index, total, "async.sequential.stop");
						master.reject(TaskFailed);
						return;
					}
					SequentialMode::ContinueOnFailure => failed = true,
				}
			}

			let Some((next_index, item)) = pending.next() else {
				break;
			};
			index = next_index;
			current = spawn("sequential.task", launch(item, index));
		}

		tracing::debug!(total, failed, "async.sequential.settle");
		if failed {
			master.reject(TaskFailed);
		} else {
			master.resolve(());
		}
	});

	promise
}
