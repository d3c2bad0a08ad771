use std::future::Future;

use crate::deferred::{Deferred, Promise};
use crate::error::TaskFailed;
use crate::join_set::TaskSet;
use crate::spawn::{spawn, task_succeeded};

/// Failure policy for [`do_in_parallel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParallelMode {
	/// Reject the master promise as soon as the first task fails. Remaining
	/// tasks keep running in the background.
	FailFast,
	/// Wait for every task to settle, then reject if any failed.
	#[default]
	FailSlow,
}

impl From<bool> for ParallelMode {
	fn from(fail_fast: bool) -> Self {
		if fail_fast { Self::FailFast } else { Self::FailSlow }
	}
}

/// Launches one task per item, all at once, and returns a master promise
/// for their combined completion.
///
/// `launch(item, index)` is called for every item in index order before this
/// function returns; each returned future is spawned right away, so tasks run
/// concurrently. An empty `items` fulfills the master promise immediately
/// without calling `launch`.
///
/// ```text
/// FailSlow:             FailFast:
///  M  ------------F      M  ---------F
///  1 >---d     .  .      1 >---d     .
///  2 >------d  .  .      2 >------d  .
///  3 >---------F  .      3 >---------F
///  4 >------------d      4 >------------d  (keeps running)
/// ```
///
/// Failing fast never stops later items from being launched: every launch
/// happens up front. Tasks whose futures are already complete when returned
/// therefore settle the same way under either mode.
///
/// Rejection carries no detail; see
/// [`do_in_parallel_aggregate_errors`](crate::do_in_parallel_aggregate_errors).
pub fn do_in_parallel<I, F, Fut, R, E>(items: I, mut launch: F, mode: impl Into<ParallelMode>) -> Promise<(), TaskFailed>
where
	I: IntoIterator,
	F: FnMut(I::Item, usize) -> Fut,
	Fut: Future<Output = Result<R, E>> + Send + 'static,
	R: Send + 'static,
	E: Send + 'static,
{
	let mode = mode.into();
	let master = Deferred::new();
	let promise = master.promise();

	let mut tasks = TaskSet::new("parallel.task");
	for (index, item) in items.into_iter().enumerate() {
		tasks.spawn(launch(item, index));
	}

	if tasks.is_empty() {
		tracing::trace!("async.parallel.empty");
		master.resolve(());
		return promise;
	}

	tracing::debug!(total = tasks.len(), ?mode, "async.parallel.launch");
	spawn("parallel", settle_parallel(tasks, master, mode));
	promise
}

async fn settle_parallel<R, E>(mut tasks: TaskSet<Result<R, E>>, master: Deferred<(), TaskFailed>, mode: ParallelMode)
where
	R: Send + 'static,
	E: Send + 'static,
{
	let total = tasks.len();
	let mut completed = 0usize;
	let mut failed = false;

	// Keep draining after a fail-fast rejection: completions are still
	// counted, they just no longer affect the master promise.
	while let Some(joined) = tasks.join_next().await {
		completed += 1;
		if task_succeeded(joined) {
			continue;
		}
		match mode {
			ParallelMode::FailFast => {
				if master.reject(TaskFailed) {
					tracing::debug!(completed, total, "async.parallel.fail_fast");
				}
			}
			ParallelMode::FailSlow => failed = true,
		}
	}

	let settled = if failed { master.reject(TaskFailed) } else { master.resolve(()) };
	tracing::debug!(completed, total, failed, settled, "async.parallel.settle");
}
