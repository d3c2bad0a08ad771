use std::future::IntoFuture;
use std::time::Duration;

use crate::deferred::{Deferred, Promise};
use crate::error::{TaskFailed, TimeoutError};
use crate::join_set::TaskSet;
use crate::spawn::spawn;
use crate::timeout::arm_timer;

/// Waits for every future to settle, without stopping at the first rejection.
///
/// Fulfills with the values of the futures that fulfilled, in the order they
/// settled. When `fail_on_reject` is set and at least one future rejected,
/// rejects with [`TimeoutError::Failed`] instead. With `Some(timeout)`, the
/// promise rejects with [`TimeoutError::TimedOut`] if the futures have not all
/// settled in time; they keep running regardless. A timeout too large to
/// represent as a deadline never fires.
///
/// An empty input fulfills immediately with an empty list.
pub fn wait_for_all<I, F, R, E>(futures: I, fail_on_reject: bool, timeout: Option<Duration>) -> Promise<Vec<R>, TimeoutError<TaskFailed>>
where
	I: IntoIterator<Item = F>,
	F: IntoFuture<Output = Result<R, E>>,
	F::IntoFuture: Send + 'static,
	R: Send + 'static,
	E: Send + 'static,
{
	let master = Deferred::new();
	let promise = master.promise();

	let mut tasks = TaskSet::new("wait_for_all.task");
	for future in futures {
		tasks.spawn(future.into_future());
	}

	if tasks.is_empty() {
		master.resolve(Vec::new());
		return promise;
	}

	let timer = timeout.map(|timeout| arm_timer(master.clone(), timeout, || Err(TimeoutError::TimedOut)));
	let total = tasks.len();
	tracing::debug!(total, fail_on_reject, ?timeout, "async.wait_for_all.start");

	spawn("wait_for_all", async move {
		let mut results = Vec::with_capacity(total);
		let mut saw_rejects = false;

		while let Some(joined) = tasks.join_next().await {
			match joined {
				Ok(Ok(value)) => results.push(value),
				Ok(Err(_)) => saw_rejects = true,
				Err(err) => {
					crate::spawn::log_join_error(err);
					saw_rejects = true;
				}
			}
		}

		if let Some(timer) = timer {
			timer.abort();
		}
		tracing::debug!(total, fulfilled = results.len(), saw_rejects, "async.wait_for_all.settle");
		if fail_on_reject && saw_rejects {
			master.reject(TimeoutError::Failed(TaskFailed));
		} else {
			master.resolve(results);
		}
	});

	promise
}
