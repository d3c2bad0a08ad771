use std::future::Future;

use crate::deferred::{Deferred, Promise};
use crate::error::TaskFailed;
use crate::spawn::{spawn, task_succeeded};

/// Tries items one at a time, in order, until a task fulfills.
///
/// Fulfills with the first item whose task fulfilled; later items are never
/// launched. Rejects when every task failed, or when `items` is empty.
pub fn first_sequentially<I, F, Fut, R, E>(items: I, mut launch: F) -> Promise<I::Item, TaskFailed>
where
	I: IntoIterator,
	I::Item: Clone + Send + 'static,
	F: FnMut(I::Item, usize) -> Fut + Send + 'static,
	Fut: Future<Output = Result<R, E>> + Send + 'static,
	R: Send + 'static,
	E: Send + 'static,
{
	let master = Deferred::new();
	let promise = master.promise();

	let mut pending = items.into_iter().collect::<Vec<_>>().into_iter().enumerate();
	let Some((index, item)) = pending.next() else {
		master.reject(TaskFailed);
		return promise;
	};
	let mut current = (index, item.clone(), spawn("first.task", launch(item, index)));

	spawn("first", async move {
		loop {
			let (index, item, handle) = current;
			if task_succeeded(handle.await) {
				tracing::debug!(index, "async.first.fulfilled");
				master.resolve(item);
				return;
			}

			let Some((index, item)) = pending.next() else {
				break;
			};
			current = (index, item.clone(), spawn("first.task", launch(item, index)));
		}

		tracing::debug!("async.first.exhausted");
		master.reject(TaskFailed);
	});

	promise
}
