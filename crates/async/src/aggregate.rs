use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::deferred::{Deferred, Promise, PromiseState};
use crate::error::{AggregateError, ErrorRecord};
use crate::parallel::{ParallelMode, do_in_parallel};
use crate::spawn::spawn;

/// Runs every task in parallel like [`do_in_parallel`] with
/// [`ParallelMode::FailSlow`], collecting the reason of each failed task.
///
/// Fulfills when every task fulfilled. Otherwise rejects, once all tasks have
/// settled, with one [`ErrorRecord`] per failed task in the order the failures
/// were observed. A task that panics still rejects the master promise but has
/// no reason to record, so when every failure is a panic the rejection carries
/// an empty [`AggregateError`].
pub fn do_in_parallel_aggregate_errors<I, F, Fut, R, E>(items: I, mut launch: F) -> Promise<(), AggregateError<I::Item, E>>
where
	I: IntoIterator,
	I::Item: Clone + Send + 'static,
	F: FnMut(I::Item, usize) -> Fut,
	Fut: Future<Output = Result<R, E>> + Send + 'static,
	R: Send + 'static,
	E: Send + 'static,
{
	let records: Arc<Mutex<Vec<ErrorRecord<I::Item, E>>>> = Arc::default();
	let master = Deferred::new();
	let promise = master.promise();

	let parallel = do_in_parallel(
		items,
		|item: I::Item, index| {
			let recorded = item.clone();
			let records = Arc::clone(&records);
			let task = launch(item, index);
			async move {
				task.await.map_err(|error| {
					records.lock().push(ErrorRecord { item: recorded, error });
				})
			}
		},
		ParallelMode::FailSlow,
	);

	if parallel.state() == PromiseState::Fulfilled {
		master.resolve(());
		return promise;
	}

	spawn("aggregate", async move {
		match parallel.await {
			Ok(()) => {
				master.resolve(());
			}
			Err(_) => {
				let records = std::mem::take(&mut *records.lock());
				tracing::debug!(failed = records.len(), "async.aggregate.reject");
				master.reject(AggregateError::new(records));
			}
		}
	});

	promise
}
