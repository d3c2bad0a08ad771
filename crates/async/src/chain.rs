use std::future::Future;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::deferred::{Deferred, Promise};
use crate::spawn::spawn;

type SyncStep<V, E> = Box<dyn FnOnce(V) -> Result<V, E> + Send>;
type AsyncStep<V, E> = Box<dyn FnOnce(V) -> BoxFuture<'static, Result<V, E>> + Send>;

/// One link of a [`chain`].
pub enum ChainStep<V, E> {
	/// Runs to completion immediately.
	Sync(SyncStep<V, E>),
	/// Returns a future the chain waits on.
	Async(AsyncStep<V, E>),
}

impl<V, E> ChainStep<V, E> {
	/// Wraps a synchronous step.
	pub fn sync<F>(step: F) -> Self
	where
		F: FnOnce(V) -> Result<V, E> + Send + 'static,
	{
		Self::Sync(Box::new(step))
	}

	/// Wraps an asynchronous step.
	pub fn asynchronous<F, Fut>(step: F) -> Self
	where
		F: FnOnce(V) -> Fut + Send + 'static,
		Fut: Future<Output = Result<V, E>> + Send + 'static,
	{
		Self::Async(Box::new(move |value| step(value).boxed()))
	}
}

impl<V, E> std::fmt::Debug for ChainStep<V, E> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Sync(_) => f.write_str("ChainStep::Sync"),
			Self::Async(_) => f.write_str("ChainStep::Async"),
		}
	}
}

/// Runs `steps` in order, feeding each step the previous step's value,
/// starting from `initial`.
///
/// Fulfills with the last step's value (or `initial` when there are no
/// steps). The first failing step halts the chain and its error becomes the
/// rejection reason.
///
/// Leading synchronous steps run before this function returns; everything
/// from the first asynchronous step on runs on a spawned driver.
pub fn chain<V, E>(steps: impl IntoIterator<Item = ChainStep<V, E>>, initial: V) -> Promise<V, E>
where
	V: Send + 'static,
	E: Send + 'static,
{
	let master = Deferred::new();
	let promise = master.promise();
	let mut steps = steps.into_iter().collect::<Vec<_>>().into_iter();
	let mut value = initial;

	loop {
		match steps.next() {
			None => {
				master.resolve(value);
				return promise;
			}
			Some(ChainStep::Sync(step)) => match step(value) {
				Ok(next) => value = next,
				Err(err) => {
					tracing::debug!("async.chain.halted");
					master.reject(err);
					return promise;
				}
			},
			Some(ChainStep::Async(step)) => {
				let pending = step(value);
				spawn("chain", drive_chain(pending, steps, master));
				return promise;
			}
		}
	}
}

async fn drive_chain<V, E>(pending: BoxFuture<'static, Result<V, E>>, steps: std::vec::IntoIter<ChainStep<V, E>>, master: Deferred<V, E>)
where
	V: Send + 'static,
	E: Send + 'static,
{
	let mut outcome = pending.await;
	for step in steps {
		let value = match outcome {
			Ok(value) => value,
			Err(_) => break,
		};
		outcome = match step {
			ChainStep::Sync(step) => step(value),
			ChainStep::Async(step) => step(value).await,
		};
	}

	if outcome.is_err() {
		tracing::debug!("async.chain.halted");
	}
	master.settle(outcome);
}
