//! Settle-once promise primitive shared by every combinator.
//!
//! A [`Deferred`] is the producer half: whoever owns it decides the outcome.
//! A [`Promise`] is the observer half: it can be cloned, inspected without
//! waiting, and awaited by any number of tasks. The first `resolve`/`reject`
//! wins; every later attempt is a no-op.

use std::future::IntoFuture;
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::Notify;

/// Observable state of a [`Promise`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromiseState {
	/// Not settled yet.
	Pending,
	/// Settled with a value.
	Fulfilled,
	/// Settled with a rejection reason.
	Rejected,
}

struct Shared<T, E> {
	outcome: Mutex<Option<Result<T, E>>>,
	settled: Notify,
}

impl<T, E> Shared<T, E> {
	fn new(outcome: Option<Result<T, E>>) -> Arc<Self> {
		Arc::new(Self {
			outcome: Mutex::new(outcome),
			settled: Notify::new(),
		})
	}
}

/// Producer half of a settle-once promise.
pub struct Deferred<T, E> {
	shared: Arc<Shared<T, E>>,
}

/// Observer half of a settle-once promise.
pub struct Promise<T, E> {
	shared: Arc<Shared<T, E>>,
}

impl<T, E> Clone for Deferred<T, E> {
	fn clone(&self) -> Self {
		Self {
			shared: Arc::clone(&self.shared),
		}
	}
}

impl<T, E> Clone for Promise<T, E> {
	fn clone(&self) -> Self {
		Self {
			shared: Arc::clone(&self.shared),
		}
	}
}

impl<T, E> Default for Deferred<T, E> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T, E> std::fmt::Debug for Deferred<T, E> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Deferred").field("state", &self.promise().state()).finish()
	}
}

impl<T, E> std::fmt::Debug for Promise<T, E> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Promise").field("state", &self.state()).finish()
	}
}

impl<T, E> Deferred<T, E> {
	/// Creates a pending deferred.
	pub fn new() -> Self {
		Self { shared: Shared::new(None) }
	}

	/// Returns an observer for this deferred.
	pub fn promise(&self) -> Promise<T, E> {
		Promise {
			shared: Arc::clone(&self.shared),
		}
	}

	/// Fulfills the promise. Returns `false` if it was already settled.
	pub fn resolve(&self, value: T) -> bool {
		self.settle(Ok(value))
	}

	/// Rejects the promise. Returns `false` if it was already settled.
	pub fn reject(&self, reason: E) -> bool {
		self.settle(Err(reason))
	}

	/// Settles the promise with `outcome` unless it is already settled.
	pub fn settle(&self, outcome: Result<T, E>) -> bool {
		{
			let mut slot = self.shared.outcome.lock();
			if slot.is_some() {
				return false;
			}
			*slot = Some(outcome);
		}
		self.shared.settled.notify_waiters();
		true
	}

	/// Returns `true` once the promise has been settled.
	pub fn is_settled(&self) -> bool {
		self.shared.outcome.lock().is_some()
	}
}

impl<T, E> Promise<T, E> {
	/// Creates an already fulfilled promise.
	pub fn resolved(value: T) -> Self {
		Self {
			shared: Shared::new(Some(Ok(value))),
		}
	}

	/// Creates an already rejected promise.
	pub fn rejected(reason: E) -> Self {
		Self {
			shared: Shared::new(Some(Err(reason))),
		}
	}

	/// Returns the current state without waiting.
	pub fn state(&self) -> PromiseState {
		match &*self.shared.outcome.lock() {
			None => PromiseState::Pending,
			Some(Ok(_)) => PromiseState::Fulfilled,
			Some(Err(_)) => PromiseState::Rejected,
		}
	}

	/// Returns `true` while the promise is unsettled.
	pub fn is_pending(&self) -> bool {
		self.state() == PromiseState::Pending
	}
}

impl<T: Clone, E: Clone> Promise<T, E> {
	/// Returns a copy of the outcome if the promise has settled.
	pub fn try_outcome(&self) -> Option<Result<T, E>> {
		self.shared.outcome.lock().clone()
	}

	/// Waits until the promise settles and returns a copy of the outcome.
	///
	/// Never completes if the producing [`Deferred`] is dropped unsettled.
	pub async fn wait(&self) -> Result<T, E> {
		loop {
			let notified = {
				let slot = self.shared.outcome.lock();
				if let Some(outcome) = &*slot {
					return outcome.clone();
				}
				// Created under the lock so a concurrent settle cannot slip
				// between the check and the registration.
				self.shared.settled.notified()
			};
			notified.await;
		}
	}
}

impl<T, E> IntoFuture for Promise<T, E>
where
	T: Clone + Send + 'static,
	E: Clone + Send + 'static,
{
	type Output = Result<T, E>;
	type IntoFuture = BoxFuture<'static, Result<T, E>>;

	fn into_future(self) -> Self::IntoFuture {
		Box::pin(async move { self.wait().await })
	}
}

/// Completion callback handed to the start function of [`promisify`].
pub type Callback<T, E> = Box<dyn FnOnce(Result<T, E>) + Send + 'static>;

/// Adapts a completion-callback API into a [`Promise`].
///
/// `start` receives a callback that settles the returned promise. Calling it
/// more than once is harmless; only the first outcome is kept.
pub fn promisify<T, E, F>(start: F) -> Promise<T, E>
where
	T: Send + 'static,
	E: Send + 'static,
	F: FnOnce(Callback<T, E>),
{
	let deferred = Deferred::new();
	let promise = deferred.promise();
	start(Box::new(move |outcome| {
		deferred.settle(outcome);
	}));
	promise
}
