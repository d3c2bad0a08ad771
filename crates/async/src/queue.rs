use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;

use crate::spawn::{spawn, task_succeeded};

type Operation = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), ()>> + Send>;

struct QueueState {
	waiting: VecDeque<Operation>,
	running: bool,
}

/// Queue of async operations executed strictly one after another, in the
/// order they were added.
///
/// Operations may be added at any time. An operation added while the queue is
/// idle starts immediately; otherwise it starts once every operation added
/// before it has settled. A failing operation does not stop the queue.
#[derive(Clone)]
pub struct PromiseQueue {
	state: Arc<Mutex<QueueState>>,
}

impl Default for PromiseQueue {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for PromiseQueue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.state.lock();
		f.debug_struct("PromiseQueue")
			.field("waiting", &state.waiting.len())
			.field("running", &state.running)
			.finish()
	}
}

impl PromiseQueue {
	/// Creates an empty, idle queue.
	pub fn new() -> Self {
		Self {
			state: Arc::new(Mutex::new(QueueState {
				waiting: VecDeque::new(),
				running: false,
			})),
		}
	}

	/// Number of operations waiting to start. The running one is not counted.
	pub fn len(&self) -> usize {
		self.state.lock().waiting.len()
	}

	/// Returns `true` if no operation is waiting.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Returns `true` while an operation is running.
	pub fn is_running(&self) -> bool {
		self.state.lock().running
	}

	/// Adds an operation, starting it right away if the queue is idle.
	pub fn add<F, Fut, R, E>(&self, op: F)
	where
		F: FnOnce() -> Fut + Send + 'static,
		Fut: Future<Output = Result<R, E>> + Send + 'static,
		R: Send + 'static,
		E: Send + 'static,
	{
		let op: Operation = Box::new(move || {
			let fut = op();
			async move { fut.await.map(drop).map_err(drop) }.boxed()
		});

		let op = {
			let mut state = self.state.lock();
			if state.running {
				state.waiting.push_back(op);
				tracing::trace!(waiting = state.waiting.len(), "async.queue.enqueue");
				return;
			}
			state.running = true;
			op
		};

		// Start outside the lock so `op` may itself add to the queue.
		let current = op();
		spawn("queue", pump(Arc::clone(&self.state), current));
	}

	/// Drops every waiting operation. The running one, if any, still finishes.
	pub fn remove_all(&self) {
		let dropped = std::mem::take(&mut self.state.lock().waiting);
		tracing::debug!(dropped = dropped.len(), "async.queue.remove_all");
	}
}

async fn pump(state: Arc<Mutex<QueueState>>, mut current: BoxFuture<'static, Result<(), ()>>) {
	loop {
		if !task_succeeded(spawn("queue.operation", current).await) {
			tracing::debug!("async.queue.operation_failed");
		}

		let next = {
			let mut state = state.lock();
			match state.waiting.pop_front() {
				Some(op) => op,
				None => {
					state.running = false;
					return;
				}
			}
		};
		current = next();
	}
}
