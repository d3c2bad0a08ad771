use std::future::Future;

use tokio::task::{JoinError, JoinSet};

/// Join set whose spawns are routed through the crate's runtime handle, so
/// launching works both inside and outside a tokio runtime.
///
/// Completions are yielded in settlement order, not launch order.
#[derive(Debug)]
pub(crate) struct TaskSet<T> {
	kind: &'static str,
	inner: JoinSet<T>,
}

impl<T> TaskSet<T>
where
	T: Send + 'static,
{
	pub(crate) fn new(kind: &'static str) -> Self {
		Self { kind, inner: JoinSet::new() }
	}

	pub(crate) fn len(&self) -> usize {
		self.inner.len()
	}

	pub(crate) fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	/// Starts `fut` immediately on the runtime.
	pub(crate) fn spawn<F>(&mut self, fut: F)
	where
		F: Future<Output = T> + Send + 'static,
	{
		tracing::trace!(kind = self.kind, pending = self.inner.len(), "async.task_set.spawn");
		let handle = crate::spawn::runtime_handle();
		let _guard = handle.enter();
		self.inner.spawn(fut);
	}

	/// Waits for the next task to settle.
	pub(crate) async fn join_next(&mut self) -> Option<Result<T, JoinError>> {
		self.inner.join_next().await
	}
}
