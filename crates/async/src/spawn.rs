use std::future::Future;
use std::sync::OnceLock;

use tokio::task::{JoinError, JoinHandle};

pub(crate) fn runtime_handle() -> tokio::runtime::Handle {
	if let Ok(handle) = tokio::runtime::Handle::try_current() {
		return handle;
	}

	static GLOBAL_RT: OnceLock<tokio::runtime::Runtime> = OnceLock::new();
	let runtime = GLOBAL_RT.get_or_init(|| {
		tokio::runtime::Builder::new_multi_thread()
			.enable_all()
			.worker_threads(2)
			.thread_name("quire-async-global")
			.build()
			.expect("failed to build quire-async global tokio runtime")
	});
	runtime.handle().clone()
}

/// Spawns a launched task (or a combinator driver) on the current runtime,
/// or on a shared fallback runtime when called outside of one.
///
/// The returned handle may be dropped freely: the task keeps running.
pub(crate) fn spawn<F>(kind: &'static str, fut: F) -> JoinHandle<F::Output>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	tracing::trace!(kind, "async.spawn");
	runtime_handle().spawn(fut)
}

/// Folds a joined task outcome into success/failure.
///
/// A task that panicked or was aborted counts as a failed task.
pub(crate) fn task_succeeded<T, E>(joined: Result<Result<T, E>, JoinError>) -> bool {
	match joined {
		Ok(outcome) => outcome.is_ok(),
		Err(err) => {
			log_join_error(err);
			false
		}
	}
}

pub(crate) fn log_join_error(err: JoinError) {
	match join_error_panic_message(err) {
		Some(panic) => tracing::warn!(%panic, "async.task.panicked"),
		None => tracing::warn!("async.task.cancelled"),
	}
}

/// Extracts the panic payload message from a [`JoinError`], if it panicked.
pub(crate) fn join_error_panic_message(err: JoinError) -> Option<String> {
	let payload = err.try_into_panic().ok()?;
	if let Some(msg) = payload.downcast_ref::<&'static str>() {
		Some((*msg).to_string())
	} else if let Some(msg) = payload.downcast_ref::<String>() {
		Some(msg.clone())
	} else {
		Some("<non-string panic payload>".to_string())
	}
}
