//! Rejection payloads produced by the combinators.

use thiserror::Error;

/// Bare aggregate failure.
///
/// Carries no detail about which task failed. Callers that need per-task
/// reasons use [`crate::do_in_parallel_aggregate_errors`] or attach their own
/// handling inside the task before returning it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("one or more tasks failed")]
pub struct TaskFailed;

/// One failed task observed by [`crate::do_in_parallel_aggregate_errors`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord<T, E> {
	/// The input item whose task failed.
	pub item: T,
	/// The reason the task rejected with.
	pub error: E,
}

/// Detailed aggregate failure: one record per failed task, in the order the
/// failures were observed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} task(s) failed", .records.len())]
pub struct AggregateError<T, E> {
	records: Vec<ErrorRecord<T, E>>,
}

impl<T, E> AggregateError<T, E> {
	pub(crate) fn new(records: Vec<ErrorRecord<T, E>>) -> Self {
		Self { records }
	}

	/// Failure records in observation order.
	pub fn records(&self) -> &[ErrorRecord<T, E>] {
		&self.records
	}

	/// Number of failed tasks.
	pub fn len(&self) -> usize {
		self.records.len()
	}

	/// Returns `true` if no records were collected.
	///
	/// This happens when the only failing tasks panicked: a panic has no
	/// reason to record, yet still fails the run.
	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	/// Consumes the error, returning the records.
	pub fn into_records(self) -> Vec<ErrorRecord<T, E>> {
		self.records
	}
}

/// Outcome of a promise wrapped by [`crate::with_timeout`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeoutError<E> {
	/// The timer elapsed before the wrapped future settled.
	///
	/// This variant is the timeout token: it can never be produced by the
	/// wrapped future itself.
	#[error("operation timed out")]
	TimedOut,
	/// The wrapped future rejected first; the reason is passed through.
	#[error("operation failed: {0}")]
	Failed(E),
	/// The wrapped future panicked before the timer elapsed.
	#[error("operation panicked")]
	Panicked,
}

impl<E> TimeoutError<E> {
	/// Returns `true` for the timeout token.
	pub const fn is_timeout(&self) -> bool {
		matches!(self, Self::TimedOut)
	}

	/// Returns the pass-through reason, if the wrapped future rejected first.
	pub fn into_inner(self) -> Option<E> {
		match self {
			Self::TimedOut | Self::Panicked => None,
			Self::Failed(err) => Some(err),
		}
	}
}
