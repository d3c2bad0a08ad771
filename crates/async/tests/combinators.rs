use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use quire_async::{
	ParallelMode, PromiseState, SequentialMode, TaskFailed, TimeoutError, do_in_parallel, do_in_parallel_aggregate_errors, do_sequentially,
	with_timeout,
};
use tokio::time::Instant;

fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_test_writer()
		.with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
		.try_init();
}

/// Settles after `ms`: rejects with `ms` when `fail` is set, else fulfills with `ms`.
fn after(ms: u64, fail: bool) -> impl Future<Output = Result<u64, u64>> + Send + 'static {
	async move {
		tokio::time::sleep(Duration::from_millis(ms)).await;
		if fail { Err(ms) } else { Ok(ms) }
	}
}

fn assert_elapsed(start: Instant, expected_ms: u64) {
	let elapsed = start.elapsed();
	let expected = Duration::from_millis(expected_ms);
	assert!(
		elapsed >= expected && elapsed < expected + Duration::from_millis(5),
		"expected ~{expected:?}, got {elapsed:?}"
	);
}

#[derive(Debug, Clone, Copy)]
struct Span {
	index: usize,
	launched: Instant,
	settled: Option<Instant>,
}

/// Shared log of task launch/settle times.
#[derive(Clone, Default)]
struct Timeline(Arc<Mutex<Vec<Span>>>);

impl Timeline {
	fn launch(&self, index: usize, ms: u64, fail: bool) -> impl Future<Output = Result<u64, u64>> + Send + use<> {
		let slot = {
			let mut spans = self.0.lock();
			spans.push(Span {
				index,
				launched: Instant::now(),
				settled: None,
			});
			spans.len() - 1
		};
		let spans = Arc::clone(&self.0);
		async move {
			let outcome = after(ms, fail).await;
			spans.lock()[slot].settled = Some(Instant::now());
			outcome
		}
	}

	fn spans(&self) -> Vec<Span> {
		self.0.lock().clone()
	}
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn empty_input_resolves_without_launching() {
	init_tracing();
	let never = |_: u64, _: usize| -> std::future::Ready<Result<(), ()>> { unreachable!("no items, no launches") };

	for mode in [ParallelMode::FailFast, ParallelMode::FailSlow] {
		let master = do_in_parallel(Vec::new(), never, mode);
		assert_eq!(master.state(), PromiseState::Fulfilled);
	}
	for mode in [SequentialMode::StopOnFailure, SequentialMode::ContinueOnFailure] {
		let master = do_sequentially(Vec::new(), never, mode);
		assert_eq!(master.state(), PromiseState::Fulfilled);
	}
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn parallel_success_waits_for_slowest() {
	init_tracing();
	let timeline = Timeline::default();
	let start = Instant::now();

	let tl = timeline.clone();
	let master = do_in_parallel(vec![100, 200, 300, 400], move |ms, i| tl.launch(i, ms, false), true);

	let spans = timeline.spans();
	assert_eq!(spans.len(), 4, "every task launched before returning");
	assert!(spans.iter().all(|s| s.launched == start && s.settled.is_none()));

	assert_eq!(master.await, Ok(()));
	assert_elapsed(start, 400);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn parallel_fail_fast_rejects_on_first_failure() {
	init_tracing();
	let timeline = Timeline::default();
	let start = Instant::now();

	let tl = timeline.clone();
	let items = vec![(100, false), (200, false), (50, true), (400, false)];
	let master = do_in_parallel(items, move |(ms, fail), i| tl.launch(i, ms, fail), ParallelMode::FailFast);

	assert_eq!(master.clone().await, Err(TaskFailed));
	assert_elapsed(start, 50);
	assert_eq!(timeline.spans().iter().filter(|s| s.settled.is_some()).count(), 1);

	// The remaining tasks still run to completion.
	tokio::time::sleep(Duration::from_millis(500)).await;
	assert!(timeline.spans().iter().all(|s| s.settled.is_some()));
	assert_eq!(master.state(), PromiseState::Rejected);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn parallel_fail_slow_waits_for_everything() {
	init_tracing();
	let timeline = Timeline::default();
	let start = Instant::now();

	let tl = timeline.clone();
	let items = vec![(100, false), (200, false), (50, true), (400, false)];
	let master = do_in_parallel(items, move |(ms, fail), i| tl.launch(i, ms, fail), ParallelMode::FailSlow);

	tokio::time::sleep(Duration::from_millis(60)).await;
	assert_eq!(master.state(), PromiseState::Pending, "a failure alone must not settle fail-slow");

	assert_eq!(master.await, Err(TaskFailed));
	assert_elapsed(start, 400);
	assert!(timeline.spans().iter().all(|s| s.settled.is_some()));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn sequential_tasks_never_overlap() {
	init_tracing();
	let timeline = Timeline::default();
	let start = Instant::now();

	let tl = timeline.clone();
	let items = vec![(40, false), (10, true), (30, false), (20, false)];
	let master = do_sequentially(items, move |(ms, fail), i| tl.launch(i, ms, fail), SequentialMode::ContinueOnFailure);

	assert_eq!(master.await, Err(TaskFailed));
	assert_elapsed(start, 100);

	let spans = timeline.spans();
	assert_eq!(spans.iter().map(|s| s.index).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
	for pair in spans.windows(2) {
		let settled = pair[0].settled.expect("earlier task settled");
		assert!(pair[1].launched >= settled, "task {} launched before task {} settled", pair[1].index, pair[0].index);
	}
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn sequential_stop_on_failure_skips_the_rest() {
	init_tracing();
	let timeline = Timeline::default();
	let start = Instant::now();

	let tl = timeline.clone();
	let items = vec![(40, false), (10, true), (30, false), (20, false)];
	let master = do_sequentially(items, move |(ms, fail), i| tl.launch(i, ms, fail), SequentialMode::StopOnFailure);

	assert_eq!(master.await, Err(TaskFailed));
	assert_elapsed(start, 50);

	tokio::time::sleep(Duration::from_millis(200)).await;
	assert_eq!(timeline.spans().iter().map(|s| s.index).collect::<Vec<_>>(), vec![0, 1]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn aggregate_errors_lists_every_failure_in_settlement_order() {
	init_tracing();
	let start = Instant::now();
	let master = do_in_parallel_aggregate_errors(vec![300u64, 100, 400, 200], |ms, _| after(ms, true));

	let err = master.await.expect_err("every task rejects");
	assert_elapsed(start, 400);
	assert_eq!(err.len(), 4);
	assert!(err.records().iter().all(|r| r.item == r.error));
	assert_eq!(err.records().iter().map(|r| r.item).collect::<Vec<_>>(), vec![100, 200, 300, 400]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn timeout_passes_through_a_faster_outcome() {
	init_tracing();
	let start = Instant::now();
	let wrapped = with_timeout(after(100, false), Duration::from_millis(1000));
	assert_eq!(wrapped.clone().await, Ok(100));
	assert_elapsed(start, 100);

	let failed = with_timeout(after(100, true), Duration::from_millis(1000)).await;
	assert_eq!(failed, Err(TimeoutError::Failed(100)));

	// The disarmed timer never overrides the real outcome.
	tokio::time::sleep(Duration::from_millis(2000)).await;
	assert_eq!(wrapped.try_outcome(), Some(Ok(100)));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn timeout_fires_before_a_slow_outcome() {
	init_tracing();
	let start = Instant::now();
	let outcome = with_timeout(after(1000, true), Duration::from_millis(100)).await;
	assert_elapsed(start, 100);
	assert_eq!(outcome, Err(TimeoutError::TimedOut));
	assert!(outcome.unwrap_err().is_timeout());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn late_outcome_after_timeout_is_ignored() {
	init_tracing();
	let finished = Arc::new(Mutex::new(false));
	let flag = Arc::clone(&finished);
	let slow = async move {
		tokio::time::sleep(Duration::from_millis(1000)).await;
		*flag.lock() = true;
		Ok::<_, String>("late value")
	};

	let wrapped = with_timeout(slow, Duration::from_millis(100));
	assert_eq!(wrapped.clone().await, Err(TimeoutError::TimedOut));

	tokio::time::sleep(Duration::from_millis(1500)).await;
	assert!(*finished.lock(), "the wrapped future keeps running after the timeout");
	assert_eq!(wrapped.try_outcome(), Some(Err(TimeoutError::TimedOut)));
}

#[test]
fn combinators_run_without_an_ambient_runtime() {
	let master = do_in_parallel(vec![10, 20], |ms, _| after(ms, false), ParallelMode::FailFast);
	assert_eq!(futures::executor::block_on(master.into_future()), Ok(()));

	let wrapped = with_timeout(after(10, false), Duration::from_secs(5));
	assert_eq!(futures::executor::block_on(wrapped.into_future()), Ok(10));

	let timed_out = with_timeout(after(5_000, false), Duration::from_millis(10));
	assert_eq!(futures::executor::block_on(timed_out.into_future()), Err(TimeoutError::TimedOut));
}
