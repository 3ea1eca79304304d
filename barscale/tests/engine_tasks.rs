use std::sync::Arc;
use std::time::Duration;

use barscale::{
    BarSource, BarscaleError, EngineConfig, Exchange, Interval, ResampleEngine, ResampleOutcome,
    ResampleRequest, TaskId, TaskState, TaskStatus, TimeRange,
};
use barscale_mock::MockBarSource;
use chrono::{DateTime, Utc};

fn t(min: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(min * 60, 0).unwrap()
}

fn range(a: i64, b: i64) -> TimeRange {
    TimeRange::new(t(a), t(b)).unwrap()
}

fn req(symbol: &str, r: TimeRange) -> ResampleRequest {
    ResampleRequest::new(symbol, Exchange::Nyse, Interval::M5, r).unwrap()
}

/// Small chunks so a modest range runs as a multi-chunk background task.
fn task_cfg() -> EngineConfig {
    EngineConfig {
        chunk_threshold: 60,
        ..EngineConfig::default()
    }
}

fn queued(outcome: ResampleOutcome) -> TaskId {
    match outcome {
        ResampleOutcome::Queued(id) => id,
        ResampleOutcome::Complete(_) => panic!("expected a background task"),
    }
}

async fn wait_terminal(engine: &Arc<ResampleEngine>, id: &TaskId) -> TaskStatus {
    for _ in 0..500 {
        let status = engine.task_status(id).unwrap();
        if status.state.is_terminal() {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("task did not reach a terminal state in time");
}

#[tokio::test(flavor = "multi_thread")]
async fn large_range_runs_as_a_task_and_succeeds() {
    let source = Arc::new(MockBarSource::new());
    let engine = ResampleEngine::new(Arc::clone(&source) as Arc<dyn BarSource>, task_cfg());

    // 600 source minutes against a 60-minute threshold: ten chunks.
    let id = queued(engine.resample(req("AAPL", range(0, 600))).await.unwrap());
    let status = wait_terminal(&engine, &id).await;

    assert_eq!(status.state, TaskState::Succeeded);
    assert_eq!(status.progress, 100);
    assert!(status.error.is_none());
    let bars = status.result.expect("succeeded task exposes its result");
    assert_eq!(bars.len(), 120);

    // The result landed in the cache: the same request now completes
    // synchronously with no further fetches.
    let fetches = source.fetch_count();
    match engine.resample(req("AAPL", range(0, 600))).await.unwrap() {
        ResampleOutcome::Complete(cached) => assert_eq!(cached, bars),
        ResampleOutcome::Queued(_) => panic!("cached result must not respawn a task"),
    }
    assert_eq!(source.fetch_count(), fetches);
}

#[tokio::test(flavor = "multi_thread")]
async fn identical_requests_coalesce_onto_one_task() {
    let source = Arc::new(MockBarSource::new().with_latency(Duration::from_millis(30)));
    let engine = ResampleEngine::new(source as Arc<dyn BarSource>, task_cfg());
    let r = req("AAPL", range(0, 600));

    let first = queued(engine.resample(r.clone()).await.unwrap());
    let second = queued(engine.resample(r.clone()).await.unwrap());
    assert_eq!(first, second);

    // A different range is a different key and must not coalesce.
    let other = queued(engine.resample(req("AAPL", range(0, 900))).await.unwrap());
    assert_ne!(other, first);

    wait_terminal(&engine, &first).await;
    wait_terminal(&engine, &other).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn cancellation_stops_at_a_chunk_boundary() {
    // 20 chunks at 50ms of latency each: ample time to cancel mid-run.
    let source = Arc::new(MockBarSource::new().with_latency(Duration::from_millis(50)));
    let engine = ResampleEngine::new(source as Arc<dyn BarSource>, task_cfg());

    let id = queued(engine.resample(req("AAPL", range(0, 1_200))).await.unwrap());
    tokio::time::sleep(Duration::from_millis(80)).await;
    engine.cancel_task(&id).unwrap();

    let status = wait_terminal(&engine, &id).await;
    assert_eq!(status.state, TaskState::Cancelled);
    assert!(status.progress < 100);
    assert!(status.result.is_none());
    // No partial output is cached.
    assert!(engine.cache().is_empty().await);

    // Cancelling again is a harmless no-op.
    engine.cancel_task(&id).unwrap();
    assert_eq!(
        engine.task_status(&id).unwrap().state,
        TaskState::Cancelled
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_source_surfaces_through_task_status() {
    let source = Arc::new(MockBarSource::new());
    let engine = ResampleEngine::new(source as Arc<dyn BarSource>, task_cfg());

    let id = queued(engine.resample(req("FAIL", range(0, 600))).await.unwrap());
    let status = wait_terminal(&engine, &id).await;

    assert_eq!(status.state, TaskState::Failed);
    assert!(status.result.is_none());
    assert!(matches!(
        status.error,
        Some(BarscaleError::AdapterUnavailable(_))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_store_fails_the_task_with_no_base_data() {
    let source = Arc::new(MockBarSource::new());
    let engine = ResampleEngine::new(source as Arc<dyn BarSource>, task_cfg());

    let id = queued(engine.resample(req("EMPTY", range(0, 600))).await.unwrap());
    let status = wait_terminal(&engine, &id).await;

    assert_eq!(status.state, TaskState::Failed);
    assert!(matches!(
        status.error,
        Some(BarscaleError::NoBaseData { .. })
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_task_id_is_an_error() {
    let source = Arc::new(MockBarSource::new());
    let engine = ResampleEngine::new(source as Arc<dyn BarSource>, task_cfg());

    let err = engine.task_status(&TaskId::from("0000000000000000")).unwrap_err();
    assert!(matches!(err, BarscaleError::UnknownTask { .. }));
    let err = engine.cancel_task(&TaskId::from("0000000000000000")).unwrap_err();
    assert!(matches!(err, BarscaleError::UnknownTask { .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn terminal_tasks_are_reaped_after_retention() {
    let cfg = EngineConfig {
        chunk_threshold: 60,
        task_retention: Duration::ZERO,
        ..EngineConfig::default()
    };
    let source = Arc::new(MockBarSource::new());
    let engine = ResampleEngine::new(source as Arc<dyn BarSource>, cfg);

    let id = queued(engine.resample(req("AAPL", range(0, 600))).await.unwrap());

    // With zero retention the record disappears on the first poll after it
    // reaches a terminal state.
    for _ in 0..500 {
        match engine.task_status(&id) {
            Ok(status) => {
                assert!(!status.state.is_terminal(), "terminal snapshot should have been reaped");
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            Err(BarscaleError::UnknownTask { .. }) => return,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    panic!("task was never reaped");
}
