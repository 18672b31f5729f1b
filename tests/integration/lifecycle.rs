//! Lifecycle integration tests.
//!
//! Tests that drive the full start/stop/cancel flow of the service against
//! the mock engine.

use std::sync::Arc;
use std::time::Duration;

use tempo::testing::{MockEngine, RecordingSubscriber};
use tempo::{
    Engine, SchedulerService, ServiceError, ServiceOptions, ServiceState, TaskDue, TaskId,
};
use tokio_util::sync::CancellationToken;

use crate::common::{init_tracing, wait_for_state};

fn connect(options: ServiceOptions) -> Arc<SchedulerService<MockEngine>> {
    Arc::new(SchedulerService::connect(options, |_| Ok(MockEngine::new())).unwrap())
}

fn spawn_run(
    service: &Arc<SchedulerService<MockEngine>>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<Result<(), ServiceError>> {
    let service = Arc::clone(service);
    tokio::spawn(async move { service.start(cancel).await })
}

/// Test: the full path from options to a delivered due notification.
///
/// Constructs the service with a task-source path and a tick override,
/// subscribes to the due channel, starts a run, lets the engine raise one
/// due trigger, and stops.
#[tokio::test]
async fn test_end_to_end_due_notification() {
    init_tracing();
    let mut options = ServiceOptions::new("jobs.cfg");
    options.tick_interval = Some(5);

    let service = connect(options);
    let engine = service.engine();
    assert_eq!(engine.tick_interval(), Duration::from_millis(5));

    let handler = RecordingSubscriber::<TaskDue>::new();
    service.on_task_due(handler.clone()).unwrap();

    let runner = spawn_run(&service, CancellationToken::new());
    wait_for_state(&service, ServiceState::Running, Duration::from_secs(1)).await;

    engine.emit_task_due(TaskDue::now("jobs.cfg#report")).await;
    handler.wait_for(1, Duration::from_secs(1)).await;

    let events = handler.events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].task_id, TaskId::new("jobs.cfg#report"));

    service.stop().await;
    runner.await.unwrap().unwrap();
    assert_eq!(service.state().await, ServiceState::Stopped);

    // Exactly one notification; stopping raised nothing further.
    assert_eq!(handler.count().await, 1);
}

#[tokio::test]
async fn test_service_is_restartable_with_the_same_engine() {
    init_tracing();
    let service = connect(ServiceOptions::new("jobs.cfg"));

    for _ in 0..2 {
        let runner = spawn_run(&service, CancellationToken::new());
        wait_for_state(&service, ServiceState::Running, Duration::from_secs(1)).await;
        service.stop().await;
        runner.await.unwrap().unwrap();
        wait_for_state(&service, ServiceState::Stopped, Duration::from_secs(1)).await;
    }

    // The one engine handle served both runs.
    assert_eq!(service.engine().start_count(), 2);
}

#[tokio::test]
async fn test_stop_is_idempotent_across_the_whole_run() {
    init_tracing();
    let service = connect(ServiceOptions::new("jobs.cfg"));

    let runner = spawn_run(&service, CancellationToken::new());
    wait_for_state(&service, ServiceState::Running, Duration::from_secs(1)).await;

    service.stop().await;
    service.stop().await;
    runner.await.unwrap().unwrap();
    assert_eq!(service.state().await, ServiceState::Stopped);

    // Stopping after the run completed is still a no-op.
    service.stop().await;
    assert_eq!(service.state().await, ServiceState::Stopped);
}

#[tokio::test]
async fn test_cancellation_matches_stop_semantics() {
    init_tracing();
    let service = connect(ServiceOptions::new("jobs.cfg"));
    let cancel = CancellationToken::new();

    let runner = spawn_run(&service, cancel.clone());
    wait_for_state(&service, ServiceState::Running, Duration::from_secs(1)).await;

    cancel.cancel();
    runner.await.unwrap().unwrap();
    assert_eq!(service.state().await, ServiceState::Stopped);

    // Cancelling again after completion must not fault.
    cancel.cancel();
    assert_eq!(service.state().await, ServiceState::Stopped);
}

#[tokio::test]
async fn test_subscriptions_survive_a_restart() {
    init_tracing();
    let service = connect(ServiceOptions::new("jobs.cfg"));
    let engine = service.engine();
    let handler = RecordingSubscriber::<TaskDue>::new();
    service.on_task_due(handler.clone()).unwrap();

    let runner = spawn_run(&service, CancellationToken::new());
    wait_for_state(&service, ServiceState::Running, Duration::from_secs(1)).await;
    engine.emit_task_due(TaskDue::now("first_run")).await;
    service.stop().await;
    runner.await.unwrap().unwrap();
    wait_for_state(&service, ServiceState::Stopped, Duration::from_secs(1)).await;

    let runner = spawn_run(&service, CancellationToken::new());
    wait_for_state(&service, ServiceState::Running, Duration::from_secs(1)).await;
    engine.emit_task_due(TaskDue::now("second_run")).await;
    service.stop().await;
    runner.await.unwrap().unwrap();

    handler.wait_for(2, Duration::from_secs(1)).await;
    let events = handler.events().await;
    assert_eq!(events[0].task_id, TaskId::new("first_run"));
    assert_eq!(events[1].task_id, TaskId::new("second_run"));
}
