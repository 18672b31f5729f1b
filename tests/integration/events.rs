//! Event relaying integration tests.
//!
//! Tests the subscription surface and delivery guarantees under both
//! contract generations, driven by engine-side emissions.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempo::testing::{CountingSubscriber, MockEngine, RecordingSubscriber};
use tempo::{
    ErrorEvent, ExecutionError, LoadingError, SchedulerService, ServiceOptions, Subscriber,
    TaskDue, TaskId,
};
use tokio::sync::Mutex;

fn connect(version: &str) -> SchedulerService<MockEngine> {
    let mut options = ServiceOptions::new("tasks.xml");
    options.version = version.into();
    SchedulerService::connect(options, |_| Ok(MockEngine::new())).unwrap()
}

/// Subscriber that appends its label to a shared log, for ordering checks.
struct Labelled {
    label: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl Labelled {
    fn new(label: &'static str, log: &Arc<Mutex<Vec<&'static str>>>) -> Arc<Self> {
        Arc::new(Self {
            label,
            log: Arc::clone(log),
        })
    }
}

#[async_trait]
impl Subscriber<TaskDue> for Labelled {
    async fn notify(&self, _event: &TaskDue) {
        self.log.lock().await.push(self.label);
    }
}

/// Subscriber that panics, for isolation checks.
struct Exploding;

#[async_trait]
impl Subscriber<ExecutionError> for Exploding {
    async fn notify(&self, _event: &ExecutionError) {
        panic!("handler failure");
    }
}

#[tokio::test]
async fn test_handlers_invoked_in_subscription_order() {
    let service = connect("v2.0");
    let engine = service.engine();
    let log = Arc::new(Mutex::new(Vec::new()));

    service.on_task_due(Labelled::new("h1", &log)).unwrap();
    service.on_task_due(Labelled::new("h2", &log)).unwrap();

    engine.emit_task_due(TaskDue::now("report")).await;

    assert_eq!(*log.lock().await, vec!["h1", "h2"]);
}

#[tokio::test]
async fn test_unsubscribed_before_dispatch_is_never_invoked() {
    let service = connect("v2.0");
    let engine = service.engine();

    let handler = RecordingSubscriber::<TaskDue>::new();
    let keeper = RecordingSubscriber::<TaskDue>::new();

    let id = service.on_task_due(handler.clone()).unwrap();
    service.on_task_due(keeper.clone()).unwrap();
    assert!(service.unsubscribe(id));

    engine.emit_task_due(TaskDue::now("report")).await;

    assert_eq!(handler.count().await, 0);
    assert_eq!(keeper.count().await, 1);
}

#[tokio::test]
async fn test_categorized_channels_never_cross() {
    let service = connect("v2.0");
    let engine = service.engine();

    let execution = RecordingSubscriber::<ExecutionError>::new();
    let loading = RecordingSubscriber::<LoadingError>::new();
    service.on_execution_error(execution.clone()).unwrap();
    service.on_loading_error(loading.clone()).unwrap();

    engine
        .emit_loading_error(LoadingError::new("tasks.xml", "parse failure"))
        .await;
    assert_eq!(execution.count().await, 0);
    assert_eq!(loading.count().await, 1);

    engine
        .emit_execution_error(ExecutionError::new("ingest", "exit 1"))
        .await;
    assert_eq!(execution.count().await, 1);
    assert_eq!(loading.count().await, 1);
}

#[tokio::test]
async fn test_merged_channel_conflates_error_categories() {
    let service = connect("v1.0");
    let engine = service.engine();

    let errors = RecordingSubscriber::<ErrorEvent>::new();
    service.on_error(errors.clone()).unwrap();

    engine
        .emit_execution_error(ExecutionError::new("ingest", "exit 1"))
        .await;
    engine
        .emit_loading_error(LoadingError::new("tasks.xml", "parse failure"))
        .await;

    errors.wait_for(2, Duration::from_secs(1)).await;
    let events = errors.events().await;
    assert_eq!(events[0].task_id, Some(TaskId::new("ingest")));
    assert_eq!(events[1].task_id, None);
}

#[tokio::test]
async fn test_panicking_handler_does_not_starve_later_handlers() {
    let service = connect("v2.0");
    let engine = service.engine();

    service.on_execution_error(Arc::new(Exploding)).unwrap();
    let survivor = CountingSubscriber::new();
    service.on_execution_error(survivor.clone()).unwrap();

    engine
        .emit_execution_error(ExecutionError::new("ingest", "exit 1"))
        .await;

    assert_eq!(survivor.count(), 1);
}

#[tokio::test]
async fn test_error_without_subscribers_is_dropped_silently() {
    let service = connect("v2.0");
    let engine = service.engine();

    // No error subscribers registered; emission must simply vanish.
    engine
        .emit_execution_error(ExecutionError::new("ingest", "exit 1"))
        .await;
    engine
        .emit_loading_error(LoadingError::new("tasks.xml", "parse failure"))
        .await;
}

#[tokio::test]
async fn test_awaited_delivery_completes_before_emit_returns() {
    let service = connect("v2.0");
    let engine = service.engine();

    let handler = RecordingSubscriber::<ExecutionError>::new();
    service.on_execution_error(handler.clone()).unwrap();

    engine
        .emit_execution_error(ExecutionError::new("ingest", "exit 1").with_retry())
        .await;

    // Categorized handlers are awaited: the notification is already here.
    let events = handler.events().await;
    assert_eq!(events.len(), 1);
    assert!(events[0].will_retry);
}
