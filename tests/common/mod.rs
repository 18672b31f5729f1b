//! Common test utilities shared across integration tests.

use std::time::Duration;
use tempo::{Engine, SchedulerService, ServiceState};

/// Initialize structured log output for a test.
///
/// Safe to call from every test; only the first call installs the
/// subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

/// Wait for the service to reach an expected lifecycle state.
///
/// This is more reliable than fixed sleeps since run startup time can vary.
/// Polls every 10ms and times out after the specified duration.
///
/// # Panics
///
/// Panics if the timeout is reached before the state is observed.
pub async fn wait_for_state<E: Engine>(
    service: &SchedulerService<E>,
    expected: ServiceState,
    timeout: Duration,
) {
    let start = tokio::time::Instant::now();
    loop {
        let state = service.state().await;
        if state == expected {
            return;
        }
        if start.elapsed() > timeout {
            panic!(
                "Timeout waiting for state {:?}, current state: {:?}",
                expected, state
            );
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
