//! Pipeline lifecycle: start/stop/health, graceful stop, closed queue.

use std::time::Duration;

use scanward_core::error::{PipelineError, ScanwardError};
use scanward_core::pipeline::{HealthStatus, Pipeline};
use scanward_core::types::JobStatus;
use scanward_scan_queue::ScanQueueError;

use crate::helpers::*;

#[tokio::test]
async fn lifecycle_transitions_and_health() {
    let harness = Harness::new();
    let (mut queue, _events) = harness.queue(ScriptedExecutor::new());

    assert_eq!(queue.state_name(), "initialized");
    assert!(!queue.health_check().await.is_healthy());
    assert!(matches!(
        queue.stop().await,
        Err(ScanwardError::Pipeline(PipelineError::NotRunning))
    ));

    queue.start().await.unwrap();
    assert_eq!(queue.state_name(), "running");
    assert_eq!(queue.health_check().await, HealthStatus::Healthy);
    assert!(matches!(
        queue.start().await,
        Err(ScanwardError::Pipeline(PipelineError::AlreadyRunning))
    ));

    queue.stop().await.unwrap();
    assert_eq!(queue.state_name(), "stopped");
    assert_eq!(
        queue.health_check().await,
        HealthStatus::Unhealthy("stopped".to_owned())
    );
}

#[tokio::test]
async fn stopped_queue_cannot_restart() {
    let harness = Harness::new();
    let (mut queue, _events) = harness.queue(ScriptedExecutor::new());

    queue.start().await.unwrap();
    queue.stop().await.unwrap();

    assert!(matches!(
        queue.start().await,
        Err(ScanwardError::Pipeline(PipelineError::InitFailed(_)))
    ));
}

#[tokio::test]
async fn stop_lets_in_flight_job_finish_and_fails_the_rest() {
    let harness = Harness::new();
    let account = harness
        .owner_of(1, &["a.example.com", "b.example.com"])
        .await;
    let executor = ScriptedExecutor::with_delay(Duration::from_millis(200));
    let (mut queue, mut events) = harness.queue(executor.clone());
    let service = queue.service();

    let a = service.start_scan(account, "a.example.com", 10).await.unwrap();
    let b = service.start_scan(account, "b.example.com", 10).await.unwrap();
    queue.start().await.unwrap();

    wait_running(&mut events, a.id).await;
    queue.stop().await.unwrap();

    assert_eq!(harness.job(a.id).await.status, JobStatus::Completed);
    let b = harness.job(b.id).await;
    assert_eq!(b.status, JobStatus::Failed);
    assert_eq!(b.failure_reason.as_deref(), Some("scan queue stopped"));
    assert_eq!(executor.calls(), vec!["a.example.com"]);
}

#[tokio::test]
async fn requests_after_stop_fail_with_queue_closed() {
    let harness = Harness::new();
    let account = harness.owner_of(1, &["shop.example.com"]).await;
    let (mut queue, _events) = harness.queue(ScriptedExecutor::new());
    let service = queue.service();

    queue.start().await.unwrap();
    queue.stop().await.unwrap();

    let err = service
        .start_scan(account, "shop.example.com", 10)
        .await
        .unwrap_err();
    assert!(matches!(err, ScanQueueError::QueueClosed));
    assert_eq!(err.status_code(), 503);

    // The orphaned job was closed, so the domain is not left busy.
    let jobs = harness.store.jobs().await;
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].status, JobStatus::Failed);

    let err = service
        .start_scan(account, "shop.example.com", 10)
        .await
        .unwrap_err();
    assert!(matches!(err, ScanQueueError::QueueClosed));
}
