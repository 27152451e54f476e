//! Worker sequencing: retry once at the head, failure recording, store faults.

use std::sync::Arc;

use scanward_core::event::JobEventKind;
use scanward_core::pipeline::Pipeline;
use scanward_core::types::JobStatus;
use scanward_scan_executor::{ScanExecutorConfig, TieredExecutor};
use scanward_scan_queue::ScanQueueBuilder;

use crate::helpers::*;

#[tokio::test]
async fn failing_once_then_succeeding_completes_with_second_findings() {
    let harness = Harness::new();
    let account = harness.owner_of(1, &["shop.example.com"]).await;
    let executor = ScriptedExecutor::new().script(
        "shop.example.com",
        vec![Outcome::Fail(1), Outcome::Succeed(vec!["second-attempt"])],
    );
    let (mut queue, mut events) = harness.queue(executor.clone());
    queue.start().await.unwrap();

    let job = queue
        .service()
        .start_scan(account, "shop.example.com", 50)
        .await
        .unwrap();
    let kinds = collect_until_terminal(&mut events, job.id).await;

    assert_eq!(
        kinds,
        vec![
            JobEventKind::Queued,
            JobEventKind::Running { attempt: 1 },
            JobEventKind::Retrying {
                attempt: 1,
                reason: "scanner exit code 1".to_owned(),
            },
            JobEventKind::Running { attempt: 2 },
            JobEventKind::Completed { findings: 1 },
        ]
    );
    assert_eq!(executor.calls().len(), 2);

    let job = harness.job(job.id).await;
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.attempts, 2);
    assert_eq!(job.findings.len(), 1);
    assert_eq!(job.findings[0].id, "second-attempt");
    assert!(job.failure_reason.is_none());
    assert!(job.started_at.is_some());
    assert!(job.completed_at.is_some());

    queue.stop().await.unwrap();
}

#[tokio::test]
async fn failing_twice_records_last_reason() {
    let harness = Harness::new();
    let account = harness.owner_of(1, &["shop.example.com"]).await;
    let executor = ScriptedExecutor::new().script(
        "shop.example.com",
        vec![Outcome::Fail(5), Outcome::Fail(7)],
    );
    let (mut queue, mut events) = harness.queue(executor.clone());
    queue.start().await.unwrap();

    let job = queue
        .service()
        .start_scan(account, "shop.example.com", 10)
        .await
        .unwrap();
    let kinds = collect_until_terminal(&mut events, job.id).await;

    assert_eq!(
        kinds.last(),
        Some(&JobEventKind::Failed {
            reason: "scanner exit code 7".to_owned()
        })
    );
    assert_eq!(executor.calls().len(), 2);

    let job = harness.job(job.id).await;
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.failure_reason.as_deref(), Some("scanner exit code 7"));
    assert!(job.findings.is_empty());
    assert!(job.completed_at.is_some());

    queue.stop().await.unwrap();
}

#[tokio::test]
async fn retry_runs_before_later_submissions() {
    let harness = Harness::new();
    let account = harness
        .owner_of(1, &["a.example.com", "b.example.com"])
        .await;
    let executor = ScriptedExecutor::new().script(
        "a.example.com",
        vec![Outcome::Fail(1), Outcome::Succeed(vec![])],
    );
    let (mut queue, mut events) = harness.queue(executor.clone());
    let service = queue.service();

    // Both jobs are pending before the worker starts.
    service.start_scan(account, "a.example.com", 10).await.unwrap();
    let b = service.start_scan(account, "b.example.com", 10).await.unwrap();
    queue.start().await.unwrap();

    collect_until_terminal(&mut events, b.id).await;
    assert_eq!(
        executor.calls(),
        vec!["a.example.com", "a.example.com", "b.example.com"]
    );

    queue.stop().await.unwrap();
}

#[tokio::test]
async fn jobs_run_in_submission_order() {
    let harness = Harness::new();
    let domains = ["a.example.com", "b.example.com", "c.example.com"];
    let account = harness.owner_of(1, &domains).await;
    let executor = ScriptedExecutor::new();
    let (mut queue, mut events) = harness.queue(executor.clone());
    let service = queue.service();

    let mut last = None;
    for domain in domains {
        last = Some(service.start_scan(account, domain, 10).await.unwrap());
    }
    queue.start().await.unwrap();

    let last = last.expect("three jobs submitted");
    collect_until_terminal(&mut events, last.id).await;
    assert_eq!(executor.calls(), domains);

    for job in harness.store.jobs().await {
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.attempts, 1);
    }

    queue.stop().await.unwrap();
}

#[tokio::test]
async fn stand_in_executor_completes_job() {
    let harness = Harness::new();
    let account = harness.owner_of(1, &["shop.example.com"]).await;
    let executor =
        TieredExecutor::from_config(&ScanExecutorConfig::default()).expect("valid config");
    let (mut queue, mut events) = harness.queue(executor);
    queue.start().await.unwrap();

    let job = queue
        .service()
        .start_scan(account, "shop.example.com", 100)
        .await
        .unwrap();
    collect_until_terminal(&mut events, job.id).await;

    let job = harness.job(job.id).await;
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.findings.len(), 1);
    assert_eq!(job.findings[0].affected_url, "https://shop.example.com");

    queue.stop().await.unwrap();
}

#[tokio::test]
async fn store_error_during_transition_fails_job_and_worker_continues() {
    let harness = Harness::new();
    let account = harness
        .owner_of(1, &["a.example.com", "b.example.com"])
        .await;
    let store = Arc::new(FlakyStore::new(Arc::clone(&harness.store)));
    let executor = ScriptedExecutor::new();
    let (mut queue, events) = ScanQueueBuilder::new(
        store,
        Arc::clone(&harness.verifier),
        executor.clone(),
    )
    .build()
    .unwrap();
    let mut events = events.expect("builder creates the event channel");
    let service = queue.service();

    let a = service.start_scan(account, "a.example.com", 10).await.unwrap();
    let b = service.start_scan(account, "b.example.com", 10).await.unwrap();
    queue.start().await.unwrap();

    let a_kinds = collect_until_terminal(&mut events, a.id).await;
    assert!(matches!(a_kinds.last(), Some(JobEventKind::Failed { .. })));
    collect_until_terminal(&mut events, b.id).await;

    let a = harness.job(a.id).await;
    assert_eq!(a.status, JobStatus::Failed);
    assert!(
        a.failure_reason
            .as_deref()
            .is_some_and(|r| r.contains("connection reset"))
    );
    assert_eq!(harness.job(b.id).await.status, JobStatus::Completed);
    assert_eq!(executor.calls(), vec!["b.example.com"]);

    queue.stop().await.unwrap();
}
