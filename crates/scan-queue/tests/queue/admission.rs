//! Admission checks: tier, account, TOS, verification, domain busy, rate limit.

use std::sync::Arc;

use scanward_core::store::VerificationStore;
use scanward_core::types::{
    AccountId, Domain, JobStatus, VerificationMethod, VerificationRecord, VerificationStatus,
};
use scanward_scan_queue::ScanQueueError;
use scanward_verifier::VerifierError;

use crate::helpers::*;

#[tokio::test]
async fn tier_is_checked_before_account() {
    let harness = Harness::new();
    let (queue, _events) = harness.queue(ScriptedExecutor::new());

    // Unknown account, unverified domain, but the tier check comes first.
    let err = queue
        .service()
        .start_scan(AccountId(99), "shop.example.com", 20)
        .await
        .unwrap_err();

    assert!(matches!(err, ScanQueueError::InvalidPlanTier { tier: 20, .. }));
    assert_eq!(err.status_code(), 400);
    assert!(harness.store.jobs().await.is_empty());
}

#[tokio::test]
async fn malformed_domain_is_rejected() {
    let harness = Harness::new();
    let account = harness.account(1, true).await;
    let (queue, _events) = harness.queue(ScriptedExecutor::new());

    let err = queue
        .service()
        .start_scan(account, "not a domain", 10)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn unknown_account_is_unauthenticated() {
    let harness = Harness::new();
    let (queue, _events) = harness.queue(ScriptedExecutor::new());

    let err = queue
        .service()
        .start_scan(AccountId(42), "shop.example.com", 10)
        .await
        .unwrap_err();
    assert!(matches!(err, ScanQueueError::Unauthenticated(AccountId(42))));
    assert_eq!(err.status_code(), 401);
}

#[tokio::test]
async fn tos_must_be_accepted() {
    let harness = Harness::new();
    let account = harness.account(1, false).await;
    harness.verify(account, "shop.example.com").await;
    let (queue, _events) = harness.queue(ScriptedExecutor::new());

    let err = queue
        .service()
        .start_scan(account, "shop.example.com", 10)
        .await
        .unwrap_err();
    assert!(matches!(err, ScanQueueError::TosNotAccepted(_)));
    assert_eq!(err.status_code(), 403);
}

#[tokio::test]
async fn unverified_domain_is_always_ineligible() {
    let harness = Harness::new();
    let with_tos = harness.account(1, true).await;
    let without_tos = harness.account(2, false).await;
    let (queue, _events) = harness.queue(ScriptedExecutor::new());
    let service = queue.service();

    for account in [with_tos, without_tos] {
        for tier in [10, 50, 100] {
            let err = service
                .start_scan(account, "unverified.example.com", tier)
                .await
                .unwrap_err();
            assert_eq!(err.status_code(), 403, "account {account} tier {tier}: {err}");
        }
    }

    let err = service
        .start_scan(with_tos, "unverified.example.com", 100)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ScanQueueError::Verification(VerifierError::NotVerified { .. })
    ));
    assert!(harness.store.jobs().await.is_empty());
}

#[tokio::test]
async fn domain_verified_by_another_account_is_ineligible() {
    let harness = Harness::new();
    harness.owner_of(1, &["shop.example.com"]).await;
    let intruder = harness.account(2, true).await;
    let (queue, _events) = harness.queue(ScriptedExecutor::new());

    let err = queue
        .service()
        .start_scan(intruder, "shop.example.com", 100)
        .await
        .unwrap_err();
    assert!(matches!(err, ScanQueueError::Verification(_)));
    assert_eq!(err.status_code(), 403);
}

#[tokio::test]
async fn blocked_domain_is_rejected() {
    let harness = Harness::new();
    let account = harness.account(1, true).await;
    harness
        .store
        .upsert_verification(VerificationRecord {
            domain: Domain::parse("blocked.example.com").unwrap(),
            method: VerificationMethod::Dns,
            token: "whatever".to_owned(),
            status: VerificationStatus::Blocked,
            account_id: account,
            verified_at: None,
            failed_at: None,
        })
        .await
        .unwrap();
    let (queue, _events) = harness.queue(ScriptedExecutor::new());

    let err = queue
        .service()
        .start_scan(account, "blocked.example.com", 10)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ScanQueueError::Verification(VerifierError::Blocked { .. })
    ));
    assert_eq!(err.status_code(), 403);
}

#[tokio::test]
async fn second_request_for_active_domain_is_busy() {
    let harness = Harness::new();
    let account = harness.owner_of(1, &["shop.example.com"]).await;
    let (queue, _events) = harness.queue(ScriptedExecutor::new());
    let service = queue.service();

    let first = service
        .start_scan(account, "shop.example.com", 10)
        .await
        .unwrap();
    assert_eq!(first.status, JobStatus::Queued);

    let err = service
        .start_scan(account, "SHOP.example.com.", 50)
        .await
        .unwrap_err();
    match err {
        ScanQueueError::DomainBusy { job_id, .. } => assert_eq!(job_id, first.id),
        other => panic!("expected DomainBusy, got {other}"),
    }
}

#[tokio::test]
async fn fourth_active_job_is_rate_limited() {
    let harness = Harness::new();
    let domains = [
        "a.example.com",
        "b.example.com",
        "c.example.com",
        "d.example.com",
    ];
    let account = harness.owner_of(1, &domains).await;
    // Queue is never started so admitted jobs stay queued.
    let (queue, _events) = harness.queue(ScriptedExecutor::new());
    let service = queue.service();

    for domain in &domains[..3] {
        let job = service.start_scan(account, domain, 10).await.unwrap();
        assert_eq!(job.status, JobStatus::Queued);
    }

    let err = service
        .start_scan(account, domains[3], 10)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ScanQueueError::RateLimited {
            active: 3,
            limit: 3,
            ..
        }
    ));
    assert_eq!(err.status_code(), 429);
    assert_eq!(harness.store.jobs().await.len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_admit_one_job_per_domain() {
    let harness = Harness::new();
    let account = harness.owner_of(1, &["shop.example.com"]).await;
    let (queue, _events) = harness.queue(ScriptedExecutor::new());
    let service = Arc::new(queue.service());

    let mut handles = Vec::new();
    for _ in 0..16 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service.start_scan(account, "shop.example.com", 10).await
        }));
    }

    let mut admitted = 0;
    let mut busy = 0;
    for handle in handles {
        match handle.await.expect("task completes") {
            Ok(_) => admitted += 1,
            Err(ScanQueueError::DomainBusy { .. }) => busy += 1,
            Err(other) => panic!("unexpected rejection: {other}"),
        }
    }

    assert_eq!(admitted, 1);
    assert_eq!(busy, 15);

    let active: Vec<_> = harness
        .store
        .jobs()
        .await
        .into_iter()
        .filter(|job| job.status.is_active())
        .collect();
    assert_eq!(active.len(), 1);
}
