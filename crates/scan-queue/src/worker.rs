//! 단일 소비자 워커
//!
//! 프로세스 전체에서 한 번에 하나의 작업만 실행합니다.
//! 대기열은 (작업 ID, 재시도 횟수) 쌍의 deque이며, 재시도는 맨 앞으로 들어갑니다.
//!
//! ```text
//! dequeue -> mark_running -> execute_scan --ok--> mark_completed
//!                                  |
//!                                  +--err, retries < max--> push_front(retries + 1)
//!                                  |
//!                                  +--err, budget spent---> mark_failed(reason)
//! ```
//!
//! 전이 중 예상치 못한 저장소 에러가 나면 해당 작업을 에러 메시지로 `failed` 처리하고
//! 다음 작업으로 넘어갑니다.

use std::collections::VecDeque;
use std::sync::Arc;

use metrics::counter;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use scanward_core::event::{JobEvent, JobEventKind};
use scanward_core::metrics as m;
use scanward_core::store::ScanJobStore;
use scanward_core::types::JobId;
use scanward_scan_executor::{ScanExecutor, ScanRequest};

use crate::events::EventSink;

/// 정지 시 남은 작업에 기록되는 실패 사유
const QUEUE_STOPPED_REASON: &str = "scan queue stopped";

/// 대기 중인 작업
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingJob {
    job_id: JobId,
    retries: u32,
}

impl PendingJob {
    fn new(job_id: JobId) -> Self {
        Self { job_id, retries: 0 }
    }
}

/// 스캔 큐 워커
pub(crate) struct Worker<S, E> {
    store: Arc<S>,
    executor: Arc<E>,
    max_retries: u32,
    events: EventSink,
}

impl<S, E> Worker<S, E>
where
    S: ScanJobStore,
    E: ScanExecutor,
{
    pub(crate) fn new(store: Arc<S>, executor: Arc<E>, max_retries: u32, events: EventSink) -> Self {
        Self {
            store,
            executor,
            max_retries,
            events,
        }
    }

    /// 취소될 때까지 작업을 하나씩 처리합니다.
    ///
    /// 취소는 작업 사이에서만 확인되므로 실행 중인 작업은 끝까지 진행됩니다.
    pub(crate) async fn run(
        self,
        mut job_rx: mpsc::UnboundedReceiver<JobId>,
        cancel: CancellationToken,
    ) {
        let mut pending: VecDeque<PendingJob> = VecDeque::new();
        info!(max_retries = self.max_retries, "scan queue worker started");

        loop {
            if cancel.is_cancelled() {
                break;
            }

            while let Ok(job_id) = job_rx.try_recv() {
                pending.push_back(PendingJob::new(job_id));
            }

            let next = match pending.pop_front() {
                Some(next) => next,
                None => tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    received = job_rx.recv() => match received {
                        Some(job_id) => PendingJob::new(job_id),
                        None => break,
                    },
                },
            };

            if let Some(retry) = self.process(next).await {
                pending.push_front(retry);
            }
        }

        job_rx.close();
        while let Ok(job_id) = job_rx.try_recv() {
            pending.push_back(PendingJob::new(job_id));
        }
        if !pending.is_empty() {
            warn!(count = pending.len(), "failing jobs left in queue at shutdown");
        }
        for job in pending {
            self.fail(job.job_id, QUEUE_STOPPED_REASON.to_owned()).await;
        }

        info!("scan queue worker stopped");
    }

    /// 작업을 한 번 실행합니다. 재시도가 필요하면 다음 대기 항목을 반환합니다.
    async fn process(&self, pending: PendingJob) -> Option<PendingJob> {
        let job = match self.store.mark_running(pending.job_id).await {
            Ok(job) => job,
            Err(e) => {
                warn!(job_id = %pending.job_id, error = %e, "failed to mark job running");
                self.fail(pending.job_id, e.to_string()).await;
                return None;
            }
        };

        debug!(job_id = %job.id, domain = %job.domain, attempt = job.attempts, "job running");
        self.events.emit(JobEvent::new(
            job.id,
            job.domain.clone(),
            JobEventKind::Running {
                attempt: job.attempts,
            },
        ));

        let request = ScanRequest {
            job_id: job.id,
            domain: job.domain.clone(),
            plan_tier: job.plan_tier,
        };

        match self.executor.execute_scan(&request).await {
            Ok(findings) => {
                let count = findings.len();
                match self.store.mark_completed(job.id, findings).await {
                    Ok(done) => {
                        counter!(m::SCAN_QUEUE_COMPLETED_TOTAL).increment(1);
                        info!(
                            job_id = %done.id,
                            domain = %done.domain,
                            findings = count,
                            attempts = done.attempts,
                            "scan job completed"
                        );
                        self.events.emit(JobEvent::new(
                            done.id,
                            done.domain,
                            JobEventKind::Completed { findings: count },
                        ));
                    }
                    Err(e) => {
                        warn!(job_id = %job.id, error = %e, "failed to mark job completed");
                        self.fail(job.id, e.to_string()).await;
                    }
                }
                None
            }
            Err(e) if e.is_retryable() && pending.retries < self.max_retries => {
                let reason = e.to_string();
                warn!(
                    job_id = %job.id,
                    domain = %job.domain,
                    attempt = job.attempts,
                    reason = %reason,
                    "scan failed, retrying at head of queue"
                );
                counter!(m::SCAN_QUEUE_RETRIES_TOTAL).increment(1);
                self.events.emit(JobEvent::new(
                    job.id,
                    job.domain,
                    JobEventKind::Retrying {
                        attempt: job.attempts,
                        reason,
                    },
                ));
                Some(PendingJob {
                    job_id: pending.job_id,
                    retries: pending.retries + 1,
                })
            }
            Err(e) => {
                self.fail(job.id, e.to_string()).await;
                None
            }
        }
    }

    /// 작업을 `failed`로 종료합니다. 기록에 실패하면 로그만 남깁니다.
    async fn fail(&self, job_id: JobId, reason: String) {
        match self.store.mark_failed(job_id, reason.clone()).await {
            Ok(job) => {
                counter!(m::SCAN_QUEUE_FAILED_TOTAL).increment(1);
                warn!(
                    job_id = %job.id,
                    domain = %job.domain,
                    attempts = job.attempts,
                    reason = %reason,
                    "scan job failed"
                );
                self.events.emit(JobEvent::new(
                    job.id,
                    job.domain,
                    JobEventKind::Failed { reason },
                ));
            }
            Err(e) => {
                error!(job_id = %job_id, reason = %reason, error = %e, "failed to record job failure");
            }
        }
    }
}
