//! 스캔 요청 승인
//!
//! [`ScanService`]는 `start_scan` 요청을 다음 순서로 검사합니다.
//!
//! 1. 플랜 티어가 설정된 티어 중 하나인지
//! 2. 계정이 존재하고 이용약관에 동의했는지
//! 3. 요청 계정이 도메인의 검증된 소유자인지
//! 4. 도메인에 활성 작업이 없는지, 계정 한도 안인지, 작업 생성 (저장소에서 원자적으로)
//!
//! 생성된 작업 ID는 워커 채널로 전달됩니다.

use std::sync::Arc;

use metrics::counter;
use tokio::sync::mpsc;
use tracing::{info, warn};

use scanward_core::event::{JobEvent, JobEventKind};
use scanward_core::metrics as m;
use scanward_core::store::{AccountDirectory, Admission, NewScanJob, ScanJobStore};
use scanward_core::types::{AccountId, Domain, JobId, ScanJob};
use scanward_verifier::VerificationGate;

use crate::config::ScanQueueConfig;
use crate::error::ScanQueueError;
use crate::events::EventSink;

/// 큐가 닫혔을 때 새 작업에 기록되는 실패 사유
const QUEUE_CLOSED_REASON: &str = "scan queue closed";

/// 스캔 요청 승인 핸들
///
/// 복제 비용이 낮으며 여러 요청 처리 태스크에서 공유할 수 있습니다.
pub struct ScanService<S, G> {
    store: Arc<S>,
    gate: Arc<G>,
    config: Arc<ScanQueueConfig>,
    job_tx: mpsc::UnboundedSender<JobId>,
    events: EventSink,
}

impl<S, G> Clone for ScanService<S, G> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            gate: Arc::clone(&self.gate),
            config: Arc::clone(&self.config),
            job_tx: self.job_tx.clone(),
            events: self.events.clone(),
        }
    }
}

impl<S, G> ScanService<S, G>
where
    S: ScanJobStore + AccountDirectory,
    G: VerificationGate,
{
    pub(crate) fn new(
        store: Arc<S>,
        gate: Arc<G>,
        config: Arc<ScanQueueConfig>,
        job_tx: mpsc::UnboundedSender<JobId>,
        events: EventSink,
    ) -> Self {
        Self {
            store,
            gate,
            config,
            job_tx,
            events,
        }
    }

    /// 스캔을 요청합니다.
    ///
    /// 승인되면 `queued` 상태의 작업을 반환합니다.
    pub async fn start_scan(
        &self,
        account_id: AccountId,
        domain: &str,
        plan_tier: u32,
    ) -> Result<ScanJob, ScanQueueError> {
        match self.admit(account_id, domain, plan_tier).await {
            Ok(job) => Ok(job),
            Err(e) => {
                warn!(
                    account_id = %account_id,
                    domain,
                    plan_tier,
                    error = %e,
                    "scan request rejected"
                );
                counter!(m::SCAN_QUEUE_REJECTED_TOTAL, m::LABEL_REASON => e.reason_label())
                    .increment(1);
                Err(e)
            }
        }
    }

    /// 작업을 조회합니다.
    pub async fn job(&self, job_id: JobId) -> Result<Option<ScanJob>, ScanQueueError> {
        Ok(self.store.get_job(job_id).await?)
    }

    /// 큐 설정
    pub fn config(&self) -> &ScanQueueConfig {
        &self.config
    }

    async fn admit(
        &self,
        account_id: AccountId,
        domain: &str,
        plan_tier: u32,
    ) -> Result<ScanJob, ScanQueueError> {
        if !self.config.is_allowed_tier(plan_tier) {
            return Err(ScanQueueError::InvalidPlanTier {
                tier: plan_tier,
                allowed: self.config.plan_tiers.clone(),
            });
        }

        let domain = Domain::parse(domain).map_err(|reason| ScanQueueError::InvalidDomain {
            domain: domain.to_owned(),
            reason,
        })?;

        let account = self
            .store
            .find_account(account_id)
            .await?
            .ok_or(ScanQueueError::Unauthenticated(account_id))?;
        if !account.has_accepted_tos() {
            return Err(ScanQueueError::TosNotAccepted(account_id));
        }

        self.gate.ensure_verified(account_id, &domain).await?;

        let new_job = NewScanJob {
            account_id,
            domain: domain.clone(),
            plan_tier,
        };
        let limit = self.config.max_active_per_account;
        let job = match self.store.admit_job(new_job, limit).await? {
            Admission::Created(job) => job,
            Admission::DomainBusy(job_id) => {
                return Err(ScanQueueError::DomainBusy {
                    domain: domain.to_string(),
                    job_id,
                });
            }
            Admission::RateLimited { active } => {
                return Err(ScanQueueError::RateLimited {
                    account_id,
                    active,
                    limit,
                });
            }
        };

        self.events.emit(JobEvent::new(
            job.id,
            domain.clone(),
            JobEventKind::Queued,
        ));

        if self.job_tx.send(job.id).is_err() {
            // 워커가 없으므로 작업이 도메인을 점유하지 않도록 바로 종료시킵니다.
            match self
                .store
                .mark_failed(job.id, QUEUE_CLOSED_REASON.to_owned())
                .await
            {
                Ok(_) => self.events.emit(JobEvent::new(
                    job.id,
                    domain,
                    JobEventKind::Failed {
                        reason: QUEUE_CLOSED_REASON.to_owned(),
                    },
                )),
                Err(e) => warn!(job_id = %job.id, error = %e, "failed to close orphaned job"),
            }
            return Err(ScanQueueError::QueueClosed);
        }

        counter!(m::SCAN_QUEUE_ADMITTED_TOTAL).increment(1);
        info!(
            job_id = %job.id,
            account_id = %account_id,
            domain = %domain,
            plan_tier,
            "scan job queued"
        );

        Ok(job)
    }
}
