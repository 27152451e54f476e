//! 저장소 인터페이스 — 검증 레코드, 스캔 작업, 계정 조회
//!
//! 영속 저장소는 외부 협력자이며 이 모듈의 trait을 통해서만 접근합니다.
//! [`MemoryStore`]는 세 trait을 모두 구현하는 인메모리 구현으로,
//! 테스트와 CLI에서 사용합니다.
//!
//! # 승인 원자성
//! [`ScanJobStore::admit_job`]은 도메인 중복 검사, 계정 활성 작업 수 검사,
//! 작업 생성을 하나의 원자적 연산으로 수행해야 합니다.
//! 같은 도메인에 대한 동시 요청 중 하나만 작업을 생성할 수 있습니다.

use std::collections::HashMap;
use std::future::Future;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::StorageError;
use crate::types::{
    Account, AccountId, Domain, JobId, JobStatus, NormalizedFinding, ScanJob, VerificationRecord,
    VerificationStatus,
};

/// 승인 요청 — 생성할 작업의 입력값
#[derive(Debug, Clone)]
pub struct NewScanJob {
    /// 소유 계정
    pub account_id: AccountId,
    /// 대상 도메인
    pub domain: Domain,
    /// 요금제 등급
    pub plan_tier: u32,
}

/// 원자적 승인 결과
#[derive(Debug, Clone)]
pub enum Admission {
    /// 작업이 `queued` 상태로 생성됨
    Created(ScanJob),
    /// 도메인에 이미 활성 작업이 있음
    DomainBusy(JobId),
    /// 계정의 활성 작업 수가 한도에 도달함
    RateLimited { active: usize },
}

/// 조건부 검증 레코드 기록 결과
#[derive(Debug, Clone)]
pub enum VerificationCommit {
    /// 레코드가 기록됨 (이전 레코드의 반대쪽 시각 병합 후)
    Stored(VerificationRecord),
    /// 기존 레코드가 `blocked` 상태
    Blocked,
    /// 다른 계정이 검증한 레코드라 기록하지 않음
    Owned { owner: AccountId },
}

/// 검증 레코드 저장소
pub trait VerificationStore: Send + Sync + 'static {
    /// 도메인의 검증 레코드를 조회합니다.
    fn find_verification(
        &self,
        domain: &Domain,
    ) -> impl Future<Output = Result<Option<VerificationRecord>, StorageError>> + Send;

    /// 검증 레코드를 생성하거나 덮어씁니다 (도메인 키 기준).
    ///
    /// 조건 없이 기록합니다. 운영자 작업(차단 등)용입니다.
    fn upsert_verification(
        &self,
        record: VerificationRecord,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// 검증 시도 결과를 조건부로 기록합니다.
    ///
    /// 기존 레코드 확인과 기록을 하나의 원자적 연산으로 수행합니다.
    /// - 기존 레코드가 `blocked`면 기록하지 않고 `Blocked`
    /// - 다른 계정의 `verified` 레코드가 [`VerificationRecord::yields_to`]를
    ///   만족하지 않으면 기록하지 않고 `Owned`
    /// - 그 외에는 기존 레코드의 반대쪽 시각을 유지하며 기록하고 `Stored`
    ///
    /// 실패한 시도(`failed`)는 다른 계정의 `verified` 레코드를 덮어쓰지 않습니다.
    fn commit_verification(
        &self,
        record: VerificationRecord,
    ) -> impl Future<Output = Result<VerificationCommit, StorageError>> + Send;
}

/// 스캔 작업 저장소
pub trait ScanJobStore: Send + Sync + 'static {
    /// 도메인 중복 검사, 계정 한도 검사, 작업 생성을 원자적으로 수행합니다.
    fn admit_job(
        &self,
        new_job: NewScanJob,
        max_active_per_account: usize,
    ) -> impl Future<Output = Result<Admission, StorageError>> + Send;

    /// 작업을 조회합니다.
    fn get_job(
        &self,
        id: JobId,
    ) -> impl Future<Output = Result<Option<ScanJob>, StorageError>> + Send;

    /// 작업을 `running`으로 전이하고 `started_at`, `attempts`를 갱신합니다.
    ///
    /// `queued` 또는 `running`(재시도)에서만 허용됩니다.
    fn mark_running(
        &self,
        id: JobId,
    ) -> impl Future<Output = Result<ScanJob, StorageError>> + Send;

    /// 작업을 `completed`로 전이하고 발견 항목을 첨부합니다.
    fn mark_completed(
        &self,
        id: JobId,
        findings: Vec<NormalizedFinding>,
    ) -> impl Future<Output = Result<ScanJob, StorageError>> + Send;

    /// 작업을 `failed`로 전이하고 사유를 기록합니다.
    fn mark_failed(
        &self,
        id: JobId,
        reason: String,
    ) -> impl Future<Output = Result<ScanJob, StorageError>> + Send;

    /// 도메인의 활성(queued/running) 작업을 조회합니다.
    fn active_job_for_domain(
        &self,
        domain: &Domain,
    ) -> impl Future<Output = Result<Option<ScanJob>, StorageError>> + Send;

    /// 계정의 활성(queued/running) 작업 수를 셉니다.
    fn count_active_for_account(
        &self,
        account_id: AccountId,
    ) -> impl Future<Output = Result<usize, StorageError>> + Send;
}

/// 계정 조회 (인증 계층)
pub trait AccountDirectory: Send + Sync + 'static {
    /// 계정을 조회합니다.
    fn find_account(
        &self,
        id: AccountId,
    ) -> impl Future<Output = Result<Option<Account>, StorageError>> + Send;
}

// ─── MemoryStore ─────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Tables {
    verifications: HashMap<Domain, VerificationRecord>,
    jobs: HashMap<JobId, ScanJob>,
    accounts: HashMap<AccountId, Account>,
}

impl Tables {
    fn job_mut(&mut self, id: JobId) -> Result<&mut ScanJob, StorageError> {
        self.jobs.get_mut(&id).ok_or_else(|| StorageError::NotFound {
            entity: "scan job",
            id: id.to_string(),
        })
    }
}

/// 인메모리 저장소
///
/// 단일 락으로 모든 테이블을 보호하므로 `admit_job`이 자연스럽게 원자적입니다.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// 빈 저장소를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 계정을 등록하거나 갱신합니다.
    pub async fn insert_account(&self, account: Account) {
        let mut tables = self.tables.lock().await;
        tables.accounts.insert(account.id, account);
    }

    /// 저장된 모든 작업을 생성 시각 순으로 반환합니다.
    pub async fn jobs(&self) -> Vec<ScanJob> {
        let tables = self.tables.lock().await;
        let mut jobs: Vec<ScanJob> = tables.jobs.values().cloned().collect();
        jobs.sort_by_key(|job| job.created_at);
        jobs
    }
}

fn transition_error(job: &ScanJob, to: JobStatus) -> StorageError {
    StorageError::InvalidTransition {
        id: job.id.to_string(),
        from: job.status.to_string(),
        to: to.to_string(),
    }
}

impl VerificationStore for MemoryStore {
    async fn find_verification(
        &self,
        domain: &Domain,
    ) -> Result<Option<VerificationRecord>, StorageError> {
        let tables = self.tables.lock().await;
        Ok(tables.verifications.get(domain).cloned())
    }

    async fn upsert_verification(&self, record: VerificationRecord) -> Result<(), StorageError> {
        let mut tables = self.tables.lock().await;
        tables.verifications.insert(record.domain.clone(), record);
        Ok(())
    }

    async fn commit_verification(
        &self,
        record: VerificationRecord,
    ) -> Result<VerificationCommit, StorageError> {
        let mut tables = self.tables.lock().await;

        let existing = tables.verifications.get(&record.domain).cloned();
        let record = match existing {
            Some(existing) if existing.status == VerificationStatus::Blocked => {
                return Ok(VerificationCommit::Blocked);
            }
            // 다른 계정의 실패한 시도는 소유자의 검증을 취소하지 못합니다.
            Some(existing)
                if !existing.yields_to(record.account_id, record.method, &record.token)
                    || (existing.is_verified_by_other(record.account_id)
                        && record.status != VerificationStatus::Verified) =>
            {
                return Ok(VerificationCommit::Owned {
                    owner: existing.account_id,
                });
            }
            Some(existing) => VerificationRecord {
                verified_at: record.verified_at.or(existing.verified_at),
                failed_at: record.failed_at.or(existing.failed_at),
                ..record
            },
            None => record,
        };

        tables
            .verifications
            .insert(record.domain.clone(), record.clone());
        Ok(VerificationCommit::Stored(record))
    }
}

impl ScanJobStore for MemoryStore {
    async fn admit_job(
        &self,
        new_job: NewScanJob,
        max_active_per_account: usize,
    ) -> Result<Admission, StorageError> {
        let mut tables = self.tables.lock().await;

        if let Some(busy) = tables
            .jobs
            .values()
            .find(|job| job.domain == new_job.domain && job.status.is_active())
        {
            return Ok(Admission::DomainBusy(busy.id));
        }

        let active = tables
            .jobs
            .values()
            .filter(|job| job.account_id == new_job.account_id && job.status.is_active())
            .count();
        if active >= max_active_per_account {
            return Ok(Admission::RateLimited { active });
        }

        let job = ScanJob {
            id: JobId::new(),
            domain: new_job.domain,
            plan_tier: new_job.plan_tier,
            status: JobStatus::Queued,
            account_id: new_job.account_id,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            failure_reason: None,
            findings: Vec::new(),
            attempts: 0,
        };
        tables.jobs.insert(job.id, job.clone());
        Ok(Admission::Created(job))
    }

    async fn get_job(&self, id: JobId) -> Result<Option<ScanJob>, StorageError> {
        let tables = self.tables.lock().await;
        Ok(tables.jobs.get(&id).cloned())
    }

    async fn mark_running(&self, id: JobId) -> Result<ScanJob, StorageError> {
        let mut tables = self.tables.lock().await;
        let job = tables.job_mut(id)?;
        if job.status.is_terminal() {
            return Err(transition_error(job, JobStatus::Running));
        }
        job.status = JobStatus::Running;
        job.started_at = Some(Utc::now());
        job.attempts += 1;
        Ok(job.clone())
    }

    async fn mark_completed(
        &self,
        id: JobId,
        findings: Vec<NormalizedFinding>,
    ) -> Result<ScanJob, StorageError> {
        let mut tables = self.tables.lock().await;
        let job = tables.job_mut(id)?;
        if job.status.is_terminal() {
            return Err(transition_error(job, JobStatus::Completed));
        }
        job.status = JobStatus::Completed;
        job.findings = findings;
        job.completed_at = Some(Utc::now());
        job.failure_reason = None;
        Ok(job.clone())
    }

    async fn mark_failed(&self, id: JobId, reason: String) -> Result<ScanJob, StorageError> {
        let mut tables = self.tables.lock().await;
        let job = tables.job_mut(id)?;
        if job.status.is_terminal() {
            return Err(transition_error(job, JobStatus::Failed));
        }
        job.status = JobStatus::Failed;
        job.failure_reason = Some(reason);
        job.completed_at = Some(Utc::now());
        Ok(job.clone())
    }

    async fn active_job_for_domain(
        &self,
        domain: &Domain,
    ) -> Result<Option<ScanJob>, StorageError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .jobs
            .values()
            .find(|job| &job.domain == domain && job.status.is_active())
            .cloned())
    }

    async fn count_active_for_account(&self, account_id: AccountId) -> Result<usize, StorageError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .jobs
            .values()
            .filter(|job| job.account_id == account_id && job.status.is_active())
            .count())
    }
}

impl AccountDirectory for MemoryStore {
    async fn find_account(&self, id: AccountId) -> Result<Option<Account>, StorageError> {
        let tables = self.tables.lock().await;
        Ok(tables.accounts.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VerificationMethod;
    use std::sync::Arc;

    fn domain(name: &str) -> Domain {
        Domain::parse(name).unwrap()
    }

    fn new_job(account: u64, name: &str) -> NewScanJob {
        NewScanJob {
            account_id: AccountId(account),
            domain: domain(name),
            plan_tier: 10,
        }
    }

    async fn admit(store: &MemoryStore, account: u64, name: &str) -> Admission {
        store.admit_job(new_job(account, name), 3).await.unwrap()
    }

    fn created(admission: Admission) -> ScanJob {
        match admission {
            Admission::Created(job) => job,
            other => panic!("expected Created, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn verification_upsert_overwrites_by_domain() {
        let store = MemoryStore::new();
        let mut record = VerificationRecord {
            domain: domain("example.com"),
            method: VerificationMethod::Dns,
            token: "first-token".to_owned(),
            status: VerificationStatus::Failed,
            account_id: AccountId(1),
            verified_at: None,
            failed_at: Some(Utc::now()),
        };
        store.upsert_verification(record.clone()).await.unwrap();

        record.status = VerificationStatus::Verified;
        record.account_id = AccountId(2);
        store.upsert_verification(record).await.unwrap();

        let found = store
            .find_verification(&domain("example.com"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.status, VerificationStatus::Verified);
        assert_eq!(found.account_id, AccountId(2));
        assert!(
            store
                .find_verification(&domain("other.com"))
                .await
                .unwrap()
                .is_none()
        );
    }

    fn attempt(
        account: u64,
        method: VerificationMethod,
        token: &str,
        status: VerificationStatus,
    ) -> VerificationRecord {
        let now = Utc::now();
        VerificationRecord {
            domain: domain("example.com"),
            method,
            token: token.to_owned(),
            status,
            account_id: AccountId(account),
            verified_at: (status == VerificationStatus::Verified).then_some(now),
            failed_at: (status == VerificationStatus::Failed).then_some(now),
        }
    }

    async fn stored(store: &MemoryStore) -> VerificationRecord {
        store
            .find_verification(&domain("example.com"))
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn commit_never_overwrites_blocked() {
        use VerificationMethod::*;
        use VerificationStatus::*;
        let store = MemoryStore::new();
        store
            .upsert_verification(attempt(9, Token, "operator", Blocked))
            .await
            .unwrap();

        let commit = store
            .commit_verification(attempt(1, Dns, "fresh-token", Verified))
            .await
            .unwrap();

        assert!(matches!(commit, VerificationCommit::Blocked));
        assert_eq!(stored(&store).await.status, VerificationStatus::Blocked);
    }

    #[tokio::test]
    async fn commit_keeps_opposite_timestamp() {
        use VerificationMethod::*;
        use VerificationStatus::*;
        let store = MemoryStore::new();
        store
            .commit_verification(attempt(1, Token, "token-1", Verified))
            .await
            .unwrap();
        let commit = store
            .commit_verification(attempt(1, Dns, "token-1", Failed))
            .await
            .unwrap();

        let VerificationCommit::Stored(record) = commit else {
            panic!("expected Stored, got {commit:?}");
        };
        assert!(record.verified_at.is_some());
        assert!(record.failed_at.is_some());
        assert_eq!(stored(&store).await, record);
    }

    #[tokio::test]
    async fn commit_guards_other_accounts_verified_record() {
        use VerificationMethod::*;
        use VerificationStatus::*;
        let store = MemoryStore::new();
        store
            .commit_verification(attempt(1, Dns, "owner-token", Verified))
            .await
            .unwrap();

        // 같은 토큰, token 방식, 실패한 시도는 모두 거부
        for candidate in [
            attempt(2, Dns, "owner-token", Verified),
            attempt(2, Token, "other-token", Verified),
            attempt(2, File, "other-token", Failed),
        ] {
            let commit = store.commit_verification(candidate).await.unwrap();
            assert!(matches!(commit, VerificationCommit::Owned { owner: AccountId(1) }));
        }
        assert_eq!(stored(&store).await.account_id, AccountId(1));

        // 새 토큰으로 증명에 성공하면 소유권이 넘어감
        let commit = store
            .commit_verification(attempt(2, Dns, "new-owner-token", Verified))
            .await
            .unwrap();
        assert!(matches!(commit, VerificationCommit::Stored(_)));
        let record = stored(&store).await;
        assert_eq!(record.account_id, AccountId(2));
        assert_eq!(record.token, "new-owner-token");
    }

    #[tokio::test]
    async fn admit_creates_queued_job() {
        let store = MemoryStore::new();
        let job = created(admit(&store, 1, "example.com").await);
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.attempts, 0);
        assert!(job.started_at.is_none());

        let stored = store.get_job(job.id).await.unwrap().unwrap();
        assert_eq!(stored, job);
    }

    #[tokio::test]
    async fn admit_rejects_busy_domain_across_accounts() {
        let store = MemoryStore::new();
        let first = created(admit(&store, 1, "example.com").await);

        match admit(&store, 2, "example.com").await {
            Admission::DomainBusy(id) => assert_eq!(id, first.id),
            other => panic!("expected DomainBusy, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn admit_rate_limits_per_account() {
        let store = MemoryStore::new();
        for name in ["a.com", "b.com", "c.com"] {
            created(admit(&store, 1, name).await);
        }
        assert!(matches!(
            admit(&store, 1, "d.com").await,
            Admission::RateLimited { active: 3 }
        ));
        // 다른 계정은 영향 없음
        created(admit(&store, 2, "d.com").await);
    }

    #[tokio::test]
    async fn terminal_jobs_free_the_domain() {
        let store = MemoryStore::new();
        let job = created(admit(&store, 1, "example.com").await);
        store.mark_running(job.id).await.unwrap();
        store.mark_failed(job.id, "exit 1".to_owned()).await.unwrap();

        assert!(
            store
                .active_job_for_domain(&domain("example.com"))
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(store.count_active_for_account(AccountId(1)).await.unwrap(), 0);
        created(admit(&store, 1, "example.com").await);
    }

    #[tokio::test]
    async fn mark_running_counts_attempts() {
        let store = MemoryStore::new();
        let job = created(admit(&store, 1, "example.com").await);

        let first = store.mark_running(job.id).await.unwrap();
        assert_eq!(first.status, JobStatus::Running);
        assert_eq!(first.attempts, 1);
        assert!(first.started_at.is_some());

        let second = store.mark_running(job.id).await.unwrap();
        assert_eq!(second.attempts, 2);
    }

    #[tokio::test]
    async fn terminal_states_are_never_reopened() {
        let store = MemoryStore::new();
        let job = created(admit(&store, 1, "example.com").await);
        store.mark_running(job.id).await.unwrap();
        let done = store.mark_completed(job.id, Vec::new()).await.unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert!(done.completed_at.is_some());

        assert!(matches!(
            store.mark_running(job.id).await,
            Err(StorageError::InvalidTransition { .. })
        ));
        assert!(matches!(
            store.mark_failed(job.id, "late".to_owned()).await,
            Err(StorageError::InvalidTransition { .. })
        ));
        let stored = store.get_job(job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn transitions_on_missing_job_fail() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.mark_running(JobId::new()).await,
            Err(StorageError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn accounts_are_looked_up_by_id() {
        let store = MemoryStore::new();
        store
            .insert_account(Account {
                id: AccountId(7),
                tos_accepted_at: Some(Utc::now()),
            })
            .await;
        assert!(
            store
                .find_account(AccountId(7))
                .await
                .unwrap()
                .unwrap()
                .has_accepted_tos()
        );
        assert!(store.find_account(AccountId(8)).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_admission_creates_one_job_per_domain() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for account in 0..16u64 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .admit_job(new_job(account, "race.example.com"), 3)
                    .await
                    .unwrap()
            }));
        }

        let mut created_count = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), Admission::Created(_)) {
                created_count += 1;
            }
        }
        assert_eq!(created_count, 1);
        assert_eq!(store.jobs().await.len(), 1);
    }
}
