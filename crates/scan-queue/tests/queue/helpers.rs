//! Shared fixtures for scan queue integration tests.
//!
//! - [`Harness`]: in-memory store, account setup and a real `DomainVerifier`
//!   (token method, no network)
//! - [`ScriptedExecutor`]: per-domain scripted outcomes with call recording
//! - [`FlakyStore`]: store wrapper that fails the next `mark_running`
//! - [`collect_until_terminal`]: event collection with a deadline

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;

use scanward_core::error::StorageError;
use scanward_core::event::{JobEvent, JobEventKind};
use scanward_core::store::{AccountDirectory, Admission, MemoryStore, NewScanJob, ScanJobStore};
use scanward_core::types::{
    Account, AccountId, Domain, JobId, NormalizedFinding, ScanJob, VerificationMethod,
};
use scanward_scan_executor::{ExecutorError, ScanExecutor, ScanRequest, normalize_record};
use scanward_scan_queue::{ScanQueue, ScanQueueBuilder, ScanQueueConfig};
use scanward_verifier::{
    ChallengeResponse, ChallengeTransport, DomainVerifier, VerifierConfig, VerifierError,
};

/// Transport with no reachable network; only the token method can succeed.
pub struct OfflineTransport;

impl ChallengeTransport for OfflineTransport {
    async fn lookup_txt(&self, name: &str) -> Result<Vec<Vec<String>>, VerifierError> {
        Err(VerifierError::Transport(format!("offline: {name}")))
    }

    async fn fetch_challenge(&self, url: &str) -> Result<ChallengeResponse, VerifierError> {
        Err(VerifierError::Transport(format!("offline: {url}")))
    }
}

pub type Gate = DomainVerifier<MemoryStore, OfflineTransport>;

/// In-memory store plus verifier.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub verifier: Arc<Gate>,
}

#[allow(dead_code)]
impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let verifier = DomainVerifier::new(
            Arc::clone(&store),
            OfflineTransport,
            VerifierConfig::default(),
        )
        .expect("valid verifier config");
        Self {
            store,
            verifier: Arc::new(verifier),
        }
    }

    /// Registers an account, optionally with TOS accepted.
    pub async fn account(&self, id: u64, tos_accepted: bool) -> AccountId {
        let account_id = AccountId(id);
        self.store
            .insert_account(Account {
                id: account_id,
                tos_accepted_at: tos_accepted.then(Utc::now),
            })
            .await;
        account_id
    }

    /// Verifies `domain` for `account` via the token method.
    pub async fn verify(&self, account: AccountId, domain: &str) {
        self.verifier
            .request_or_verify(account, domain, VerificationMethod::Token, "manual-token")
            .await
            .expect("token verification succeeds");
    }

    /// Registers a TOS-accepted account owning all `domains`.
    pub async fn owner_of(&self, id: u64, domains: &[&str]) -> AccountId {
        let account = self.account(id, true).await;
        for domain in domains {
            self.verify(account, domain).await;
        }
        account
    }

    pub fn queue<E: ScanExecutor>(
        &self,
        executor: E,
    ) -> (
        ScanQueue<MemoryStore, Gate, E>,
        mpsc::Receiver<JobEvent>,
    ) {
        self.queue_with_config(executor, ScanQueueConfig::default())
    }

    pub fn queue_with_config<E: ScanExecutor>(
        &self,
        executor: E,
        config: ScanQueueConfig,
    ) -> (
        ScanQueue<MemoryStore, Gate, E>,
        mpsc::Receiver<JobEvent>,
    ) {
        let (queue, events) = ScanQueueBuilder::new(
            Arc::clone(&self.store),
            Arc::clone(&self.verifier),
            executor,
        )
        .config(config)
        .build()
        .expect("valid queue config");
        (queue, events.expect("builder creates the event channel"))
    }

    pub async fn job(&self, id: JobId) -> ScanJob {
        self.store
            .get_job(id)
            .await
            .expect("store ok")
            .expect("job exists")
    }
}

/// One scripted executor outcome.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Succeed with findings carrying these template ids.
    Succeed(Vec<&'static str>),
    /// Fail with this scanner exit code.
    Fail(i32),
}

#[derive(Default)]
struct ScriptState {
    outcomes: HashMap<String, VecDeque<Outcome>>,
    calls: Vec<String>,
}

/// Executor that replays per-domain outcomes and records every call.
///
/// Domains without a script succeed with a single finding.
#[derive(Clone, Default)]
pub struct ScriptedExecutor {
    state: Arc<Mutex<ScriptState>>,
    delay: Option<Duration>,
}

#[allow(dead_code)]
impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn script(self, domain: &str, outcomes: Vec<Outcome>) -> Self {
        self.state
            .lock()
            .expect("script lock")
            .outcomes
            .insert(domain.to_owned(), outcomes.into());
        self
    }

    /// Domains passed to `execute_scan`, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().expect("script lock").calls.clone()
    }

    fn next_outcome(&self, domain: &Domain) -> Outcome {
        let mut state = self.state.lock().expect("script lock");
        state.calls.push(domain.to_string());
        state
            .outcomes
            .get_mut(domain.as_str())
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Outcome::Succeed(vec!["default-finding"]))
    }
}

pub fn finding(template_id: &str, domain: &Domain) -> NormalizedFinding {
    normalize_record(
        &serde_json::json!({
            "template-id": template_id,
            "info": {"name": template_id, "severity": "medium"}
        }),
        domain,
    )
}

impl ScanExecutor for ScriptedExecutor {
    async fn execute_scan(
        &self,
        request: &ScanRequest,
    ) -> Result<Vec<NormalizedFinding>, ExecutorError> {
        let outcome = self.next_outcome(&request.domain);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match outcome {
            Outcome::Succeed(ids) => Ok(ids
                .into_iter()
                .map(|id| finding(id, &request.domain))
                .collect()),
            Outcome::Fail(code) => Err(ExecutorError::ScannerExit { code }),
        }
    }
}

/// Store wrapper whose next `mark_running` fails with a backend error.
pub struct FlakyStore {
    pub inner: Arc<MemoryStore>,
    fail_next_mark_running: AtomicBool,
}

#[allow(dead_code)]
impl FlakyStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            fail_next_mark_running: AtomicBool::new(true),
        }
    }
}

impl ScanJobStore for FlakyStore {
    async fn admit_job(
        &self,
        new_job: NewScanJob,
        max_active_per_account: usize,
    ) -> Result<Admission, StorageError> {
        self.inner.admit_job(new_job, max_active_per_account).await
    }

    async fn get_job(&self, id: JobId) -> Result<Option<ScanJob>, StorageError> {
        self.inner.get_job(id).await
    }

    async fn mark_running(&self, id: JobId) -> Result<ScanJob, StorageError> {
        if self.fail_next_mark_running.swap(false, Ordering::SeqCst) {
            return Err(StorageError::Backend("connection reset".to_owned()));
        }
        self.inner.mark_running(id).await
    }

    async fn mark_completed(
        &self,
        id: JobId,
        findings: Vec<NormalizedFinding>,
    ) -> Result<ScanJob, StorageError> {
        self.inner.mark_completed(id, findings).await
    }

    async fn mark_failed(&self, id: JobId, reason: String) -> Result<ScanJob, StorageError> {
        self.inner.mark_failed(id, reason).await
    }

    async fn active_job_for_domain(
        &self,
        domain: &Domain,
    ) -> Result<Option<ScanJob>, StorageError> {
        self.inner.active_job_for_domain(domain).await
    }

    async fn count_active_for_account(&self, account_id: AccountId) -> Result<usize, StorageError> {
        self.inner.count_active_for_account(account_id).await
    }
}

impl AccountDirectory for FlakyStore {
    async fn find_account(&self, id: AccountId) -> Result<Option<Account>, StorageError> {
        self.inner.find_account(id).await
    }
}

/// Collects the event kinds of `job_id` until its terminal event.
///
/// Panics if the terminal event does not arrive within five seconds.
pub async fn collect_until_terminal(
    events: &mut mpsc::Receiver<JobEvent>,
    job_id: JobId,
) -> Vec<JobEventKind> {
    let mut kinds = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(event) = events.recv().await {
            if event.job_id != job_id {
                continue;
            }
            let terminal = event.is_terminal();
            kinds.push(event.kind);
            if terminal {
                return;
            }
        }
        panic!("event channel closed before terminal event");
    })
    .await
    .expect("terminal event within deadline");
    kinds
}

/// Waits until `job_id` reports `Running`.
#[allow(dead_code)]
pub async fn wait_running(events: &mut mpsc::Receiver<JobEvent>, job_id: JobId) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(event) = events.recv().await {
            if event.job_id == job_id && matches!(event.kind, JobEventKind::Running { .. }) {
                return;
            }
        }
        panic!("event channel closed before running event");
    })
    .await
    .expect("running event within deadline");
}
