//! 스캔 큐 오케스트레이터
//!
//! [`ScanQueue`]는 core의 [`Pipeline`] trait을 구현하여 워커 태스크의 생명주기를 관리합니다.
//! 요청 승인은 [`ScanService`] 핸들이 담당하며, 승인된 작업 ID는 unbounded 채널로
//! 워커에 전달됩니다.
//!
//! # 재시작 제한
//!
//! `stop()` 후 다시 시작하려면 [`ScanQueueBuilder`]로 새 인스턴스를 만들어야 합니다.
//! 정지된 큐에 들어온 요청은 `QueueClosed`로 거부됩니다.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use scanward_core::error::{PipelineError, ScanwardError};
use scanward_core::event::JobEvent;
use scanward_core::pipeline::{HealthStatus, Pipeline};
use scanward_core::store::{AccountDirectory, ScanJobStore};
use scanward_core::types::JobId;
use scanward_scan_executor::ScanExecutor;
use scanward_verifier::VerificationGate;

use crate::config::ScanQueueConfig;
use crate::error::ScanQueueError;
use crate::events::EventSink;
use crate::service::ScanService;
use crate::worker::Worker;

/// 큐 실행 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueueState {
    Initialized,
    Running,
    Stopped,
}

/// 스캔 작업 큐
pub struct ScanQueue<S, G, E> {
    state: QueueState,
    service: ScanService<S, G>,
    /// `start()`에서 워커 태스크로 옮겨짐
    worker: Option<(Worker<S, E>, mpsc::UnboundedReceiver<JobId>)>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl<S, G, E> ScanQueue<S, G, E>
where
    S: ScanJobStore + AccountDirectory,
    G: VerificationGate,
    E: ScanExecutor,
{
    /// 요청 승인 핸들을 반환합니다.
    pub fn service(&self) -> ScanService<S, G> {
        self.service.clone()
    }

    /// 현재 상태명을 반환합니다.
    pub fn state_name(&self) -> &'static str {
        match self.state {
            QueueState::Initialized => "initialized",
            QueueState::Running => "running",
            QueueState::Stopped => "stopped",
        }
    }
}

impl<S, G, E> Pipeline for ScanQueue<S, G, E>
where
    S: ScanJobStore + AccountDirectory,
    G: VerificationGate,
    E: ScanExecutor,
{
    async fn start(&mut self) -> Result<(), ScanwardError> {
        if self.state == QueueState::Running {
            return Err(PipelineError::AlreadyRunning.into());
        }

        let (worker, job_rx) = self.worker.take().ok_or_else(|| {
            PipelineError::InitFailed("scan queue cannot be restarted after stop".to_owned())
        })?;

        let cancel = self.cancel.clone();
        self.task = Some(tokio::spawn(worker.run(job_rx, cancel)));
        self.state = QueueState::Running;
        info!("scan queue started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), ScanwardError> {
        if self.state != QueueState::Running {
            return Err(PipelineError::NotRunning.into());
        }

        info!("stopping scan queue, waiting for in-flight job");
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "scan queue worker task ended abnormally");
            }
        }

        self.state = QueueState::Stopped;
        info!("scan queue stopped");
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            QueueState::Running => match &self.task {
                Some(task) if task.is_finished() => {
                    HealthStatus::Unhealthy("worker task exited".to_owned())
                }
                _ => HealthStatus::Healthy,
            },
            QueueState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            QueueState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

/// 스캔 큐 빌더
///
/// 저장소, 검증 게이트, 실행기를 받아 큐와 이벤트 채널을 구성합니다.
pub struct ScanQueueBuilder<S, G, E> {
    store: Arc<S>,
    gate: Arc<G>,
    executor: E,
    config: ScanQueueConfig,
    event_tx: Option<mpsc::Sender<JobEvent>>,
}

impl<S, G, E> ScanQueueBuilder<S, G, E>
where
    S: ScanJobStore + AccountDirectory,
    G: VerificationGate,
    E: ScanExecutor,
{
    /// 새 빌더를 생성합니다.
    pub fn new(store: Arc<S>, gate: Arc<G>, executor: E) -> Self {
        Self {
            store,
            gate,
            executor,
            config: ScanQueueConfig::default(),
            event_tx: None,
        }
    }

    /// 큐 설정을 지정합니다.
    pub fn config(mut self, config: ScanQueueConfig) -> Self {
        self.config = config;
        self
    }

    /// 외부 이벤트 전송 채널을 설정합니다.
    ///
    /// 설정하지 않으면 빌더가 `event_channel_capacity` 크기의 새 채널을 생성합니다.
    pub fn event_sender(mut self, tx: mpsc::Sender<JobEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// 큐를 빌드합니다.
    ///
    /// # Returns
    ///
    /// - `ScanQueue`: 큐 인스턴스
    /// - `Option<mpsc::Receiver<JobEvent>>`: 작업 이벤트 수신 채널
    ///   (외부 event_sender를 설정한 경우 None)
    pub fn build(
        self,
    ) -> Result<(ScanQueue<S, G, E>, Option<mpsc::Receiver<JobEvent>>), ScanQueueError> {
        self.config.validate()?;

        let (event_tx, event_rx) = match self.event_tx {
            Some(tx) => (tx, None),
            None => {
                let (tx, rx) = mpsc::channel(self.config.event_channel_capacity);
                (tx, Some(rx))
            }
        };
        let events = EventSink::new(event_tx);

        let (job_tx, job_rx) = mpsc::unbounded_channel();
        let worker = Worker::new(
            Arc::clone(&self.store),
            Arc::new(self.executor),
            self.config.max_retries,
            events.clone(),
        );
        let service = ScanService::new(
            self.store,
            self.gate,
            Arc::new(self.config),
            job_tx,
            events,
        );

        let queue = ScanQueue {
            state: QueueState::Initialized,
            service,
            worker: Some((worker, job_rx)),
            cancel: CancellationToken::new(),
            task: None,
        };

        Ok((queue, event_rx))
    }
}
