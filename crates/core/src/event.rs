//! 이벤트 시스템 — 작업 상태 전이 알림
//!
//! 스캔 큐는 작업의 모든 상태 전이마다 [`JobEvent`]를 발행합니다.
//! [`EventMetadata`]는 모든 이벤트에 공통으로 포함되는 메타데이터이며,
//! [`Event`] trait은 모든 이벤트 타입이 구현해야 하는 인터페이스입니다.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Domain, JobId};

// --- 모듈명 상수 ---

/// 도메인 검증 모듈명
pub const MODULE_VERIFIER: &str = "verifier";
/// 스캔 큐 모듈명
pub const MODULE_SCAN_QUEUE: &str = "scan-queue";
/// 스캔 실행기 모듈명
pub const MODULE_SCAN_EXECUTOR: &str = "scan-executor";

// --- 이벤트 타입 상수 ---

/// 작업 이벤트 타입
pub const EVENT_TYPE_JOB: &str = "job";

/// 이벤트 메타데이터 — 모든 이벤트에 공통으로 포함되는 추적 정보
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// 이벤트 발생 시각
    pub timestamp: DateTime<Utc>,
    /// 이벤트를 생성한 모듈명
    pub source_module: String,
    /// 추적 ID — 같은 작업의 이벤트를 연결합니다
    pub trace_id: String,
}

impl EventMetadata {
    /// 기존 trace_id를 사용하여 새 메타데이터를 생성합니다.
    pub fn new(source_module: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            source_module: source_module.into(),
            trace_id: trace_id.into(),
        }
    }

    /// 새로운 UUID v4 trace_id를 생성하여 메타데이터를 만듭니다.
    pub fn with_new_trace(source_module: impl Into<String>) -> Self {
        Self::new(source_module, uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for EventMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] source={} trace={}",
            self.timestamp.to_rfc3339(),
            self.source_module,
            self.trace_id,
        )
    }
}

/// 모든 이벤트가 구현해야 하는 기본 trait
///
/// `Send + Sync + 'static` 바운드로 `tokio::mpsc` 채널을 통한
/// 안전한 전송을 보장합니다.
pub trait Event: Send + Sync + 'static {
    /// 이벤트 고유 ID (UUID v4)
    fn event_id(&self) -> &str;

    /// 이벤트 메타데이터
    fn metadata(&self) -> &EventMetadata;

    /// 이벤트 타입명 (로깅 및 라우팅에 사용)
    fn event_type(&self) -> &str;
}

/// 작업 상태 전이 종류
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobEventKind {
    /// 작업이 생성되어 대기열에 들어감
    Queued,
    /// 실행 시작 (1부터 시작하는 시도 번호)
    Running { attempt: u32 },
    /// 실행 실패 후 재시도 예약
    Retrying { attempt: u32, reason: String },
    /// 완료
    Completed { findings: usize },
    /// 실패 (종료)
    Failed { reason: String },
}

impl fmt::Display for JobEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Running { attempt } => write!(f, "running (attempt {attempt})"),
            Self::Retrying { attempt, reason } => {
                write!(f, "retrying after attempt {attempt}: {reason}")
            }
            Self::Completed { findings } => write!(f, "completed ({findings} findings)"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// 스캔 작업 이벤트
///
/// trace_id는 작업 ID이므로 같은 작업의 이벤트를 한 흐름으로 묶을 수 있습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEvent {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
    /// 대상 작업
    pub job_id: JobId,
    /// 대상 도메인
    pub domain: Domain,
    /// 전이 종류
    pub kind: JobEventKind,
}

impl JobEvent {
    /// 작업 이벤트를 생성합니다.
    pub fn new(job_id: JobId, domain: Domain, kind: JobEventKind) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::new(MODULE_SCAN_QUEUE, job_id.to_string()),
            job_id,
            domain,
            kind,
        }
    }

    /// 종료 상태 이벤트인지 반환합니다.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            JobEventKind::Completed { .. } | JobEventKind::Failed { .. }
        )
    }
}

impl Event for JobEvent {
    fn event_id(&self) -> &str {
        &self.id
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn event_type(&self) -> &str {
        EVENT_TYPE_JOB
    }
}

impl fmt::Display for JobEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job {} ({}) {}", self.job_id, self.domain, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain() -> Domain {
        Domain::parse("example.com").unwrap()
    }

    #[test]
    fn job_event_uses_job_id_as_trace() {
        let job_id = JobId::new();
        let event = JobEvent::new(job_id, domain(), JobEventKind::Queued);
        assert_eq!(event.metadata().trace_id, job_id.to_string());
        assert_eq!(event.metadata().source_module, MODULE_SCAN_QUEUE);
        assert_eq!(event.event_type(), EVENT_TYPE_JOB);
        assert!(!event.event_id().is_empty());
    }

    #[test]
    fn terminal_events() {
        let job_id = JobId::new();
        assert!(!JobEvent::new(job_id, domain(), JobEventKind::Queued).is_terminal());
        assert!(
            !JobEvent::new(job_id, domain(), JobEventKind::Running { attempt: 1 }).is_terminal()
        );
        assert!(
            JobEvent::new(job_id, domain(), JobEventKind::Completed { findings: 2 }).is_terminal()
        );
        assert!(
            JobEvent::new(
                job_id,
                domain(),
                JobEventKind::Failed {
                    reason: "exit 1".to_owned()
                }
            )
            .is_terminal()
        );
    }

    #[test]
    fn kind_display() {
        let kind = JobEventKind::Retrying {
            attempt: 1,
            reason: "scanner exited with code 2".to_owned(),
        };
        assert_eq!(
            kind.to_string(),
            "retrying after attempt 1: scanner exited with code 2"
        );
    }

    #[test]
    fn kind_serializes_tagged() {
        let json = serde_json::to_value(JobEventKind::Running { attempt: 2 }).unwrap();
        assert_eq!(json["kind"], "running");
        assert_eq!(json["attempt"], 2);
    }

    #[test]
    fn metadata_with_new_trace_generates_unique_ids() {
        let a = EventMetadata::with_new_trace(MODULE_VERIFIER);
        let b = EventMetadata::with_new_trace(MODULE_VERIFIER);
        assert_ne!(a.trace_id, b.trace_id);
    }
}
