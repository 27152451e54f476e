//! # scanward-core
//!
//! Scanward 공통 크레이트 — 모든 모듈이 공유하는 타입, trait, 에러, 설정을 정의합니다.
//!
//! - [`config`]: `scanward.toml` 로딩, 환경변수 오버라이드, 검증
//! - [`error`]: 최상위 [`ScanwardError`]와 도메인별 에러
//! - [`event`]: 작업 상태 전이 이벤트 [`JobEvent`]
//! - [`metrics`]: 메트릭 이름 상수
//! - [`pipeline`]: 장기 실행 컴포넌트 생명주기 [`Pipeline`]
//! - [`store`]: 저장소 trait과 인메모리 구현 [`MemoryStore`]
//! - [`types`]: 도메인 타입

pub mod config;
pub mod error;
pub mod event;
pub mod metrics;
pub mod pipeline;
pub mod store;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, PipelineError, ScanError, ScanwardError, StorageError, VerifyError};

// 설정
pub use config::ScanwardConfig;

// 이벤트
pub use event::{Event, EventMetadata, JobEvent, JobEventKind};

// 파이프라인 trait
pub use pipeline::{HealthStatus, Pipeline};

// 저장소
pub use store::{
    AccountDirectory, Admission, MemoryStore, NewScanJob, ScanJobStore, VerificationCommit,
    VerificationStore,
};

// 도메인 타입
pub use types::{
    Account, AccountId, Domain, JobId, JobStatus, NormalizedFinding, ScanJob, Severity,
    VerificationMethod, VerificationRecord, VerificationStatus,
};
