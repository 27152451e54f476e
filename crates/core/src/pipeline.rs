//! 파이프라인 trait — 장기 실행 컴포넌트의 생명주기 정의
//!
//! 백그라운드 태스크를 소유하는 컴포넌트(스캔 큐 워커 등)는 [`Pipeline`]을 구현합니다.
//!
//! # 생명주기
//! ```text
//! build() → start() → Running → stop() → Stopped
//! ```

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::ScanwardError;

/// 컴포넌트 건강 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// 정상
    Healthy,
    /// 동작하지만 성능 저하 또는 부분 장애
    Degraded(String),
    /// 동작 불가
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 상태인지 반환합니다.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded(reason) => write!(f, "degraded: {reason}"),
            Self::Unhealthy(reason) => write!(f, "unhealthy: {reason}"),
        }
    }
}

/// 장기 실행 컴포넌트 trait
///
/// `start()`는 백그라운드 태스크를 spawn하고 즉시 반환합니다.
/// `stop()`은 진행 중인 작업이 끝날 때까지 기다린 뒤 태스크를 정리합니다.
pub trait Pipeline: Send + Sync {
    /// 컴포넌트를 시작합니다.
    ///
    /// 이미 실행 중이면 `PipelineError::AlreadyRunning`을 반환합니다.
    fn start(&mut self) -> impl Future<Output = Result<(), ScanwardError>> + Send;

    /// 컴포넌트를 정지합니다 (graceful shutdown).
    ///
    /// 실행 중이 아니면 `PipelineError::NotRunning`을 반환합니다.
    fn stop(&mut self) -> impl Future<Output = Result<(), ScanwardError>> + Send;

    /// 건강 상태를 확인합니다.
    fn health_check(&self) -> impl Future<Output = HealthStatus> + Send;
}
