//! 스캔 큐 에러 타입
//!
//! [`ScanQueueError`]는 `start_scan` 승인 단계에서 요청자에게 반환되는 거부 사유와
//! 큐 자체의 장애를 표현합니다. 각 변형은 [`status_code`](ScanQueueError::status_code)로
//! HTTP 상태 코드에 대응됩니다.
//!
//! # 에러 카테고리
//!
//! - 입력 검증 (400): `InvalidPlanTier`, `InvalidDomain`
//! - 자격 (401/403): `Unauthenticated`, `TosNotAccepted`, `Verification`
//! - 경합 (409/429): `DomainBusy`, `RateLimited`
//! - 내부 (500/503): `Storage`, `Config`, `QueueClosed`

use scanward_core::error::{ConfigError, ScanError, ScanwardError, StorageError};
use scanward_core::types::{AccountId, JobId};
use scanward_verifier::VerifierError;

/// 스캔 큐 에러
#[derive(Debug, thiserror::Error)]
pub enum ScanQueueError {
    /// 허용되지 않은 플랜 티어
    #[error("invalid plan tier {tier}, allowed: {allowed:?}")]
    InvalidPlanTier {
        /// 요청된 티어
        tier: u32,
        /// 허용 티어 목록
        allowed: Vec<u32>,
    },

    /// 잘못된 도메인 형식
    #[error("invalid domain '{domain}': {reason}")]
    InvalidDomain {
        /// 입력된 도메인
        domain: String,
        /// 거부 사유
        reason: String,
    },

    /// 알 수 없는 계정
    #[error("unauthenticated account: {0}")]
    Unauthenticated(AccountId),

    /// 이용약관 미동의
    #[error("terms of service not accepted by account {0}")]
    TosNotAccepted(AccountId),

    /// 도메인 검증 거부 (미검증, 차단)
    #[error(transparent)]
    Verification(#[from] VerifierError),

    /// 도메인에 이미 활성 작업이 있음
    #[error("domain {domain} already has an active scan job {job_id}")]
    DomainBusy {
        /// 대상 도메인
        domain: String,
        /// 활성 작업 ID
        job_id: JobId,
    },

    /// 계정의 활성 작업 수 한도 초과
    #[error("account {account_id} has {active} active scan jobs (limit {limit})")]
    RateLimited {
        /// 계정 ID
        account_id: AccountId,
        /// 현재 활성 작업 수
        active: usize,
        /// 한도
        limit: usize,
    },

    /// 워커가 정지되어 작업을 받을 수 없음
    #[error("scan queue closed")]
    QueueClosed,

    /// 저장소 에러
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl ScanQueueError {
    /// 요청자에게 반환할 HTTP 상태 코드
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidPlanTier { .. } | Self::InvalidDomain { .. } => 400,
            Self::Unauthenticated(_) => 401,
            Self::TosNotAccepted(_) => 403,
            Self::Verification(e) => e.status_code(),
            Self::DomainBusy { .. } => 409,
            Self::RateLimited { .. } => 429,
            Self::QueueClosed => 503,
            Self::Storage(_) | Self::Config { .. } => 500,
        }
    }

    /// 거부 메트릭 레이블 값
    pub(crate) fn reason_label(&self) -> &'static str {
        match self {
            Self::InvalidPlanTier { .. } => "invalid_tier",
            Self::InvalidDomain { .. } => "invalid_domain",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::TosNotAccepted(_) => "tos",
            Self::Verification(VerifierError::Blocked { .. }) => "blocked",
            Self::Verification(_) => "not_verified",
            Self::DomainBusy { .. } => "domain_busy",
            Self::RateLimited { .. } => "rate_limited",
            Self::QueueClosed => "queue_closed",
            Self::Storage(_) | Self::Config { .. } => "internal",
        }
    }
}

impl From<ScanQueueError> for ScanwardError {
    fn from(err: ScanQueueError) -> Self {
        match err {
            ScanQueueError::Verification(e) => e.into(),
            ScanQueueError::QueueClosed => ScanwardError::Scan(ScanError::QueueClosed),
            ScanQueueError::Storage(e) => ScanwardError::Storage(e),
            ScanQueueError::Config { field, reason } => {
                ScanwardError::Config(ConfigError::InvalidValue { field, reason })
            }
            other => ScanwardError::Scan(ScanError::Rejected(other.to_string())),
        }
    }
}
