//! 도메인 검증 에러 타입
//!
//! [`VerifierError`]는 검증 상태 머신에서 발생하는 모든 에러를 표현합니다.
//! `From<VerifierError> for ScanwardError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use scanward_core::error::{ConfigError, ScanwardError, StorageError, VerifyError};

/// 도메인 검증 에러
#[derive(Debug, thiserror::Error)]
pub enum VerifierError {
    /// 운영자에 의해 차단된 도메인
    #[error("domain verification blocked: {domain}")]
    Blocked {
        /// 대상 도메인
        domain: String,
    },

    /// 소유권 증명 실패 (레코드는 `failed`로 기록됨)
    #[error("verification failed for {domain} via {method}")]
    VerificationFailed {
        /// 대상 도메인
        domain: String,
        /// 시도한 증명 방식
        method: String,
    },

    /// 요청 계정에 대해 검증되지 않은 도메인
    #[error("domain not verified: {domain}")]
    NotVerified {
        /// 대상 도메인
        domain: String,
    },

    /// 잘못된 도메인 형식
    #[error("invalid domain '{domain}': {reason}")]
    InvalidDomain {
        /// 입력된 도메인
        domain: String,
        /// 거부 사유
        reason: String,
    },

    /// 잘못된 challenge 토큰
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// DNS 조회 또는 HTTPS 요청 실패 (증명 실패로 처리됨)
    #[error("challenge transport error: {0}")]
    Transport(String),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 저장소 에러
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl VerifierError {
    /// 요청자에게 반환할 HTTP 상태 코드
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidDomain { .. } | Self::InvalidToken(_) => 400,
            Self::Blocked { .. } | Self::VerificationFailed { .. } | Self::NotVerified { .. } => {
                403
            }
            Self::Transport(_) | Self::Config { .. } | Self::Storage(_) => 500,
        }
    }
}

impl From<VerifierError> for ScanwardError {
    fn from(err: VerifierError) -> Self {
        match err {
            VerifierError::Blocked { domain } => ScanwardError::Verify(VerifyError::Blocked(domain)),
            VerifierError::VerificationFailed { .. } => {
                ScanwardError::Verify(VerifyError::Failed(err.to_string()))
            }
            VerifierError::NotVerified { domain } => {
                ScanwardError::Verify(VerifyError::NotVerified(domain))
            }
            VerifierError::InvalidDomain { .. } | VerifierError::InvalidToken(_) => {
                ScanwardError::Verify(VerifyError::InvalidInput(err.to_string()))
            }
            VerifierError::Transport(_) => {
                ScanwardError::Verify(VerifyError::Failed(err.to_string()))
            }
            VerifierError::Config { field, reason } => {
                ScanwardError::Config(ConfigError::InvalidValue { field, reason })
            }
            VerifierError::Storage(e) => ScanwardError::Storage(e),
        }
    }
}
