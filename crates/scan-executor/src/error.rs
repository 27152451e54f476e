//! 스캔 실행기 에러 타입
//!
//! [`ExecutorError`]는 템플릿 선택, 스캐너 프로세스 실행, 결과 파일 읽기에서
//! 발생하는 에러를 표현합니다. 작업 실패 사유는 이 에러의 `Display` 문자열입니다.
//!
//! # 에러 카테고리
//!
//! - 요청 에러: `InvalidPlanTier` (재시도해도 결과가 같음)
//! - 실행 에러: `ScannerExit`, `Spawn`, `Timeout`, `OutputRead`, `Io`
//! - 설정 에러: `Config`

use scanward_core::error::{ConfigError, ScanError, ScanwardError};

/// 스캔 실행기 에러
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// 지원하지 않는 플랜 티어 (최소 티어 미만)
    #[error("invalid plan tier: {0}")]
    InvalidPlanTier(u32),

    /// 스캐너가 0이 아닌 코드로 종료됨 (시그널 종료 시 -1)
    #[error("scanner exit code {code}")]
    ScannerExit {
        /// 종료 코드
        code: i32,
    },

    /// 스캐너 프로세스 생성 실패
    #[error("failed to spawn scanner '{program}': {source}")]
    Spawn {
        /// 실행하려던 프로그램
        program: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },

    /// 실행 제한 시간 초과 (프로세스는 종료됨)
    #[error("scanner timed out after {secs}s")]
    Timeout {
        /// 제한 시간 (초)
        secs: u64,
    },

    /// 결과 파일 읽기 실패
    #[error("failed to read scanner output {path}: {source}")]
    OutputRead {
        /// 결과 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },

    /// 기타 파일시스템 에러 (결과 디렉토리 생성 등)
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl ExecutorError {
    /// 같은 요청을 다시 실행하면 결과가 달라질 수 있는지 여부
    ///
    /// 티어와 설정 에러는 재실행해도 같으므로 재시도 대상이 아닙니다.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidPlanTier(_) | Self::Config { .. })
    }
}

impl From<ExecutorError> for ScanwardError {
    fn from(err: ExecutorError) -> Self {
        match err {
            ExecutorError::InvalidPlanTier(_) => {
                ScanwardError::Scan(ScanError::Rejected(err.to_string()))
            }
            ExecutorError::Config { field, reason } => {
                ScanwardError::Config(ConfigError::InvalidValue { field, reason })
            }
            other => ScanwardError::Scan(ScanError::Execution(other.to_string())),
        }
    }
}
