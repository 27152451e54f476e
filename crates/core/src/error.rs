//! 에러 타입 — 도메인별 에러 정의

/// Scanward 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum ScanwardError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 도메인 검증 에러
    #[error("verification error: {0}")]
    Verify(#[from] VerifyError),

    /// 스캔 에러
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    /// 스토리지 에러
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 채널 전송 실패
    #[error("channel send failed: {0}")]
    ChannelSend(String),

    /// 채널 수신 실패
    #[error("channel receive failed: {0}")]
    ChannelRecv(String),

    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),

    /// 이미 실행 중
    #[error("pipeline already running")]
    AlreadyRunning,

    /// 실행 중이 아님
    #[error("pipeline not running")]
    NotRunning,
}

/// 도메인 검증 에러 (요청자에게 노출되는 범주)
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// 차단된 도메인
    #[error("domain blocked: {0}")]
    Blocked(String),

    /// 소유권 증명 실패
    #[error("verification failed: {0}")]
    Failed(String),

    /// 검증되지 않은 도메인
    #[error("domain not verified: {0}")]
    NotVerified(String),

    /// 잘못된 요청 값
    #[error("invalid request: {0}")]
    InvalidInput(String),
}

/// 스캔 에러
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// 요청 거부 (자격, 경합, 속도 제한)
    #[error("scan rejected: {0}")]
    Rejected(String),

    /// 스캐너 실행 실패
    #[error("scan execution failed: {0}")]
    Execution(String),

    /// 스캔 큐가 종료됨
    #[error("scan queue closed")]
    QueueClosed,
}

/// 스토리지 에러
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// 레코드를 찾을 수 없음
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// 허용되지 않는 상태 전이
    #[error("invalid transition for {id}: {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: String,
        to: String,
    },

    /// 백엔드 에러
    #[error("storage backend error: {0}")]
    Backend(String),
}
