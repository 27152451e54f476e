//! 설정 관리 — scanward.toml 파싱 및 런타임 설정
//!
//! [`ScanwardConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`SCANWARD_QUEUE_MAX_RETRIES=2` 형식)
//! 3. 설정 파일 (`scanward.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), scanward_core::error::ScanwardError> {
//! use scanward_core::config::ScanwardConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = ScanwardConfig::load("scanward.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = ScanwardConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, ScanwardError};
use crate::types::Severity;

/// Scanward 통합 설정
///
/// `scanward.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanwardConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 도메인 검증 설정
    #[serde(default)]
    pub verification: VerificationConfig,
    /// 스캔 큐 설정
    #[serde(default)]
    pub queue: QueueConfig,
    /// 스캔 실행기 설정
    #[serde(default)]
    pub executor: ExecutorConfig,
}

impl ScanwardConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ScanwardError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ScanwardError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScanwardError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                ScanwardError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, ScanwardError> {
        toml::from_str(toml_str).map_err(|e| {
            ScanwardError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `SCANWARD_{SECTION}_{FIELD}`
    /// 예: `SCANWARD_EXECUTOR_USE_STAND_IN=false`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "SCANWARD_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "SCANWARD_GENERAL_LOG_FORMAT");

        // Verification
        override_string(
            &mut self.verification.dns_challenge_prefix,
            "SCANWARD_VERIFICATION_DNS_CHALLENGE_PREFIX",
        );
        override_string(
            &mut self.verification.well_known_path,
            "SCANWARD_VERIFICATION_WELL_KNOWN_PATH",
        );
        override_u64(
            &mut self.verification.http_timeout_secs,
            "SCANWARD_VERIFICATION_HTTP_TIMEOUT_SECS",
        );
        override_usize(
            &mut self.verification.min_token_len,
            "SCANWARD_VERIFICATION_MIN_TOKEN_LEN",
        );

        // Queue
        override_usize(
            &mut self.queue.max_active_per_account,
            "SCANWARD_QUEUE_MAX_ACTIVE_PER_ACCOUNT",
        );
        override_u32(&mut self.queue.max_retries, "SCANWARD_QUEUE_MAX_RETRIES");
        override_u32_csv(&mut self.queue.plan_tiers, "SCANWARD_QUEUE_PLAN_TIERS");
        override_usize(
            &mut self.queue.event_channel_capacity,
            "SCANWARD_QUEUE_EVENT_CHANNEL_CAPACITY",
        );

        // Executor
        override_bool(
            &mut self.executor.use_stand_in,
            "SCANWARD_EXECUTOR_USE_STAND_IN",
        );
        override_csv(
            &mut self.executor.runtime_command,
            "SCANWARD_EXECUTOR_RUNTIME_COMMAND",
        );
        override_string(&mut self.executor.image, "SCANWARD_EXECUTOR_IMAGE");
        override_string(&mut self.executor.cpus, "SCANWARD_EXECUTOR_CPUS");
        override_string(&mut self.executor.memory, "SCANWARD_EXECUTOR_MEMORY");
        override_string(
            &mut self.executor.templates_dir,
            "SCANWARD_EXECUTOR_TEMPLATES_DIR",
        );
        override_string(&mut self.executor.results_dir, "SCANWARD_EXECUTOR_RESULTS_DIR");
        override_csv(
            &mut self.executor.min_severity,
            "SCANWARD_EXECUTOR_MIN_SEVERITY",
        );
        override_u64(
            &mut self.executor.timeout_secs,
            "SCANWARD_EXECUTOR_TIMEOUT_SECS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ScanwardError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        // verification
        if self.verification.dns_challenge_prefix.trim().is_empty() {
            return Err(invalid(
                "verification.dns_challenge_prefix",
                "must not be empty".to_owned(),
            ));
        }
        if !self.verification.well_known_path.starts_with('/') {
            return Err(invalid(
                "verification.well_known_path",
                "must start with '/'".to_owned(),
            ));
        }
        if self.verification.http_timeout_secs == 0 {
            return Err(invalid(
                "verification.http_timeout_secs",
                "must be greater than 0".to_owned(),
            ));
        }
        if self.verification.min_token_len == 0 {
            return Err(invalid(
                "verification.min_token_len",
                "must be greater than 0".to_owned(),
            ));
        }

        // queue
        if self.queue.max_active_per_account == 0 {
            return Err(invalid(
                "queue.max_active_per_account",
                "must be greater than 0".to_owned(),
            ));
        }
        if self.queue.plan_tiers.is_empty() {
            return Err(invalid("queue.plan_tiers", "must not be empty".to_owned()));
        }
        if self.queue.event_channel_capacity == 0 {
            return Err(invalid(
                "queue.event_channel_capacity",
                "must be greater than 0".to_owned(),
            ));
        }

        // executor (live 모드에서만 의미 있는 값)
        if !self.executor.use_stand_in {
            if self.executor.runtime_command.is_empty()
                || self.executor.runtime_command[0].trim().is_empty()
            {
                return Err(invalid(
                    "executor.runtime_command",
                    "must name a program when use_stand_in is false".to_owned(),
                ));
            }
            if self.executor.image.trim().is_empty() {
                return Err(invalid(
                    "executor.image",
                    "must not be empty when use_stand_in is false".to_owned(),
                ));
            }
        }
        if self.executor.timeout_secs == 0 {
            return Err(invalid(
                "executor.timeout_secs",
                "must be greater than 0".to_owned(),
            ));
        }
        if self.executor.min_severity.is_empty() {
            return Err(invalid(
                "executor.min_severity",
                "must not be empty".to_owned(),
            ));
        }
        for sev in &self.executor.min_severity {
            if Severity::from_str_loose(sev).is_none() {
                return Err(invalid(
                    "executor.min_severity",
                    format!("unknown severity '{sev}' (expected: low, medium, high, critical)"),
                ));
            }
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> ScanwardError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 도메인 검증 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// DNS challenge 레코드 접두어 (`<prefix>.<domain>`)
    pub dns_challenge_prefix: String,
    /// HTTPS challenge 파일 경로
    pub well_known_path: String,
    /// HTTPS challenge 요청 타임아웃 (초)
    pub http_timeout_secs: u64,
    /// challenge 토큰 최소 길이
    pub min_token_len: usize,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            dns_challenge_prefix: "_scan-verify".to_owned(),
            well_known_path: "/.well-known/scan-verify.txt".to_owned(),
            http_timeout_secs: 10,
            min_token_len: 6,
        }
    }
}

/// 스캔 큐 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// 계정당 동시 활성(queued/running) 작업 최대 수
    pub max_active_per_account: usize,
    /// 실행 실패 시 재시도 횟수
    pub max_retries: u32,
    /// 허용되는 요금제 등급
    pub plan_tiers: Vec<u32>,
    /// 작업 이벤트 채널 용량
    pub event_channel_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_active_per_account: 3,
            max_retries: 1,
            plan_tiers: vec![10, 50, 100],
            event_channel_capacity: 256,
        }
    }
}

/// 스캔 실행기 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// 외부 스캐너 대신 결정적 stand-in을 사용할지 여부
    pub use_stand_in: bool,
    /// 컨테이너 런타임 명령 (프로그램 + 선행 인자)
    pub runtime_command: Vec<String>,
    /// 스캐너 이미지
    pub image: String,
    /// CPU 제한
    pub cpus: String,
    /// 메모리 제한
    pub memory: String,
    /// 템플릿 디렉토리 (컨테이너에 읽기 전용으로 마운트)
    pub templates_dir: String,
    /// 작업별 결과 디렉토리의 상위 경로
    pub results_dir: String,
    /// 스캐너에 전달할 심각도 필터
    pub min_severity: Vec<String>,
    /// 스캐너 실행 제한 시간 (초)
    pub timeout_secs: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            use_stand_in: true,
            runtime_command: vec!["docker".to_owned()],
            image: "projectdiscovery/nuclei:latest".to_owned(),
            cpus: "1".to_owned(),
            memory: "512m".to_owned(),
            templates_dir: "nuclei-templates".to_owned(),
            results_dir: "tmp/scan-results".to_owned(),
            min_severity: vec![
                "medium".to_owned(),
                "high".to_owned(),
                "critical".to_owned(),
            ],
            timeout_secs: 1800,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

fn override_u32_csv(target: &mut Vec<u32>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        let parsed: Result<Vec<u32>, _> = val
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<u32>)
            .collect();
        match parsed {
            Ok(values) => *target = values,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 list from env var, ignoring"
            ),
        }
    }
}
