//! 스캔 실행기 설정
//!
//! core의 [`ExecutorConfig`](scanward_core::config::ExecutorConfig)에서 파생되며
//! 경로와 심각도 필터를 타입이 있는 값으로 변환합니다.

use std::path::PathBuf;
use std::time::Duration;

use scanward_core::types::Severity;

use crate::error::ExecutorError;

/// 실행 제한 시간 상한 (초, 6시간)
const MAX_TIMEOUT_SECS: u64 = 6 * 60 * 60;

/// 스캔 실행기 설정
#[derive(Debug, Clone)]
pub struct ScanExecutorConfig {
    /// 결정적 stand-in 사용 여부
    pub use_stand_in: bool,
    /// 컨테이너 런타임 명령 (첫 요소가 프로그램, 나머지는 선행 인자)
    pub runtime_command: Vec<String>,
    /// 스캐너 이미지
    pub image: String,
    /// CPU 제한
    pub cpus: String,
    /// 메모리 제한
    pub memory: String,
    /// 템플릿 디렉토리
    pub templates_dir: PathBuf,
    /// 작업별 결과 디렉토리의 상위 경로
    pub results_dir: PathBuf,
    /// 스캐너에 전달할 심각도 필터
    pub min_severity: Vec<Severity>,
    /// 실행 제한 시간 (초)
    pub timeout_secs: u64,
}

impl Default for ScanExecutorConfig {
    fn default() -> Self {
        Self::from_core(&scanward_core::config::ExecutorConfig::default())
    }
}

impl ScanExecutorConfig {
    /// core 설정에서 실행기 설정을 생성합니다.
    ///
    /// 알 수 없는 심각도 문자열은 core 검증 단계에서 이미 거부됩니다.
    pub fn from_core(core: &scanward_core::config::ExecutorConfig) -> Self {
        Self {
            use_stand_in: core.use_stand_in,
            runtime_command: core.runtime_command.clone(),
            image: core.image.clone(),
            cpus: core.cpus.clone(),
            memory: core.memory.clone(),
            templates_dir: PathBuf::from(&core.templates_dir),
            results_dir: PathBuf::from(&core.results_dir),
            min_severity: core
                .min_severity
                .iter()
                .filter_map(|s| Severity::from_str_loose(s))
                .collect(),
            timeout_secs: core.timeout_secs,
        }
    }

    /// 설정 값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ExecutorError> {
        if self.timeout_secs == 0 || self.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ExecutorError::Config {
                field: "timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_TIMEOUT_SECS}"),
            });
        }

        if self.use_stand_in {
            return Ok(());
        }

        match self.runtime_command.first() {
            Some(program) if !program.trim().is_empty() => {}
            _ => {
                return Err(ExecutorError::Config {
                    field: "runtime_command".to_owned(),
                    reason: "must name a program in live mode".to_owned(),
                });
            }
        }

        if self.image.trim().is_empty() {
            return Err(ExecutorError::Config {
                field: "image".to_owned(),
                reason: "must not be empty in live mode".to_owned(),
            });
        }

        if self.min_severity.is_empty() {
            return Err(ExecutorError::Config {
                field: "min_severity".to_owned(),
                reason: "must list at least one severity".to_owned(),
            });
        }

        Ok(())
    }

    /// 실행 제한 시간
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// 스캐너 `-severity` 인자 값 (`medium,high,critical`)
    pub fn severity_filter(&self) -> String {
        self.min_severity
            .iter()
            .map(Severity::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}
