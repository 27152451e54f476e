//! 스캐너 백엔드
//!
//! [`ScannerBackend`]는 선택된 템플릿 카테고리로 실제 스캔을 수행하는 샌드박스를 추상화합니다.
//!
//! - [`StandInScanner`]: 프로세스 없이 결정적인 발견 항목 하나를 반환
//! - [`DockerScanner`]: CPU/메모리가 제한된 컨테이너에서 스캐너를 실행하고 결과 파일을 정규화
//! - [`ConfiguredBackend`]: 설정(`use_stand_in`)에 따라 둘 중 하나를 선택

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use chrono::Utc;
use tokio::process::Command;
use tracing::{debug, warn};

use scanward_core::types::{Domain, JobId, NormalizedFinding, Severity};

use crate::config::ScanExecutorConfig;
use crate::error::ExecutorError;
use crate::normalizer::{ParsedOutput, parse_output};
use crate::templates::CapabilitySet;

/// 컨테이너 안의 템플릿 마운트 지점
const CONTAINER_TEMPLATES_DIR: &str = "/root/nuclei-templates";
/// 컨테이너 안의 결과 마운트 지점
const CONTAINER_RESULTS_DIR: &str = "/results";
/// 결과 파일 이름
pub const OUTPUT_FILE_NAME: &str = "output.json";

/// 스캐너 백엔드 trait
pub trait ScannerBackend: Send + Sync + 'static {
    /// 메트릭 레이블용 모드 이름
    fn mode(&self) -> &'static str;

    /// `domain`을 `capabilities` 범위로 스캔합니다.
    fn run(
        &self,
        job_id: JobId,
        domain: &Domain,
        capabilities: &[CapabilitySet],
    ) -> impl Future<Output = Result<ParsedOutput, ExecutorError>> + Send;
}

// ─── Stand-in ────────────────────────────────────────────────────────

/// 결정적 stand-in 스캐너
///
/// 외부 프로세스를 실행하지 않고 CSP 헤더 누락 항목 하나를 반환합니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandInScanner;

impl StandInScanner {
    /// stand-in 발견 항목 ID
    pub const FINDING_ID: &'static str = "missing-security-header";

    fn finding(domain: &Domain) -> NormalizedFinding {
        NormalizedFinding {
            id: Self::FINDING_ID.to_owned(),
            domain: domain.clone(),
            vulnerability_name: "Missing Security Header".to_owned(),
            severity: Severity::Low,
            affected_url: domain.https_url(),
            description: Some("The Content-Security-Policy header is not set.".to_owned()),
            evidence: serde_json::json!({ "header": "Content-Security-Policy" }),
            remediation: Some("Add a Content-Security-Policy header".to_owned()),
            detected_at: Utc::now(),
        }
    }
}

impl ScannerBackend for StandInScanner {
    fn mode(&self) -> &'static str {
        "stand_in"
    }

    async fn run(
        &self,
        job_id: JobId,
        domain: &Domain,
        capabilities: &[CapabilitySet],
    ) -> Result<ParsedOutput, ExecutorError> {
        debug!(%job_id, %domain, ?capabilities, "stand-in scan");
        Ok(ParsedOutput {
            findings: vec![Self::finding(domain)],
            skipped_lines: 0,
        })
    }
}

// ─── Docker ──────────────────────────────────────────────────────────

/// 컨테이너 기반 스캐너
///
/// 작업마다 `results_dir/<job_id>/` 디렉토리를 만들고 컨테이너의 `/results`에 마운트합니다.
/// 제한 시간이 지나면 프로세스를 종료하고 `Timeout`으로 실패합니다.
#[derive(Debug, Clone)]
pub struct DockerScanner {
    config: ScanExecutorConfig,
}

impl DockerScanner {
    /// 새 컨테이너 스캐너를 생성합니다.
    pub fn new(config: ScanExecutorConfig) -> Self {
        Self { config }
    }

    /// 작업별 결과 디렉토리
    pub fn output_dir(&self, job_id: JobId) -> PathBuf {
        self.config.results_dir.join(job_id.to_string())
    }

    /// 런타임 명령 뒤에 붙는 컨테이너 실행 인자를 생성합니다.
    pub fn container_args(
        &self,
        domain: &Domain,
        capabilities: &[CapabilitySet],
        templates_dir: &Path,
        output_dir: &Path,
    ) -> Vec<String> {
        let mut args = vec![
            "run".to_owned(),
            "--rm".to_owned(),
            format!("--cpus={}", self.config.cpus),
            format!("--memory={}", self.config.memory),
            "-v".to_owned(),
            format!("{}:{CONTAINER_TEMPLATES_DIR}:ro", templates_dir.display()),
            "-v".to_owned(),
            format!("{}:{CONTAINER_RESULTS_DIR}", output_dir.display()),
            self.config.image.clone(),
            "-u".to_owned(),
            domain.https_url(),
        ];

        for capability in capabilities {
            args.push("-t".to_owned());
            args.push(format!("{CONTAINER_TEMPLATES_DIR}/{capability}"));
        }

        args.extend([
            "-severity".to_owned(),
            self.config.severity_filter(),
            "-jsonl".to_owned(),
            "-o".to_owned(),
            format!("{CONTAINER_RESULTS_DIR}/{OUTPUT_FILE_NAME}"),
        ]);

        args
    }
}

impl ScannerBackend for DockerScanner {
    fn mode(&self) -> &'static str {
        "docker"
    }

    async fn run(
        &self,
        job_id: JobId,
        domain: &Domain,
        capabilities: &[CapabilitySet],
    ) -> Result<ParsedOutput, ExecutorError> {
        let output_dir = absolute(&self.output_dir(job_id))?;
        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|source| ExecutorError::Io {
                path: output_dir.display().to_string(),
                source,
            })?;
        // 이전 시도가 남긴 결과 파일을 읽지 않도록 실행 전에 지웁니다.
        let output_path = output_dir.join(OUTPUT_FILE_NAME);
        match tokio::fs::remove_file(&output_path).await {
            Ok(()) => {
                debug!(%job_id, path = %output_path.display(), "removed stale scanner output");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(ExecutorError::Io {
                    path: output_path.display().to_string(),
                    source,
                });
            }
        }
        let templates_dir = absolute(&self.config.templates_dir)?;

        let Some((program, prefix)) = self.config.runtime_command.split_first() else {
            return Err(ExecutorError::Config {
                field: "runtime_command".to_owned(),
                reason: "must name a program in live mode".to_owned(),
            });
        };
        let args = self.container_args(domain, capabilities, &templates_dir, &output_dir);

        debug!(%job_id, %domain, program, ?args, "launching scanner container");

        let mut child = Command::new(program)
            .args(prefix)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecutorError::Spawn {
                program: program.clone(),
                source,
            })?;

        let status = match tokio::time::timeout(self.config.timeout(), child.wait()).await {
            Ok(waited) => waited.map_err(|source| ExecutorError::Io {
                path: program.clone(),
                source,
            })?,
            Err(_) => {
                warn!(%job_id, %domain, secs = self.config.timeout_secs, "scanner timed out, killing");
                if let Err(e) = child.kill().await {
                    warn!(%job_id, error = %e, "failed to kill scanner process");
                }
                return Err(ExecutorError::Timeout {
                    secs: self.config.timeout_secs,
                });
            }
        };

        if !status.success() {
            return Err(ExecutorError::ScannerExit {
                code: status.code().unwrap_or(-1),
            });
        }

        let content = tokio::fs::read_to_string(&output_path)
            .await
            .map_err(|source| ExecutorError::OutputRead {
                path: output_path.display().to_string(),
                source,
            })?;

        Ok(parse_output(&content, domain))
    }
}

fn absolute(path: &Path) -> Result<PathBuf, ExecutorError> {
    std::path::absolute(path).map_err(|source| ExecutorError::Io {
        path: path.display().to_string(),
        source,
    })
}

// ─── 설정 기반 선택 ──────────────────────────────────────────────────

/// 설정으로 선택된 백엔드
#[derive(Debug, Clone)]
pub enum ConfiguredBackend {
    /// 결정적 stand-in
    StandIn(StandInScanner),
    /// 컨테이너 스캐너
    Docker(DockerScanner),
}

impl ConfiguredBackend {
    /// `use_stand_in` 값에 따라 백엔드를 선택합니다.
    pub fn from_config(config: &ScanExecutorConfig) -> Self {
        if config.use_stand_in {
            Self::StandIn(StandInScanner)
        } else {
            Self::Docker(DockerScanner::new(config.clone()))
        }
    }
}

impl ScannerBackend for ConfiguredBackend {
    fn mode(&self) -> &'static str {
        match self {
            Self::StandIn(b) => b.mode(),
            Self::Docker(b) => b.mode(),
        }
    }

    async fn run(
        &self,
        job_id: JobId,
        domain: &Domain,
        capabilities: &[CapabilitySet],
    ) -> Result<ParsedOutput, ExecutorError> {
        match self {
            Self::StandIn(b) => b.run(job_id, domain, capabilities).await,
            Self::Docker(b) => b.run(job_id, domain, capabilities).await,
        }
    }
}
