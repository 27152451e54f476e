//! 스캔 실행기
//!
//! [`ScanExecutor`]는 스캔 큐가 호출하는 실행 인터페이스입니다.
//! [`TieredExecutor`]는 플랜 티어로 템플릿 카테고리를 고른 뒤 [`ScannerBackend`]에 위임하고
//! 실행 결과를 메트릭으로 기록합니다.

use std::future::Future;
use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{info, warn};

use scanward_core::metrics as m;
use scanward_core::types::{Domain, JobId, NormalizedFinding};

use crate::backend::{ConfiguredBackend, ScannerBackend};
use crate::config::ScanExecutorConfig;
use crate::error::ExecutorError;
use crate::templates::select_templates;

/// 스캔 실행 요청
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    /// 작업 ID (결과 디렉토리 이름으로 사용)
    pub job_id: JobId,
    /// 대상 도메인
    pub domain: Domain,
    /// 플랜 티어
    pub plan_tier: u32,
}

/// 스캔 실행 trait
///
/// 성공 시 정규화된 발견 항목을, 실패 시 작업 실패 사유가 되는 에러를 반환합니다.
pub trait ScanExecutor: Send + Sync + 'static {
    /// 스캔을 한 번 실행합니다.
    fn execute_scan(
        &self,
        request: &ScanRequest,
    ) -> impl Future<Output = Result<Vec<NormalizedFinding>, ExecutorError>> + Send;
}

/// 플랜 티어 기반 실행기
pub struct TieredExecutor<B: ScannerBackend> {
    backend: B,
}

impl<B: ScannerBackend> TieredExecutor<B> {
    /// 주어진 백엔드로 실행기를 생성합니다.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// 백엔드 참조
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl TieredExecutor<ConfiguredBackend> {
    /// 설정을 검증하고 설정된 백엔드로 실행기를 생성합니다.
    pub fn from_config(config: &ScanExecutorConfig) -> Result<Self, ExecutorError> {
        config.validate()?;
        Ok(Self::new(ConfiguredBackend::from_config(config)))
    }
}

impl<B: ScannerBackend> ScanExecutor for TieredExecutor<B> {
    async fn execute_scan(
        &self,
        request: &ScanRequest,
    ) -> Result<Vec<NormalizedFinding>, ExecutorError> {
        let capabilities = select_templates(request.plan_tier)?;
        let mode = self.backend.mode();

        info!(
            job_id = %request.job_id,
            domain = %request.domain,
            plan_tier = request.plan_tier,
            ?capabilities,
            mode,
            "executing scan"
        );

        let started = Instant::now();
        let result = self
            .backend
            .run(request.job_id, &request.domain, &capabilities)
            .await;
        histogram!(m::SCAN_EXECUTOR_SCAN_DURATION_SECONDS, m::LABEL_MODE => mode)
            .record(started.elapsed().as_secs_f64());

        match result {
            Ok(output) => {
                counter!(
                    m::SCAN_EXECUTOR_EXECUTIONS_TOTAL,
                    m::LABEL_MODE => mode,
                    m::LABEL_RESULT => "success"
                )
                .increment(1);
                if output.skipped_lines > 0 {
                    warn!(
                        job_id = %request.job_id,
                        skipped = output.skipped_lines,
                        "skipped unparseable scanner output lines"
                    );
                    counter!(m::SCAN_EXECUTOR_LINES_SKIPPED_TOTAL)
                        .increment(output.skipped_lines as u64);
                }
                for finding in &output.findings {
                    counter!(
                        m::SCAN_EXECUTOR_FINDINGS_TOTAL,
                        m::LABEL_SEVERITY => finding.severity.as_str()
                    )
                    .increment(1);
                }
                info!(
                    job_id = %request.job_id,
                    findings = output.findings.len(),
                    "scan finished"
                );
                Ok(output.findings)
            }
            Err(e) => {
                counter!(
                    m::SCAN_EXECUTOR_EXECUTIONS_TOTAL,
                    m::LABEL_MODE => mode,
                    m::LABEL_RESULT => "failure"
                )
                .increment(1);
                warn!(job_id = %request.job_id, error = %e, "scan failed");
                Err(e)
            }
        }
    }
}
