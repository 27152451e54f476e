//! 메트릭 상수
//!
//! 모든 메트릭의 이름을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::histogram!()`
//! 매크로를 호출합니다. 레코더(exporter)는 이 워크스페이스에서 설치하지 않습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `scanward_`
//! - 모듈명: `verifier_`, `scan_queue_`, `scan_executor_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(scanward_core::metrics::SCAN_QUEUE_ADMITTED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 검증 방식 레이블 키 (dns, file, token)
pub const LABEL_METHOD: &str = "method";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

/// 거부 사유 레이블 키 (invalid_tier, tos, not_verified, domain_busy, rate_limited)
pub const LABEL_REASON: &str = "reason";

/// 심각도 레이블 키 (low, medium, high, critical)
pub const LABEL_SEVERITY: &str = "severity";

/// 스캐너 모드 레이블 키 (stand_in, docker)
pub const LABEL_MODE: &str = "mode";

// ─── Verifier 메트릭 ───────────────────────────────────────────────

/// Verifier: 검증 시도 수 (counter, labels: method, result)
pub const VERIFIER_ATTEMPTS_TOTAL: &str = "scanward_verifier_attempts_total";

/// Verifier: 차단된 도메인에 대한 시도 수 (counter)
pub const VERIFIER_BLOCKED_TOTAL: &str = "scanward_verifier_blocked_total";

// ─── Scan Queue 메트릭 ─────────────────────────────────────────────

/// Scan Queue: 승인된 작업 수 (counter)
pub const SCAN_QUEUE_ADMITTED_TOTAL: &str = "scanward_scan_queue_admitted_total";

/// Scan Queue: 거부된 요청 수 (counter, label: reason)
pub const SCAN_QUEUE_REJECTED_TOTAL: &str = "scanward_scan_queue_rejected_total";

/// Scan Queue: 재시도 수 (counter)
pub const SCAN_QUEUE_RETRIES_TOTAL: &str = "scanward_scan_queue_retries_total";

/// Scan Queue: 완료된 작업 수 (counter)
pub const SCAN_QUEUE_COMPLETED_TOTAL: &str = "scanward_scan_queue_completed_total";

/// Scan Queue: 실패한 작업 수 (counter)
pub const SCAN_QUEUE_FAILED_TOTAL: &str = "scanward_scan_queue_failed_total";

/// Scan Queue: 드롭된 이벤트 수 (counter)
pub const SCAN_QUEUE_EVENTS_DROPPED_TOTAL: &str = "scanward_scan_queue_events_dropped_total";

// ─── Scan Executor 메트릭 ──────────────────────────────────────────

/// Scan Executor: 실행 수 (counter, labels: mode, result)
pub const SCAN_EXECUTOR_EXECUTIONS_TOTAL: &str = "scanward_scan_executor_executions_total";

/// Scan Executor: 정규화된 발견 항목 수 (counter, label: severity)
pub const SCAN_EXECUTOR_FINDINGS_TOTAL: &str = "scanward_scan_executor_findings_total";

/// Scan Executor: 파싱 불가로 건너뛴 출력 라인 수 (counter)
pub const SCAN_EXECUTOR_LINES_SKIPPED_TOTAL: &str = "scanward_scan_executor_lines_skipped_total";

/// Scan Executor: 스캔 소요 시간 (histogram, 초)
pub const SCAN_EXECUTOR_SCAN_DURATION_SECONDS: &str =
    "scanward_scan_executor_scan_duration_seconds";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 스캔 소요 시간 히스토그램 버킷 (초)
///
/// 1s ~ 1800s 범위 (외부 스캐너 기본 타임아웃까지)
pub const SCAN_DURATION_BUCKETS: [f64; 9] =
    [1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0];
