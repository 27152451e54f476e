//! # scanward-scan-executor
//!
//! 플랜 티어로 스캐너 템플릿 카테고리를 고르고, 샌드박스 스캐너(또는 결정적 stand-in)를
//! 실행한 뒤 결과를 [`NormalizedFinding`](scanward_core::types::NormalizedFinding)으로 정규화합니다.
//!
//! # Module Structure
//!
//! - [`error`]: 실행 에러 (`ExecutorError`)
//! - [`config`]: 실행기 설정 (`ScanExecutorConfig`)
//! - [`templates`]: 티어 → 카테고리 매핑 (`select_templates`, `CapabilitySet`)
//! - [`normalizer`]: JSON 라인 정규화 (`normalize_record`, `parse_output`)
//! - [`backend`]: 샌드박스 (`ScannerBackend`, `StandInScanner`, `DockerScanner`)
//! - [`executor`]: 큐가 호출하는 실행기 (`ScanExecutor`, `TieredExecutor`)
//!
//! # Architecture
//!
//! ```text
//! ScanRequest --> select_templates --> ScannerBackend --+--> StandInScanner
//!                                                       |
//!                                                       +--> DockerScanner
//!                                                               |
//!                                                  results_dir/<job_id>/output.json
//!                                                               |
//!                                                          parse_output
//!                                                               |
//!                                                    Vec<NormalizedFinding>
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod executor;
pub mod normalizer;
pub mod templates;

// --- Public API Re-exports ---

// Executor
pub use executor::{ScanExecutor, ScanRequest, TieredExecutor};

// Backends
pub use backend::{ConfiguredBackend, DockerScanner, ScannerBackend, StandInScanner};

// Configuration
pub use config::ScanExecutorConfig;

// Error
pub use error::ExecutorError;

// Normalizer
pub use normalizer::{ParsedOutput, normalize_line, normalize_record, parse_output};

// Templates
pub use templates::{CapabilitySet, MIN_PLAN_TIER, select_templates, tier_table};
