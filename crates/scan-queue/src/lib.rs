//! # scanward-scan-queue
//!
//! 스캔 요청 승인과 단일 소비자 실행 큐.
//!
//! # Module Structure
//!
//! - [`error`]: 승인 거부 및 큐 에러 (`ScanQueueError`)
//! - [`config`]: 큐 설정 (`ScanQueueConfig`)
//! - [`service`]: 요청 승인 핸들 (`ScanService::start_scan`)
//! - [`queue`]: 워커 생명주기 (`ScanQueue`, `ScanQueueBuilder`, `Pipeline` impl)
//!
//! # Architecture
//!
//! ```text
//! start_scan --> tier / account / TOS --> VerificationGate --> ScanJobStore::admit_job
//!                                                                     |
//!                                                           JobId (unbounded mpsc)
//!                                                                     |
//!                                                                   Worker
//!                                                                     |
//!                                            mark_running --> ScanExecutor --> mark_completed / retry / mark_failed
//!                                                                     |
//!                                                         JobEvent (bounded mpsc, try_send)
//! ```

pub mod config;
pub mod error;
mod events;
pub mod queue;
pub mod service;
mod worker;

// --- Public API Re-exports ---

// Queue
pub use queue::{ScanQueue, ScanQueueBuilder};
pub use service::ScanService;

// Configuration
pub use config::ScanQueueConfig;

// Error
pub use error::ScanQueueError;
