//! 작업 이벤트 전송
//!
//! 이벤트는 best-effort로 전송됩니다. 채널이 가득 차면 경고를 남기고 버립니다.

use metrics::counter;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use scanward_core::event::JobEvent;
use scanward_core::metrics as m;

/// 이벤트 채널 송신측 래퍼
#[derive(Debug, Clone)]
pub(crate) struct EventSink {
    tx: mpsc::Sender<JobEvent>,
}

impl EventSink {
    pub(crate) fn new(tx: mpsc::Sender<JobEvent>) -> Self {
        Self { tx }
    }

    pub(crate) fn emit(&self, event: JobEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(
                    job_id = %event.job_id,
                    kind = %event.kind,
                    "job event channel full, dropping event"
                );
                counter!(m::SCAN_QUEUE_EVENTS_DROPPED_TOTAL).increment(1);
            }
            Err(TrySendError::Closed(event)) => {
                debug!(job_id = %event.job_id, "no job event subscriber");
            }
        }
    }
}
