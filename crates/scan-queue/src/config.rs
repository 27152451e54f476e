//! 스캔 큐 설정

use scanward_core::config::QueueConfig;
use scanward_scan_executor::MIN_PLAN_TIER;

use crate::error::ScanQueueError;

/// 스캔 큐 설정
#[derive(Debug, Clone)]
pub struct ScanQueueConfig {
    /// 계정당 동시 활성(queued/running) 작업 최대 수
    pub max_active_per_account: usize,
    /// 실행 실패 시 재시도 횟수
    pub max_retries: u32,
    /// 허용되는 플랜 티어
    pub plan_tiers: Vec<u32>,
    /// 작업 이벤트 채널 용량
    pub event_channel_capacity: usize,
}

impl Default for ScanQueueConfig {
    fn default() -> Self {
        Self::from_core(&QueueConfig::default())
    }
}

impl ScanQueueConfig {
    /// core 설정에서 큐 설정을 생성합니다.
    pub fn from_core(core: &QueueConfig) -> Self {
        Self {
            max_active_per_account: core.max_active_per_account,
            max_retries: core.max_retries,
            plan_tiers: core.plan_tiers.clone(),
            event_channel_capacity: core.event_channel_capacity,
        }
    }

    /// 설정 값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ScanQueueError> {
        if self.max_active_per_account == 0 {
            return Err(ScanQueueError::Config {
                field: "max_active_per_account".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        if self.plan_tiers.is_empty() {
            return Err(ScanQueueError::Config {
                field: "plan_tiers".to_owned(),
                reason: "must list at least one tier".to_owned(),
            });
        }
        if let Some(tier) = self.plan_tiers.iter().find(|t| **t < MIN_PLAN_TIER) {
            return Err(ScanQueueError::Config {
                field: "plan_tiers".to_owned(),
                reason: format!("tier {tier} is below the minimum scannable tier {MIN_PLAN_TIER}"),
            });
        }
        if self.event_channel_capacity == 0 {
            return Err(ScanQueueError::Config {
                field: "event_channel_capacity".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        Ok(())
    }

    /// 허용 티어인지 확인합니다.
    pub fn is_allowed_tier(&self, tier: u32) -> bool {
        self.plan_tiers.contains(&tier)
    }
}
