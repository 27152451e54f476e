//! 플랜 티어 → 스캐너 템플릿 카테고리 매핑
//!
//! | plan_tier | 카테고리 |
//! |---|---|
//! | 100 이상 | `standard` + `extended` |
//! | 50 이상 100 미만 | `standard` |
//! | 10 이상 50 미만 | `basic` |
//! | 10 미만 | 거부 |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ExecutorError;

/// 스캔 가능한 최소 플랜 티어
pub const MIN_PLAN_TIER: u32 = 10;

const STANDARD_TIER: u32 = 50;
const EXTENDED_TIER: u32 = 100;

/// 스캐너 템플릿 카테고리
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilitySet {
    /// 기본 점검
    Basic,
    /// 표준 점검
    Standard,
    /// 확장 점검
    Extended,
}

impl CapabilitySet {
    /// 템플릿 디렉토리 안의 하위 디렉토리 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Standard => "standard",
            Self::Extended => "extended",
        }
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 플랜 티어에 해당하는 템플릿 카테고리를 선택합니다.
///
/// # Errors
///
/// `plan_tier`가 [`MIN_PLAN_TIER`] 미만이면 `ExecutorError::InvalidPlanTier`를 반환합니다.
pub fn select_templates(plan_tier: u32) -> Result<Vec<CapabilitySet>, ExecutorError> {
    match plan_tier {
        t if t >= EXTENDED_TIER => Ok(vec![CapabilitySet::Standard, CapabilitySet::Extended]),
        t if t >= STANDARD_TIER => Ok(vec![CapabilitySet::Standard]),
        t if t >= MIN_PLAN_TIER => Ok(vec![CapabilitySet::Basic]),
        t => Err(ExecutorError::InvalidPlanTier(t)),
    }
}

/// CLI `tiers` 출력용 대표 티어 표
pub fn tier_table() -> Vec<(u32, Vec<CapabilitySet>)> {
    [MIN_PLAN_TIER, STANDARD_TIER, EXTENDED_TIER]
        .into_iter()
        .filter_map(|tier| select_templates(tier).ok().map(|caps| (tier, caps)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_minimum_is_rejected() {
        assert!(matches!(
            select_templates(9),
            Err(ExecutorError::InvalidPlanTier(9))
        ));
        assert!(select_templates(0).is_err());
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(select_templates(10).unwrap(), vec![CapabilitySet::Basic]);
        assert_eq!(select_templates(49).unwrap(), vec![CapabilitySet::Basic]);
        assert_eq!(select_templates(50).unwrap(), vec![CapabilitySet::Standard]);
        assert_eq!(select_templates(99).unwrap(), vec![CapabilitySet::Standard]);
        assert_eq!(
            select_templates(100).unwrap(),
            vec![CapabilitySet::Standard, CapabilitySet::Extended]
        );
        assert_eq!(
            select_templates(u32::MAX).unwrap(),
            vec![CapabilitySet::Standard, CapabilitySet::Extended]
        );
    }

    #[test]
    fn tier_table_lists_three_rows() {
        let table = tier_table();
        assert_eq!(table.len(), 3);
        assert_eq!(table[0].0, 10);
        assert_eq!(table[2].1.len(), 2);
    }

    #[test]
    fn capability_display() {
        assert_eq!(CapabilitySet::Extended.to_string(), "extended");
    }
}
