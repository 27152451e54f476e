//! 도메인 검증 설정
//!
//! [`VerifierConfig`]는 core의 [`VerificationConfig`](scanward_core::config::VerificationConfig)에서
//! 파생되며, challenge 이름과 URL을 조립하는 헬퍼를 제공합니다.

use std::time::Duration;

use scanward_core::types::Domain;

use crate::error::VerifierError;

/// HTTPS challenge 타임아웃 상한 (초)
const MAX_HTTP_TIMEOUT_SECS: u64 = 120;

/// 도메인 검증 설정
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// DNS challenge 레코드 접두어
    pub dns_challenge_prefix: String,
    /// HTTPS challenge 파일 경로 (`/`로 시작)
    pub well_known_path: String,
    /// HTTPS challenge 요청 타임아웃 (초)
    pub http_timeout_secs: u64,
    /// challenge 토큰 최소 길이
    pub min_token_len: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self::from_core(&scanward_core::config::VerificationConfig::default())
    }
}

impl VerifierConfig {
    /// core 설정에서 검증 설정을 생성합니다.
    pub fn from_core(core: &scanward_core::config::VerificationConfig) -> Self {
        Self {
            dns_challenge_prefix: core.dns_challenge_prefix.trim_matches('.').to_owned(),
            well_known_path: core.well_known_path.clone(),
            http_timeout_secs: core.http_timeout_secs,
            min_token_len: core.min_token_len,
        }
    }

    /// 설정 값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), VerifierError> {
        if self.dns_challenge_prefix.is_empty() {
            return Err(VerifierError::Config {
                field: "dns_challenge_prefix".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if !self.well_known_path.starts_with('/') {
            return Err(VerifierError::Config {
                field: "well_known_path".to_owned(),
                reason: "must start with '/'".to_owned(),
            });
        }

        if self.http_timeout_secs == 0 || self.http_timeout_secs > MAX_HTTP_TIMEOUT_SECS {
            return Err(VerifierError::Config {
                field: "http_timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_HTTP_TIMEOUT_SECS}"),
            });
        }

        if self.min_token_len == 0 {
            return Err(VerifierError::Config {
                field: "min_token_len".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        Ok(())
    }

    /// DNS challenge 레코드 이름 (`_scan-verify.<domain>`)
    pub fn challenge_record_name(&self, domain: &Domain) -> String {
        format!("{}.{}", self.dns_challenge_prefix, domain)
    }

    /// HTTPS challenge URL (`https://<domain>/.well-known/scan-verify.txt`)
    pub fn challenge_url(&self, domain: &Domain) -> String {
        format!("{}{}", domain.https_url(), self.well_known_path)
    }

    /// HTTPS 요청 타임아웃
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
