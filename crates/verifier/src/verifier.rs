//! 도메인 소유권 검증 상태 머신
//!
//! [`DomainVerifier`]는 도메인당 하나의 [`VerificationRecord`]를 관리합니다.
//!
//! # 상태 전이
//! ```text
//! (없음)   ──증명 성공──> verified
//! (없음)   ──증명 실패──> failed
//! verified <──매 시도──> failed
//! blocked  : 종료 상태, 모든 시도를 거부 (운영자만 설정)
//! ```
//!
//! 새 시도는 기존 레코드의 방식, 토큰, 소유 계정, 해당 시각을 덮어씁니다.
//! 다른 계정이 검증한 레코드는 새 토큰으로 dns/file 증명에 성공해야만 넘어갑니다.
//! 기존 토큰 재제출, `token` 방식, 실패한 증명은 레코드를 건드리지 않고
//! `VerificationFailed`로 끝납니다.
//!
//! 차단 여부와 소유권은 저장소가 기록 시점에 다시 확인합니다
//! ([`VerificationStore::commit_verification`]).

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use scanward_core::metrics as m;
use scanward_core::store::{VerificationCommit, VerificationStore};
use scanward_core::types::{
    AccountId, Domain, VerificationMethod, VerificationRecord, VerificationStatus,
};

use crate::config::VerifierConfig;
use crate::error::VerifierError;
use crate::transport::ChallengeTransport;

/// 스캔 승인 시 소유권을 확인하는 게이트
///
/// 스캔 큐는 이 trait을 통해서만 검증 상태를 조회합니다.
pub trait VerificationGate: Send + Sync + 'static {
    /// 계정이 도메인의 검증된 소유자인지 확인합니다.
    fn ensure_verified(
        &self,
        account_id: AccountId,
        domain: &Domain,
    ) -> impl Future<Output = Result<VerificationRecord, VerifierError>> + Send;
}

/// 도메인 검증기
pub struct DomainVerifier<S, T> {
    store: Arc<S>,
    transport: T,
    config: VerifierConfig,
}

impl<S, T> DomainVerifier<S, T>
where
    S: VerificationStore,
    T: ChallengeTransport,
{
    /// 새 검증기를 생성합니다.
    ///
    /// # Errors
    ///
    /// 설정 검증 실패 시 `VerifierError::Config`를 반환합니다.
    pub fn new(store: Arc<S>, transport: T, config: VerifierConfig) -> Result<Self, VerifierError> {
        config.validate()?;
        Ok(Self {
            store,
            transport,
            config,
        })
    }

    /// 검증 설정을 반환합니다.
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// 소유권 증명을 시도하고 결과를 기록합니다.
    ///
    /// 입력 검증은 저장소 접근 전에 수행됩니다.
    /// 증명 실패 시 레코드를 `failed`로 기록한 뒤 `VerificationFailed`를 반환합니다.
    pub async fn request_or_verify(
        &self,
        account_id: AccountId,
        domain: &str,
        method: VerificationMethod,
        token: &str,
    ) -> Result<VerificationRecord, VerifierError> {
        let domain = parse_domain(domain)?;
        let token = token.trim();
        if token.chars().count() < self.config.min_token_len {
            return Err(VerifierError::InvalidToken(format!(
                "token must be at least {} characters",
                self.config.min_token_len
            )));
        }

        // 증명 전 사전 확인. 최종 판단은 저장소의 조건부 기록이 내립니다.
        match self.store.find_verification(&domain).await? {
            Some(previous) if previous.status == VerificationStatus::Blocked => {
                return Err(blocked_error(&domain, account_id));
            }
            Some(previous) if !previous.yields_to(account_id, method, token) => {
                return Err(owned_error(&domain, account_id, previous.account_id, method));
            }
            _ => {}
        }

        let proven = self.prove(&domain, method, token).await;
        let now = Utc::now();

        let attempt = VerificationRecord {
            domain: domain.clone(),
            method,
            token: token.to_owned(),
            status: if proven {
                VerificationStatus::Verified
            } else {
                VerificationStatus::Failed
            },
            account_id,
            verified_at: proven.then_some(now),
            failed_at: (!proven).then_some(now),
        };

        // 증명 대기 중 차단되거나 다른 계정이 소유했을 수 있습니다.
        let record = match self.store.commit_verification(attempt).await? {
            VerificationCommit::Stored(record) => record,
            VerificationCommit::Blocked => return Err(blocked_error(&domain, account_id)),
            VerificationCommit::Owned { owner } => {
                return Err(owned_error(&domain, account_id, owner, method));
            }
        };

        let result = if proven { "success" } else { "failure" };
        metrics::counter!(
            m::VERIFIER_ATTEMPTS_TOTAL,
            m::LABEL_METHOD => method.as_str(),
            m::LABEL_RESULT => result
        )
        .increment(1);

        if proven {
            info!(domain = %domain, account_id = %account_id, method = %method, "domain verified");
            Ok(record)
        } else {
            info!(domain = %domain, account_id = %account_id, method = %method, "domain verification failed");
            Err(VerifierError::VerificationFailed {
                domain: domain.to_string(),
                method: method.to_string(),
            })
        }
    }

    /// 계정이 도메인의 검증된 소유자인지 확인합니다.
    ///
    /// 차단된 도메인은 `Blocked`, 그 외 미검증 상태는 `NotVerified`를 반환합니다.
    pub async fn ensure_verified(
        &self,
        account_id: AccountId,
        domain: &Domain,
    ) -> Result<VerificationRecord, VerifierError> {
        match self.store.find_verification(domain).await? {
            Some(record) if record.is_verified_for(account_id) => Ok(record),
            Some(record) if record.status == VerificationStatus::Blocked => {
                Err(VerifierError::Blocked {
                    domain: domain.to_string(),
                })
            }
            _ => Err(VerifierError::NotVerified {
                domain: domain.to_string(),
            }),
        }
    }

    /// 도메인의 현재 검증 레코드를 조회합니다.
    pub async fn record(&self, domain: &str) -> Result<Option<VerificationRecord>, VerifierError> {
        let domain = parse_domain(domain)?;
        Ok(self.store.find_verification(&domain).await?)
    }

    /// 방식별 소유권 증명. 네트워크 에러는 증명 실패로 처리합니다.
    async fn prove(&self, domain: &Domain, method: VerificationMethod, token: &str) -> bool {
        match method {
            VerificationMethod::Dns => {
                let name = self.config.challenge_record_name(domain);
                match self.transport.lookup_txt(&name).await {
                    Ok(records) => records.iter().flatten().any(|chunk| chunk == token),
                    Err(e) => {
                        warn!(domain = %domain, error = %e, "dns challenge lookup failed");
                        false
                    }
                }
            }
            VerificationMethod::File => {
                let url = self.config.challenge_url(domain);
                match self.transport.fetch_challenge(&url).await {
                    Ok(response) => response.success && response.body.trim() == token,
                    Err(e) => {
                        warn!(domain = %domain, error = %e, "file challenge fetch failed");
                        false
                    }
                }
            }
            VerificationMethod::Token => true,
        }
    }
}

impl<S, T> VerificationGate for DomainVerifier<S, T>
where
    S: VerificationStore,
    T: ChallengeTransport,
{
    async fn ensure_verified(
        &self,
        account_id: AccountId,
        domain: &Domain,
    ) -> Result<VerificationRecord, VerifierError> {
        DomainVerifier::ensure_verified(self, account_id, domain).await
    }
}

fn blocked_error(domain: &Domain, account_id: AccountId) -> VerifierError {
    warn!(domain = %domain, account_id = %account_id, "verification attempt on blocked domain");
    metrics::counter!(m::VERIFIER_BLOCKED_TOTAL).increment(1);
    VerifierError::Blocked {
        domain: domain.to_string(),
    }
}

fn owned_error(
    domain: &Domain,
    account_id: AccountId,
    owner: AccountId,
    method: VerificationMethod,
) -> VerifierError {
    warn!(
        domain = %domain,
        account_id = %account_id,
        owner = %owner,
        "verification attempt on domain owned by another account"
    );
    metrics::counter!(
        m::VERIFIER_ATTEMPTS_TOTAL,
        m::LABEL_METHOD => method.as_str(),
        m::LABEL_RESULT => "failure"
    )
    .increment(1);
    VerifierError::VerificationFailed {
        domain: domain.to_string(),
        method: method.to_string(),
    }
}

fn parse_domain(raw: &str) -> Result<Domain, VerifierError> {
    Domain::parse(raw).map_err(|reason| VerifierError::InvalidDomain {
        domain: raw.to_owned(),
        reason,
    })
}
