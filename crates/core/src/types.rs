//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! 검증 레코드, 스캔 작업, 정규화된 취약점 발견 항목 등
//! 모든 모듈이 공유하는 데이터 구조를 정의합니다.
//! 저장소([`store`](crate::store))는 이 타입들을 그대로 영속화합니다.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 도메인 이름 최대 길이 (RFC 1035)
const MAX_DOMAIN_LEN: usize = 253;
/// 라벨 최대 길이
const MAX_LABEL_LEN: usize = 63;

// ─── AccountId ───────────────────────────────────────────────────────

/// 계정 ID
///
/// 인증 계층(외부 협력자)이 발급한 계정 식별자입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── JobId ───────────────────────────────────────────────────────────

/// 스캔 작업 ID (UUID v4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub uuid::Uuid);

impl JobId {
    /// 새 작업 ID를 생성합니다.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── Domain ──────────────────────────────────────────────────────────

/// 검증된 도메인 이름
///
/// 생성 시 정규화(공백 제거, 소문자 변환, 끝의 `.` 제거)와 호스트명 검증을 수행합니다.
/// URL, DNS 질의, 외부 프로세스 인자에 보간되는 모든 도메인은 이 타입을 거칩니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Domain(String);

impl Domain {
    /// 문자열을 정규화하고 검증하여 도메인을 생성합니다.
    ///
    /// # Errors
    ///
    /// 호스트명 규칙을 위반하면 사유 문자열을 반환합니다.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let normalized = raw.trim().trim_end_matches('.').to_ascii_lowercase();

        if normalized.is_empty() {
            return Err("domain must not be empty".to_owned());
        }
        if normalized.len() > MAX_DOMAIN_LEN {
            return Err(format!(
                "domain exceeds maximum length {MAX_DOMAIN_LEN} ({} chars)",
                normalized.len()
            ));
        }

        for label in normalized.split('.') {
            if label.is_empty() || label.len() > MAX_LABEL_LEN {
                return Err(format!(
                    "label '{label}' must be 1-{MAX_LABEL_LEN} characters"
                ));
            }
            if !label
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            {
                return Err(format!("label '{label}' contains invalid characters"));
            }
            if label.starts_with('-') || label.ends_with('-') {
                return Err(format!("label '{label}' must not start or end with '-'"));
            }
        }

        Ok(Self(normalized))
    }

    /// 정규화된 도메인 문자열을 반환합니다.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 도메인의 HTTPS 기본 URL (`https://<domain>`)
    pub fn https_url(&self) -> String {
        format!("https://{}", self.0)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for Domain {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ─── Severity ────────────────────────────────────────────────────────

/// 심각도 레벨
///
/// 정규화된 발견 항목의 심각도입니다.
/// `Ord` 구현으로 비교가 가능합니다 (`Low < Medium < High < Critical`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// 낮은 심각도 (스캐너가 심각도를 보고하지 않은 경우의 기본값)
    #[default]
    Low,
    /// 중간 심각도
    Medium,
    /// 높은 심각도
    High,
    /// 치명적 — 즉시 대응 필요
    Critical,
}

impl Severity {
    /// 문자열에서 심각도를 파싱합니다.
    ///
    /// 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "med" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" | "crit" => Some(Self::Critical),
            _ => None,
        }
    }

    /// 소문자 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Verification ────────────────────────────────────────────────────

/// 도메인 소유권 증명 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationMethod {
    /// `_scan-verify.<domain>` TXT 레코드
    Dns,
    /// `https://<domain>/.well-known/scan-verify.txt` 파일
    File,
    /// 대역 외로 발급된 토큰 (수동 승인)
    Token,
}

impl VerificationMethod {
    /// 소문자 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dns => "dns",
            Self::File => "file",
            Self::Token => "token",
        }
    }
}

impl fmt::Display for VerificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dns" => Ok(Self::Dns),
            "file" => Ok(Self::File),
            "token" | "manual" => Ok(Self::Token),
            other => Err(format!(
                "unknown verification method '{other}' (expected: dns, file, token)"
            )),
        }
    }
}

/// 검증 상태
///
/// 레코드가 없으면 "미검증"입니다. `Blocked`는 종료 상태이며
/// 이후의 모든 검증 시도를 거부합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// 소유권 증명 성공
    Verified,
    /// 마지막 증명 시도 실패
    Failed,
    /// 운영자에 의해 차단됨
    Blocked,
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verified => write!(f, "verified"),
            Self::Failed => write!(f, "failed"),
            Self::Blocked => write!(f, "blocked"),
        }
    }
}

/// 도메인 검증 레코드
///
/// 도메인당 최대 하나만 존재합니다 (전역 고유 키, 계정별 아님).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRecord {
    /// 도메인 (고유 키)
    pub domain: Domain,
    /// 마지막 시도의 증명 방식
    pub method: VerificationMethod,
    /// 마지막 시도의 challenge 토큰
    pub token: String,
    /// 현재 상태
    pub status: VerificationStatus,
    /// 소유 계정
    pub account_id: AccountId,
    /// 마지막 성공 시각
    pub verified_at: Option<DateTime<Utc>>,
    /// 마지막 실패 시각
    pub failed_at: Option<DateTime<Utc>>,
}

impl VerificationRecord {
    /// 주어진 계정이 현재 검증된 소유자인지 확인합니다.
    pub fn is_verified_for(&self, account_id: AccountId) -> bool {
        self.status == VerificationStatus::Verified && self.account_id == account_id
    }

    /// 다른 계정이 이 레코드를 가져가려 할 때 허용 여부를 판단합니다.
    ///
    /// `verified` 레코드는 소유 계정이 아닌 경우 새 토큰으로 dns/file 증명에
    /// 성공해야만 넘어갑니다. 기존 토큰 재제출이나 `token` 방식은 거부됩니다.
    pub fn yields_to(
        &self,
        account_id: AccountId,
        method: VerificationMethod,
        token: &str,
    ) -> bool {
        if !self.is_verified_by_other(account_id) {
            return true;
        }
        method != VerificationMethod::Token && token != self.token
    }

    /// 다른 계정이 검증한 레코드인지 확인합니다.
    pub fn is_verified_by_other(&self, account_id: AccountId) -> bool {
        self.status == VerificationStatus::Verified && self.account_id != account_id
    }
}

// ─── Scan Job ────────────────────────────────────────────────────────

/// 스캔 작업 상태
///
/// ```text
/// Queued → Running → Completed
///                  ↘ Failed
/// ```
/// `Completed`/`Failed`는 종료 상태이며 다시 열리지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// 대기 중
    Queued,
    /// 실행 중
    Running,
    /// 완료 (발견 항목 포함)
    Completed,
    /// 실패 (사유 포함)
    Failed,
}

impl JobStatus {
    /// 활성 상태(`Queued`/`Running`)인지 반환합니다.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }

    /// 종료 상태(`Completed`/`Failed`)인지 반환합니다.
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// 스캔 작업 레코드
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanJob {
    /// 작업 ID
    pub id: JobId,
    /// 스캔 대상 도메인
    pub domain: Domain,
    /// 요금제 등급 (capability tier)
    pub plan_tier: u32,
    /// 현재 상태
    pub status: JobStatus,
    /// 소유 계정
    pub account_id: AccountId,
    /// 생성 시각
    pub created_at: DateTime<Utc>,
    /// 마지막 실행 시작 시각
    pub started_at: Option<DateTime<Utc>>,
    /// 종료 시각
    pub completed_at: Option<DateTime<Utc>>,
    /// 실패 사유
    pub failure_reason: Option<String>,
    /// 정규화된 발견 항목 (순서 유지)
    pub findings: Vec<NormalizedFinding>,
    /// 실행기 호출 횟수
    pub attempts: u32,
}

impl fmt::Display for ScanJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "job {} [{}] {} tier={} attempts={}",
            self.id, self.status, self.domain, self.plan_tier, self.attempts,
        )
    }
}

// ─── Finding ─────────────────────────────────────────────────────────

/// 정규화된 발견 항목
///
/// 정규화기만 생성하며, 작업에 첨부된 이후에는 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedFinding {
    /// 발견 항목 ID (템플릿 ID 또는 생성된 UUID)
    pub id: String,
    /// 대상 도메인
    pub domain: Domain,
    /// 취약점 이름
    pub vulnerability_name: String,
    /// 심각도
    pub severity: Severity,
    /// 영향받는 URL
    pub affected_url: String,
    /// 상세 설명
    pub description: Option<String>,
    /// 증거 데이터 (도구 출력 그대로)
    pub evidence: serde_json::Value,
    /// 조치 방법 (첫 번째 참조 URL)
    pub remediation: Option<String>,
    /// 정규화 시각
    pub detected_at: DateTime<Utc>,
}

impl fmt::Display for NormalizedFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({})",
            self.severity, self.vulnerability_name, self.affected_url,
        )
    }
}

// ─── Account ─────────────────────────────────────────────────────────

/// 계정 정보 (인증 계층이 제공하는 최소 뷰)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// 계정 ID
    pub id: AccountId,
    /// 이용약관 동의 시각 (미동의 시 `None`)
    pub tos_accepted_at: Option<DateTime<Utc>>,
}

impl Account {
    /// 이용약관에 동의했는지 반환합니다.
    pub fn has_accepted_tos(&self) -> bool {
        self.tos_accepted_at.is_some()
    }
}
