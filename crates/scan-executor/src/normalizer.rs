//! 스캐너 JSON 출력 → [`NormalizedFinding`] 변환
//!
//! 스캐너는 결과를 한 줄에 하나의 JSON 객체로 기록합니다.
//! 빈 줄, JSON이 아닌 줄, 객체가 아닌 JSON 값은 건너뜁니다.
//!
//! # 필드 매핑
//!
//! | 결과 필드 | 원본 필드 | 기본값 |
//! |---|---|---|
//! | `id` | `template-id` | 새 UUID |
//! | `vulnerability_name` | `info.name` | `"Unknown"` |
//! | `severity` | `info.severity` | `low` (`info` 등 알 수 없는 값 포함) |
//! | `affected_url` | `url` | `https://<domain>` |
//! | `description` | `info.description` | 없음 |
//! | `evidence` | `extracted-results` → `matcher-status` → 원본 레코드 | |
//! | `remediation` | `info.reference`의 첫 항목 (문자열 또는 배열) | 없음 |

use chrono::Utc;
use serde_json::Value;

use scanward_core::types::{Domain, NormalizedFinding, Severity};

const UNKNOWN_NAME: &str = "Unknown";

/// 결과 파일 한 개를 파싱한 결과
#[derive(Debug, Clone, Default)]
pub struct ParsedOutput {
    /// 정규화된 발견 항목 (출력 순서 유지)
    pub findings: Vec<NormalizedFinding>,
    /// 파싱할 수 없어 건너뛴 줄 수 (빈 줄 제외)
    pub skipped_lines: usize,
}

/// 원본 레코드 하나를 정규화합니다.
pub fn normalize_record(raw: &Value, domain: &Domain) -> NormalizedFinding {
    let info = raw.get("info");

    let severity = info
        .and_then(|i| str_field(i, "severity"))
        .and_then(Severity::from_str_loose)
        .unwrap_or_default();

    let id = str_field(raw, "template-id")
        .map(str::to_owned)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let vulnerability_name = info
        .and_then(|i| str_field(i, "name"))
        .unwrap_or(UNKNOWN_NAME)
        .to_owned();

    let affected_url = str_field(raw, "url")
        .map(str::to_owned)
        .unwrap_or_else(|| domain.https_url());

    let description = info
        .and_then(|i| str_field(i, "description"))
        .map(str::to_owned);

    let evidence = present(raw, "extracted-results")
        .or_else(|| present(raw, "extracted_results"))
        .or_else(|| present(raw, "matcher-status"))
        .or_else(|| present(raw, "matcher_status"))
        .cloned()
        .unwrap_or_else(|| raw.clone());

    let remediation = info.and_then(first_reference);

    NormalizedFinding {
        id,
        domain: domain.clone(),
        vulnerability_name,
        severity,
        affected_url,
        description,
        evidence,
        remediation,
        detected_at: Utc::now(),
    }
}

/// 출력 한 줄을 정규화합니다.
///
/// 빈 줄이거나 JSON 객체가 아니면 `None`을 반환합니다.
pub fn normalize_line(line: &str, domain: &Domain) -> Option<NormalizedFinding> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(line) {
        Ok(value) if value.is_object() => Some(normalize_record(&value, domain)),
        _ => None,
    }
}

/// 결과 파일 전체를 줄 단위로 정규화합니다.
pub fn parse_output(content: &str, domain: &Domain) -> ParsedOutput {
    let mut parsed = ParsedOutput::default();

    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match normalize_line(line, domain) {
            Some(finding) => parsed.findings.push(finding),
            None => parsed.skipped_lines += 1,
        }
    }

    parsed
}

/// 비어 있지 않은 문자열 필드
fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// null이 아닌 필드
fn present<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|v| !v.is_null())
}

fn first_reference(info: &Value) -> Option<String> {
    match info.get("reference")? {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.first().and_then(Value::as_str).map(str::to_owned),
        _ => None,
    }
    .filter(|s| !s.trim().is_empty())
}
