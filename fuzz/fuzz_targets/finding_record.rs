#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde_json::{json, Value};

use scanward_core::types::Domain;
use scanward_scan_executor::normalize_record;

/// 퍼저용 구조적 입력 (스캐너 JSONL 레코드 형태)
#[derive(Arbitrary, Debug)]
struct FuzzRecord {
    template_id: Option<String>,
    name: Option<String>,
    severity: Option<String>,
    url: Option<String>,
    description: Option<String>,
    references: Vec<String>,
    extracted: Option<Vec<String>>,
    matcher_status: Option<bool>,
}

impl FuzzRecord {
    fn to_json(&self) -> Value {
        let mut info = json!({});
        if let Some(name) = &self.name {
            info["name"] = json!(name);
        }
        if let Some(severity) = &self.severity {
            info["severity"] = json!(severity);
        }
        if let Some(description) = &self.description {
            info["description"] = json!(description);
        }
        if !self.references.is_empty() {
            info["reference"] = json!(self.references);
        }

        let mut record = json!({ "info": info });
        if let Some(id) = &self.template_id {
            record["template-id"] = json!(id);
        }
        if let Some(url) = &self.url {
            record["url"] = json!(url);
        }
        if let Some(extracted) = &self.extracted {
            record["extracted-results"] = json!(extracted);
        }
        if let Some(status) = self.matcher_status {
            record["matcher-status"] = json!(status);
        }
        record
    }
}

fuzz_target!(|input: FuzzRecord| {
    let Ok(domain) = Domain::parse("fuzz.example.com") else {
        return;
    };
    let finding = normalize_record(&input.to_json(), &domain);

    assert!(!finding.id.is_empty());
    assert_eq!(finding.domain, domain);
    if input.url.is_none() {
        assert_eq!(finding.affected_url, "https://fuzz.example.com");
    }
    if input.references.is_empty() {
        assert!(finding.remediation.is_none());
    }
});
