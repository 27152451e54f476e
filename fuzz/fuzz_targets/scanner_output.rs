#![no_main]

use libfuzzer_sys::fuzz_target;
use scanward_core::types::Domain;
use scanward_scan_executor::parse_output;

fuzz_target!(|data: &[u8]| {
    let Ok(content) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(domain) = Domain::parse("fuzz.example.com") else {
        return;
    };

    let parsed = parse_output(content, &domain);

    // 비어 있지 않은 줄은 발견 항목 또는 건너뛴 줄 중 하나로만 집계됩니다.
    let non_blank = content.lines().filter(|l| !l.trim().is_empty()).count();
    assert_eq!(parsed.findings.len() + parsed.skipped_lines, non_blank);
    assert!(parsed.findings.iter().all(|f| f.domain == domain));
});
