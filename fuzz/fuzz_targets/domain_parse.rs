#![no_main]

use libfuzzer_sys::fuzz_target;
use scanward_core::types::Domain;

fuzz_target!(|raw: &str| {
    if let Ok(domain) = Domain::parse(raw) {
        // 정규화는 멱등이어야 합니다.
        let again = Domain::parse(domain.as_str()).expect("normalized domain re-parses");
        assert_eq!(again, domain);
    }
});
