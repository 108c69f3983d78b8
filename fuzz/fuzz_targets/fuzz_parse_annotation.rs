#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let s = String::from_utf8_lossy(data);
    if let Ok(invocations) = fieldcheck::parse_annotation(&s) {
        if !s.is_empty() {
            assert_eq!(invocations.len(), s.split('|').count());
        }
        assert!(invocations.iter().all(|i| !i.rule.is_empty()));
    }
});
