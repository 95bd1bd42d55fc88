#![no_main]

use libfuzzer_sys::fuzz_target;
use pybom_sbom::{normalize, parse_requirement};

fuzz_target!(|data: &[u8]| {
    if let Ok(raw) = std::str::from_utf8(data) {
        let req = parse_requirement(raw);
        // 키는 항상 정규화된 형태
        let key = req.key();
        assert_eq!(normalize(key.as_str()), key.as_str());
    }
});
