#![no_main]

use libfuzzer_sys::fuzz_target;
use pybom_sbom::parse_freeze_output;

fuzz_target!(|data: &[u8]| {
    let listing = String::from_utf8_lossy(data);
    for (key, record) in parse_freeze_output(&listing) {
        assert_eq!(&key, &record.key);
        assert!(record.version.is_some());
    }
});
