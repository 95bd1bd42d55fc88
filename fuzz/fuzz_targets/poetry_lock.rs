#![no_main]

use libfuzzer_sys::fuzz_target;
use pybom_sbom::source::manifest::parse_lock;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        let _ = parse_lock(content, "fuzz/poetry.lock");
    }
});
