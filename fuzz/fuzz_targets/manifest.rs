#![no_main]

use libfuzzer_sys::fuzz_target;
use pybom_sbom::source::manifest::{parse_manifest, parse_pep621_dependency};

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        let _ = parse_manifest(content, "fuzz/pyproject.toml");
        let _ = parse_pep621_dependency(content);
    }
});
