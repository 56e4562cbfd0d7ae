#![no_main]
use gradeflow_core::Version;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Anything that parses must print back to a tag that parses the same
        if let Ok(version) = Version::parse(s) {
            assert_eq!(Version::parse(&version.tag()).ok(), Some(version));
        }
        let _ = Version::parse_ref(s);
    }
});
