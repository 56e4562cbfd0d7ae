#![no_main]
use gradeflow_core::review::{parse_pull_release, ReviewOutcome};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = parse_pull_release(s);
        let _ = ReviewOutcome::classify(s).label();
    }
});
