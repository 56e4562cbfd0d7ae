#![no_main]
use gradeflow_core::release::CapabilityReport;
use gradeflow_core::results::{ReleaseJobs, RequestSteps};
use gradeflow_core::Version;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(jobs) = ReleaseJobs::parse(s) {
            let version = Version {
                major: 1,
                minor: 0,
                patch: 0,
            };
            let report = CapabilityReport::aggregate("v1.0.0", &version, "results.json", &jobs);
            if !report.check_tests {
                assert!(!report.grade_tests && !report.request_review);
            }
        }
        if let Ok(steps) = RequestSteps::parse(s) {
            for (_, step) in steps.iter() {
                let _ = step.failed();
            }
        }
        let _ = CapabilityReport::parse(s);
    }
});
