#![no_main]
use gradeflow_core::output::StepReport;
use gradeflow_core::request::{parse_request, RequestDetails};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(details) = RequestDetails::parse(s) {
            let _ = details.version();
        }

        // First line doubles as the issue title
        let (title, body) = s.split_once('\n').unwrap_or((s, ""));
        let mut report = StepReport::new();
        parse_request(title, Some(body), &mut report);
        assert!(report.output("request_type").is_some() || !report.errors().is_empty());
    }
});
