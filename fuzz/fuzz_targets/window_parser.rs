#![no_main]

use libfuzzer_sys::fuzz_target;
use quality_gate::input::{parse_list, parse_window_minutes};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Accepted windows are always positive
        if let Ok(minutes) = parse_window_minutes("window", input) {
            assert!(minutes > 0);
        }
        let _ = parse_list(input, "list");
    }
});
