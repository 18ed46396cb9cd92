//! Fuzz target for underperf_group.json configuration parsing.
//!
//! Parsing and validation must return errors, never panic.

#![no_main]

use ga_config::{validate_config, AnalyzerConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(config) = AnalyzerConfig::from_str(text) {
            let _ = validate_config(&config);
        }
    }
});
