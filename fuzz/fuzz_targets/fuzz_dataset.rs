//! Fuzz target for dataset files.
//!
//! Arbitrary JSON is parsed, converted to matrices and, when that succeeds,
//! audited with the default analyzer. Every failure must surface as an error.

#![no_main]

use ga_config::AnalyzerConfig;
use ga_core::dataset::DatasetFile;
use ga_core::issue::IssueRegistry;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(file) = DatasetFile::from_json(text) else {
        return;
    };
    // Keep clustering cheap
    if file.num_examples() > 256 {
        return;
    }
    let Ok(loaded) = file.into_loaded() else {
        return;
    };
    let config = AnalyzerConfig::default();
    let registry = IssueRegistry::default();
    if let Ok(mut manager) = registry.create("underperf_group", &loaded.context, &config) {
        let _ = manager.find_issues(&loaded.inputs());
    }
});
