#![no_main]

use libfuzzer_sys::fuzz_target;
use quality_gate::config::RunConfig;
use quality_gate::GateConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Loaded gate sets never contain a kind twice
        if let Ok(config) = GateConfig::from_toml_str(input) {
            let mut kinds: Vec<_> = config.gates().iter().map(|g| g.kind()).collect();
            let total = kinds.len();
            kinds.dedup();
            assert_eq!(kinds.len(), total);
        }
        let _ = RunConfig::from_toml_str(input);
    }
});
