#![no_main]

use libfuzzer_sys::fuzz_target;
use stream_order_sensitivity::{Experiment, ExperimentConfig};

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = serde_json::from_slice::<ExperimentConfig>(data) {
        // invalid parameters must be rejected, never panic
        if let Ok(experiment) = Experiment::new(config) {
            let items: Vec<u32> = (0..config.checkpoint_count.min(64) as u32).collect();
            let _ = experiment.run_ordering(
                stream_order_sensitivity::OrderingKind::Random,
                &items,
                items.len().max(1),
            );
        }
    }
});
