#![no_main]

use libfuzzer_sys::fuzz_target;
use stream_order_sensitivity::{Sketch, SketchConfig, UniformHasher};
use wyhash::wyhash;

const CONFIGS: [SketchConfig; 4] = [
    SketchConfig::HyperLogLog { precision: 8 },
    SketchConfig::FlajoletMartin { num_hashes: 16 },
    SketchConfig::LinearCounting { num_bits: 1 << 18 },
    SketchConfig::Kmv { k: 32 },
];

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let split_index = wyhash(data, 0) as usize % data.len();
    let (first_half, second_half) = data.split_at(split_index);
    let config = CONFIGS[usize::from(data[0]) % CONFIGS.len()];
    let hasher = UniformHasher::new(u64::from(data[data.len() - 1]));

    let mut sketch1 = Sketch::new(config, hasher).unwrap();
    for chunk in first_half.chunks(4) {
        sketch1.insert(chunk);
        let estimate = sketch1.estimate().unwrap();
        assert!(estimate.is_finite() && estimate > 0.0);
    }

    let mut sketch2 = Sketch::new(config, hasher).unwrap();
    for chunk in second_half.chunks(4) {
        sketch2.insert(chunk);
        assert!(!sketch2.is_empty());
    }

    let before = sketch1.estimate().unwrap();
    sketch1.merge(&sketch2).unwrap();
    let after = sketch1.estimate().unwrap();
    assert!(after.is_finite() && after >= 0.0);
    if matches!(config, SketchConfig::LinearCounting { .. }) {
        assert!(after >= before);
    }
});
