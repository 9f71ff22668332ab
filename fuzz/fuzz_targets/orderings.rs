#![no_main]

use std::collections::HashSet;

use libfuzzer_sys::fuzz_target;
use stream_order_sensitivity::ordering::same_multiset;
use stream_order_sensitivity::{
    ConvergenceHarness, OrderingGenerator, SketchConfig, UniformHasher,
};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let (seed, items) = data.split_at(1);
    let orderings = OrderingGenerator::new(u64::from(seed[0]))
        .generate(items, true)
        .unwrap();
    let truth = items.iter().collect::<HashSet<_>>().len();
    let harness =
        ConvergenceHarness::new(SketchConfig::hyperloglog(), UniformHasher::default(), 0.05)
            .unwrap();
    let checkpoint_count = items.len().min(20);

    let mut finals = Vec::new();
    for (kind, ordering) in orderings.iter() {
        assert!(same_multiset(items, ordering));
        let result = harness.run(kind, ordering, truth, checkpoint_count).unwrap();
        assert_eq!(result.checkpoints.len(), checkpoint_count);
        assert_eq!(result.checkpoints[checkpoint_count - 1].stream_position, items.len());
        finals.push(result.final_error);
    }
    assert!(finals.windows(2).all(|w| w[0] == w[1]));
});
