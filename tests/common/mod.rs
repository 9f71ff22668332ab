//! Synthetic streams shared by integration tests.
#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// `n` distinct items in generation order
pub fn distinct_stream(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("https://example.com/page/{}", i)).collect()
}

/// `total` items over `unique` values with near-equal multiplicities, arriving in bursts.
///
/// Every value's occurrences are split into runs of 5 to 15 identical items and the runs
/// of all values are interleaved in a seeded random order.
pub fn bursty_stream(total: usize, unique: usize, seed: u64) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut bursts: Vec<(usize, usize)> = Vec::new();
    for value in 0..unique {
        let mut count = total / unique + usize::from(value < total % unique);
        while count > 0 {
            let len = rng.gen_range(5..=15).min(count);
            bursts.push((value, len));
            count -= len;
        }
    }
    bursts.shuffle(&mut rng);
    bursts
        .into_iter()
        .flat_map(|(value, len)| std::iter::repeat(format!("user_{:05}", value)).take(len))
        .collect()
}

/// Hot/cold stream: `hot_ratio` of the traffic drawn from a small hot set
pub fn hot_cold_stream(
    total: usize,
    hot_set: usize,
    cold_set: usize,
    hot_ratio: f64,
    seed: u64,
) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..total)
        .map(|_| {
            if rng.gen_bool(hot_ratio) {
                format!("hot_{}", rng.gen_range(0..hot_set))
            } else {
                format!("cold_{}", rng.gen_range(0..cold_set))
            }
        })
        .collect()
}

/// Exact number of distinct items
pub fn unique_count(items: &[String]) -> usize {
    items.iter().collect::<std::collections::HashSet<_>>().len()
}
