//! Runs the three canonical orderings of a few synthetic streams and prints how much
//! slower the grouped ordering converges than the random one.
//!
//! ```sh
//! cargo run --release --example sensitivity
//! ```
use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use stream_order_sensitivity::experiment::Dataset;
use stream_order_sensitivity::{DatasetInfo, Experiment, ExperimentConfig, SketchConfig};
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct Row {
    dataset: String,
    unique: usize,
    total: usize,
    duplicate_ratio: String,
    grouped: String,
    random: String,
    chronological: String,
    sensitivity: String,
}

fn dataset(id: &str, items: Vec<String>) -> Dataset<String> {
    let unique = items.iter().collect::<HashSet<_>>().len();
    Dataset {
        info: DatasetInfo::new(id, unique, items.len()),
        items,
        natural_order: true,
    }
}

/// `unique` values repeated `copies` times, arriving in runs of 5 to 15
fn bursty(unique: usize, copies: usize, rng: &mut StdRng) -> Vec<String> {
    let mut bursts = Vec::new();
    for value in 0..unique {
        let mut left = copies;
        while left > 0 {
            let len = rng.gen_range(5..=15).min(left);
            bursts.push((value, len));
            left -= len;
        }
    }
    bursts.shuffle(rng);
    bursts
        .into_iter()
        .flat_map(|(value, len)| std::iter::repeat(format!("user_{}", value)).take(len))
        .collect()
}

fn hot_cold(total: usize, hot_ratio: f64, rng: &mut StdRng) -> Vec<String> {
    (0..total)
        .map(|_| {
            if rng.gen_bool(hot_ratio) {
                format!("hot_{}", rng.gen_range(0..100))
            } else {
                format!("cold_{}", rng.gen_range(0..20_000))
            }
        })
        .collect()
}

fn fmt_time(time: Option<usize>) -> String {
    time.map_or_else(|| "never".to_string(), |t| t.to_string())
}

fn main() {
    let mut rng = StdRng::seed_from_u64(2024);
    let datasets = vec![
        dataset(
            "distinct",
            (0..50_000).map(|i| format!("https://example.com/{}", i)).collect(),
        ),
        dataset("hot_cold_50", hot_cold(100_000, 0.5, &mut rng)),
        dataset("hot_cold_90", hot_cold(100_000, 0.9, &mut rng)),
        dataset("bursty", bursty(3_000, 33, &mut rng)),
    ];

    let config = ExperimentConfig {
        sketch: SketchConfig::HyperLogLog { precision: 14 },
        ..Default::default()
    };
    let experiment = match Experiment::new(config) {
        Ok(experiment) => experiment,
        Err(err) => {
            eprintln!("invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    let report = experiment.run_all(&datasets);
    let rows: Vec<Row> = report
        .records
        .iter()
        .map(|record| Row {
            dataset: record.dataset.dataset_id.clone(),
            unique: record.dataset.unique_count,
            total: record.dataset.total_count,
            duplicate_ratio: format!("{:.3}", record.dataset.duplicate_ratio),
            grouped: fmt_time(record.results.grouped.time_to_threshold),
            random: fmt_time(record.results.random.time_to_threshold),
            chronological: fmt_time(record.results.chronological.time_to_threshold),
            sensitivity: record
                .sensitivity
                .sensitivity_factor
                .map_or_else(|| "undefined".to_string(), |f| format!("{:.2}", f)),
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::markdown()));
    for (dataset_id, err) in &report.excluded {
        println!("excluded {}: {}", dataset_id, err);
    }
}
