#![cfg(feature = "with_serde")]

use serde_json::Value;
use stream_order_sensitivity::{
    DatasetInfo, Experiment, ExperimentConfig, ExperimentRecord, SketchConfig,
};

fn record(config: ExperimentConfig, items: &[String], unique_count: usize) -> ExperimentRecord {
    let dataset = DatasetInfo::new("dataset", unique_count, items.len());
    Experiment::new(config)
        .unwrap()
        .run(&dataset, items, true)
        .unwrap()
}

#[test]
fn test_record_json_fields() {
    let items: Vec<String> = (0..2_000).map(|i| format!("item_{}", i % 500)).collect();
    let record = record(ExperimentConfig::default(), &items, 500);
    let json: Value = serde_json::to_value(&record).unwrap();

    assert_eq!(json["dataset"]["dataset_id"], "dataset");
    assert_eq!(json["dataset"]["unique_count"], 500);
    assert_eq!(json["dataset"]["total_count"], 2_000);
    assert_eq!(json["sketch"]["type"], "hyper_log_log");
    assert_eq!(json["sketch"]["precision"], 10);
    assert_eq!(json["results"]["grouped"]["ordering_name"], "grouped");
    assert_eq!(
        json["results"]["random"]["checkpoints"]
            .as_array()
            .unwrap()
            .len(),
        20
    );
    let checkpoint = &json["results"]["chronological"]["checkpoints"][19];
    assert_eq!(checkpoint["stream_position"], 2_000);
    assert_eq!(checkpoint["items_processed_fraction"], 1.0);

    let decoded: ExperimentRecord = serde_json::from_value(json).unwrap();
    assert_eq!(decoded.dataset.dataset_id, record.dataset.dataset_id);
    assert_eq!(decoded.sketch, record.sketch);
    assert_eq!(
        decoded.results.random.time_to_threshold,
        record.results.random.time_to_threshold
    );
}

#[test]
fn test_undefined_sensitivity_is_null() {
    // a zero error bound is only met by an exact estimate, which HyperLogLog never
    // gives for a stream of this size, so no ordering settles
    let items: Vec<String> = (0..1_000).map(|i| format!("item_{}", i % 700)).collect();
    let config = ExperimentConfig {
        error_bound: 0.0,
        ..Default::default()
    };
    let record = record(config, &items, 700);
    assert_eq!(record.sensitivity.sensitivity_factor, None);

    let json: Value = serde_json::to_value(&record).unwrap();
    assert!(json["sensitivity"]["sensitivity_factor"].is_null());
    assert!(json["results"]["grouped"]["time_to_threshold"].is_null());
}

#[test]
fn test_config_defaults_fill_missing_fields() {
    let config: ExperimentConfig =
        serde_json::from_str(r#"{"sketch": {"type": "kmv", "k": 128}, "hash_seed": 9}"#).unwrap();
    assert_eq!(config.sketch, SketchConfig::Kmv { k: 128 });
    assert_eq!(config.hash_seed, 9);
    assert_eq!(config.checkpoint_count, 20);
    assert_eq!(config.error_bound, 0.05);
    assert_eq!(config.ordering_seed, 42);

    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(serde_json::from_str::<ExperimentConfig>(&json).unwrap(), config);
}
