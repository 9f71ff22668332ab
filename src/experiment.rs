//! Experiment driver: one dataset in, one self-describing record out.
//!
//! For every dataset the three canonical orderings are generated, checked to hold the
//! same multiset, replayed through independent sketches in parallel and reduced to a
//! [`SensitivityRecord`]. Runs share no mutable state: each owns its sketch and reads an
//! immutable ordering.
use std::hash::Hash;

use log::{info, warn};
use rayon::prelude::*;

use crate::error::HarnessError;
use crate::harness::{
    ConvergenceHarness, OrderingResult, DEFAULT_CHECKPOINT_COUNT, DEFAULT_ERROR_BOUND,
};
use crate::hasher::UniformHasher;
use crate::ordering::{OrderingGenerator, OrderingKind, DEFAULT_CHUNK_SIZE, DEFAULT_ORDERING_SEED};
use crate::sensitivity::{
    BurstStats, DatasetInfo, OrderingResults, SensitivityCalculator, SensitivityRecord,
};
use crate::sketch::SketchConfig;

/// Experiment parameters. All randomness is derived from the two seeds.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "with_serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ExperimentConfig {
    pub sketch: SketchConfig,
    pub hash_seed: u64,
    pub ordering_seed: u64,
    pub checkpoint_count: usize,
    pub error_bound: f64,
    /// Chunk size of the optional chunk-shuffled ordering
    pub chunk_size: usize,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            sketch: SketchConfig::default(),
            hash_seed: 0,
            ordering_seed: DEFAULT_ORDERING_SEED,
            checkpoint_count: DEFAULT_CHECKPOINT_COUNT,
            error_bound: DEFAULT_ERROR_BOUND,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ExperimentConfig {
    /// Validate parameters without running anything
    pub fn validate(&self) -> Result<(), HarnessError> {
        self.harness().map(|_| ())
    }

    /// Check every parameter and build the harness they describe
    fn harness(&self) -> Result<ConvergenceHarness, HarnessError> {
        if self.checkpoint_count == 0 {
            return Err(HarnessError::ZeroCheckpoints);
        }
        if self.chunk_size == 0 {
            return Err(HarnessError::ZeroChunkSize);
        }
        ConvergenceHarness::new(self.sketch, UniformHasher::new(self.hash_seed), self.error_bound)
    }
}

/// Everything measured for one dataset
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExperimentRecord {
    pub dataset: DatasetInfo,
    pub sketch: SketchConfig,
    pub error_bound: f64,
    pub results: OrderingResults,
    pub sensitivity: SensitivityRecord,
}

/// Input of a batch run
#[derive(Debug, Clone)]
pub struct Dataset<T> {
    pub info: DatasetInfo,
    pub items: Vec<T>,
    /// Whether `items` are in a meaningful arrival order
    pub natural_order: bool,
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub records: Vec<ExperimentRecord>,
    /// Datasets skipped because a precondition failed, with the reason
    pub excluded: Vec<(String, HarnessError)>,
}

/// Drives convergence experiments with one configuration
#[derive(Debug, Clone, Copy)]
pub struct Experiment {
    config: ExperimentConfig,
    harness: ConvergenceHarness,
    generator: OrderingGenerator,
}

impl Experiment {
    /// Creates new experiment, validating `config`
    pub fn new(config: ExperimentConfig) -> Result<Self, HarnessError> {
        Ok(Self {
            config,
            harness: config.harness()?,
            generator: OrderingGenerator::new(config.ordering_seed),
        })
    }

    /// Return experiment configuration
    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Run the three canonical orderings of `items` and derive the sensitivity record.
    ///
    /// `dataset.unique_count` is used as the true cardinality. Labels that do not match
    /// `items` are rejected with [`HarnessError::InvalidDataset`].
    pub fn run<T>(
        &self,
        dataset: &DatasetInfo,
        items: &[T],
        natural_order: bool,
    ) -> Result<ExperimentRecord, HarnessError>
    where
        T: Ord + Hash + Clone + Sync,
    {
        dataset.check(items.len())?;
        let orderings = self.generator.generate(items, natural_order)?;
        let truth = dataset.unique_count;
        let (grouped, (random, chronological)) = rayon::join(
            || self.run_ordering(OrderingKind::Grouped, &orderings.grouped, truth),
            || {
                rayon::join(
                    || self.run_ordering(OrderingKind::Random, &orderings.random, truth),
                    || {
                        self.run_ordering(
                            OrderingKind::Chronological,
                            &orderings.chronological,
                            truth,
                        )
                    },
                )
            },
        );

        let results = OrderingResults {
            grouped: grouped?,
            random: random?,
            chronological: chronological?,
        };
        let sensitivity = SensitivityCalculator.compute(dataset, &results);
        info!(
            "dataset {}: sensitivity factor = {:?}",
            dataset.dataset_id, sensitivity.sensitivity_factor
        );

        Ok(ExperimentRecord {
            dataset: dataset.clone(),
            sketch: self.config.sketch,
            error_bound: self.config.error_bound,
            results,
            sensitivity,
        })
    }

    /// Run one ordering through a fresh sketch
    pub fn run_ordering<T: Hash>(
        &self,
        kind: OrderingKind,
        items: &[T],
        true_cardinality: usize,
    ) -> Result<OrderingResult, HarnessError> {
        self.harness
            .run(kind, items, true_cardinality, self.config.checkpoint_count)
    }

    /// Run the chunk-shuffled ordering of `items`
    pub fn run_chunk_shuffled<T: Hash + Eq + Clone>(
        &self,
        items: &[T],
        true_cardinality: usize,
    ) -> Result<OrderingResult, HarnessError> {
        let shuffled = self.generator.chunk_shuffled(items, self.config.chunk_size)?;
        crate::ordering::verify_multiset(OrderingKind::ChunkShuffled, items, &shuffled)?;
        self.run_ordering(OrderingKind::ChunkShuffled, &shuffled, true_cardinality)
    }

    /// Run many datasets in parallel.
    ///
    /// A dataset whose run fails is logged and listed in [`BatchReport::excluded`]; the
    /// remaining datasets are still reported.
    pub fn run_all<T>(&self, datasets: &[Dataset<T>]) -> BatchReport
    where
        T: Ord + Hash + Clone + Send + Sync,
    {
        let outcomes: Vec<_> = datasets
            .par_iter()
            .map(|dataset| {
                let info = match dataset.info.bursts {
                    Some(_) => dataset.info.clone(),
                    None if dataset.natural_order => dataset
                        .info
                        .clone()
                        .with_bursts(BurstStats::from_stream(&dataset.items)),
                    None => dataset.info.clone(),
                };
                (
                    info.dataset_id.clone(),
                    self.run(&info, &dataset.items, dataset.natural_order),
                )
            })
            .collect();

        let mut report = BatchReport::default();
        for (dataset_id, outcome) in outcomes {
            match outcome {
                Ok(record) => report.records.push(record),
                Err(err) => {
                    warn!("dataset {} excluded: {}", dataset_id, err);
                    report.excluded.push((dataset_id, err));
                }
            }
        }
        report
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    fn items() -> Vec<String> {
        // 40 distinct values, each repeated 25 times in bursts of 5
        (0..1_000)
            .map(|i| format!("user_{}", (i / 5) % 40))
            .collect()
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(ExperimentConfig::default().validate().is_ok());
        assert!(Experiment::new(ExperimentConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let config = ExperimentConfig {
            checkpoint_count: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(HarnessError::ZeroCheckpoints));

        let config = ExperimentConfig {
            sketch: SketchConfig::HyperLogLog { precision: 30 },
            ..Default::default()
        };
        assert!(Experiment::new(config).is_err());
    }

    #[test]
    fn test_run_produces_all_orderings() {
        let items = items();
        let dataset = DatasetInfo::new("bursty", 40, items.len());
        let record = Experiment::new(ExperimentConfig::default())
            .unwrap()
            .run(&dataset, &items, true)
            .unwrap();

        assert_eq!(record.results.grouped.ordering_name, OrderingKind::Grouped);
        assert_eq!(record.results.random.ordering_name, OrderingKind::Random);
        assert_eq!(
            record.results.chronological.ordering_name,
            OrderingKind::Chronological
        );
        for result in [
            &record.results.grouped,
            &record.results.random,
            &record.results.chronological,
        ] {
            assert_eq!(result.checkpoints.len(), 20);
        }
        // identical multisets end with identical sketch state
        assert_eq!(
            record.results.grouped.final_error,
            record.results.random.final_error
        );
        assert_eq!(record.sensitivity.dataset_id, "bursty");
    }

    #[test]
    fn test_run_rejects_mismatched_labels() {
        let items = items();
        let experiment = Experiment::new(ExperimentConfig::default()).unwrap();

        let dataset = DatasetInfo::new("stale", 40, 2_000);
        assert_eq!(
            experiment.run(&dataset, &items, true),
            Err(HarnessError::InvalidDataset {
                dataset_id: "stale".to_string(),
                unique_count: 40,
                total_count: 2_000,
                len: 1_000,
            })
        );

        let dataset = DatasetInfo::new("inflated", 1_500, items.len());
        assert!(dataset.duplicate_ratio < 0.0);
        assert!(matches!(
            experiment.run(&dataset, &items, true),
            Err(HarnessError::InvalidDataset { .. })
        ));
    }

    #[test]
    fn test_run_is_reproducible() {
        let items = items();
        let dataset = DatasetInfo::new("bursty", 40, items.len());
        let experiment = Experiment::new(ExperimentConfig::default()).unwrap();
        let a = experiment.run(&dataset, &items, false).unwrap();
        let b = experiment.run(&dataset, &items, false).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.results.random.checkpoints, a.results.chronological.checkpoints);
    }

    #[test]
    fn test_run_all_excludes_failures() {
        let experiment = Experiment::new(ExperimentConfig::default()).unwrap();
        let items = items();
        let datasets = vec![
            Dataset {
                info: DatasetInfo::new("ok", 40, items.len()),
                items: items.clone(),
                natural_order: true,
            },
            Dataset {
                info: DatasetInfo::new("too short", 3, 3),
                items: vec!["a".to_string(), "b".to_string(), "c".to_string()],
                natural_order: true,
            },
        ];
        let report = experiment.run_all(&datasets);
        assert_eq!(report.records.len(), 1);
        assert!(report.records[0].dataset.bursts.is_some());
        assert_eq!(
            report.excluded,
            vec![(
                "too short".to_string(),
                HarnessError::TooFewItems {
                    len: 3,
                    checkpoints: 20
                }
            )]
        );
    }

    #[test]
    fn test_run_chunk_shuffled() {
        let items = items();
        let experiment = Experiment::new(ExperimentConfig {
            chunk_size: 100,
            ..Default::default()
        })
        .unwrap();
        let result = experiment.run_chunk_shuffled(&items, 40).unwrap();
        assert_eq!(result.ordering_name, OrderingKind::ChunkShuffled);
        assert_eq!(result.checkpoints.len(), 20);
    }
}
