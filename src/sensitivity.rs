//! Order sensitivity of one dataset.
//!
//! The sensitivity factor is the grouped ordering's time-to-threshold divided by the
//! random ordering's: a factor above 1 means the grouped stream needs more items to
//! settle within the error bound. If either ordering never settles the factor is
//! undefined (`None`) rather than a ratio against the stream length.
use crate::error::HarnessError;
use crate::harness::OrderingResult;

/// Labels describing a dataset, supplied by the caller
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DatasetInfo {
    pub dataset_id: String,
    /// Exact number of distinct items, computed by the data provider
    pub unique_count: usize,
    pub total_count: usize,
    /// `1 - unique_count / total_count`
    pub duplicate_ratio: f64,
    pub bursts: Option<BurstStats>,
}

impl DatasetInfo {
    /// Creates new dataset labels from exact counts
    pub fn new(dataset_id: impl Into<String>, unique_count: usize, total_count: usize) -> Self {
        let duplicate_ratio = if total_count == 0 {
            0.0
        } else {
            1.0 - unique_count as f64 / total_count as f64
        };
        Self {
            dataset_id: dataset_id.into(),
            unique_count,
            total_count,
            duplicate_ratio,
            bursts: None,
        }
    }

    /// Check that the labels can describe a stream of `len` items.
    ///
    /// `total_count` must equal `len` and `unique_count` cannot exceed it, otherwise
    /// `duplicate_ratio` would be negative.
    pub fn check(&self, len: usize) -> Result<(), HarnessError> {
        if self.total_count != len || self.unique_count > self.total_count {
            return Err(HarnessError::InvalidDataset {
                dataset_id: self.dataset_id.clone(),
                unique_count: self.unique_count,
                total_count: self.total_count,
                len,
            });
        }
        Ok(())
    }

    /// Attach burst statistics of the chronological stream
    pub fn with_bursts(mut self, bursts: BurstStats) -> Self {
        self.bursts = Some(bursts);
        self
    }
}

/// Runs of identical consecutive items in a stream
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BurstStats {
    /// Number of runs of two or more identical items
    pub burst_count: usize,
    pub mean_burst_length: f64,
    pub max_burst_length: usize,
}

impl BurstStats {
    /// Scan `items` in order and collect run statistics
    pub fn from_stream<T: PartialEq>(items: &[T]) -> Self {
        let mut stats = BurstStats::default();
        let mut total = 0;
        for run in items.chunk_by(|a, b| a == b) {
            if run.len() > 1 {
                stats.burst_count += 1;
                stats.max_burst_length = stats.max_burst_length.max(run.len());
                total += run.len();
            }
        }
        if stats.burst_count > 0 {
            stats.mean_burst_length = total as f64 / stats.burst_count as f64;
        }
        stats
    }
}

/// Per-ordering results of one dataset
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderingResults {
    pub grouped: OrderingResult,
    pub random: OrderingResult,
    pub chronological: OrderingResult,
}

/// Order sensitivity of one dataset
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensitivityRecord {
    pub dataset_id: String,
    pub duplicate_ratio: f64,
    pub unique_count: usize,
    pub total_count: usize,
    /// grouped / random time-to-threshold, `None` when undefined
    pub sensitivity_factor: Option<f64>,
}

/// Reduces per-ordering checkpoint series to a sensitivity record
#[derive(Debug, Clone, Copy, Default)]
pub struct SensitivityCalculator;

impl SensitivityCalculator {
    /// Compute sensitivity record from recorded results
    pub fn compute(&self, dataset: &DatasetInfo, results: &OrderingResults) -> SensitivityRecord {
        SensitivityRecord {
            dataset_id: dataset.dataset_id.clone(),
            duplicate_ratio: dataset.duplicate_ratio,
            unique_count: dataset.unique_count,
            total_count: dataset.total_count,
            sensitivity_factor: sensitivity_factor(
                results.grouped.time_to_threshold,
                results.random.time_to_threshold,
            ),
        }
    }
}

/// Return `grouped / random`, or `None` if either never reached the threshold.
///
/// A zero random time (settled before the first checkpoint) also yields `None` since the
/// ratio would not be finite.
pub fn sensitivity_factor(grouped: Option<usize>, random: Option<usize>) -> Option<f64> {
    match (grouped, random) {
        (Some(grouped), Some(random)) if grouped > 0 && random > 0 => {
            Some(grouped as f64 / random as f64)
        }
        _ => None,
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::harness::CheckpointRecord;
    use crate::ordering::OrderingKind;
    use test_case::test_case;

    fn result(ordering_name: OrderingKind, time_to_threshold: Option<usize>) -> OrderingResult {
        OrderingResult {
            ordering_name,
            checkpoints: vec![CheckpointRecord {
                stream_position: 100,
                items_processed_fraction: 1.0,
                estimate: 10.0,
                true_cardinality: 10,
                relative_error: 0.0,
            }],
            time_to_threshold,
            final_error: 0.0,
        }
    }

    #[test_case(Some(900), Some(300) => Some(3.0); "grouped slower")]
    #[test_case(Some(300), Some(600) => Some(0.5); "grouped faster")]
    #[test_case(None, Some(300) => None; "grouped never settles")]
    #[test_case(Some(300), None => None; "random never settles")]
    #[test_case(None, None => None; "neither settles")]
    fn test_sensitivity_factor(grouped: Option<usize>, random: Option<usize>) -> Option<f64> {
        sensitivity_factor(grouped, random)
    }

    #[test]
    fn test_compute() {
        let dataset = DatasetInfo::new("enron", 250, 1_000);
        let results = OrderingResults {
            grouped: result(OrderingKind::Grouped, Some(950)),
            random: result(OrderingKind::Random, Some(100)),
            chronological: result(OrderingKind::Chronological, None),
        };
        let record = SensitivityCalculator.compute(&dataset, &results);
        assert_eq!(
            record,
            SensitivityRecord {
                dataset_id: "enron".to_string(),
                duplicate_ratio: 0.75,
                unique_count: 250,
                total_count: 1_000,
                sensitivity_factor: Some(9.5),
            }
        );
    }

    #[test_case(250, 1_000, 1_000 => true; "consistent")]
    #[test_case(1_000, 1_000, 1_000 => true; "all distinct")]
    #[test_case(250, 1_000, 999 => false; "total differs from stream")]
    #[test_case(2_000, 1_000, 1_000 => false; "more unique than total")]
    fn test_check(unique_count: usize, total_count: usize, len: usize) -> bool {
        let dataset = DatasetInfo::new("labels", unique_count, total_count);
        match dataset.check(len) {
            Ok(()) => true,
            Err(err) => {
                assert_eq!(
                    err,
                    HarnessError::InvalidDataset {
                        dataset_id: "labels".to_string(),
                        unique_count,
                        total_count,
                        len,
                    }
                );
                false
            }
        }
    }

    #[test]
    fn test_burst_stats() {
        let stats = BurstStats::from_stream(&["a", "a", "a", "b", "c", "c", "a", "d", "d", "d", "d"]);
        assert_eq!(stats.burst_count, 3);
        assert_eq!(stats.max_burst_length, 4);
        assert!((stats.mean_burst_length - 3.0).abs() < 1e-12);
        assert_eq!(BurstStats::from_stream::<u8>(&[]), BurstStats::default());
    }
}
