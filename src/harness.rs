//! Convergence harness replays one ordered stream through a fresh sketch and samples the
//! relative estimation error at evenly spaced checkpoints.
//!
//! A checkpoint is taken after `i * len / checkpoint_count` items for
//! `i in 1..=checkpoint_count`, so the last checkpoint always covers the whole stream.
//! The sketch is created per run and dropped at the end of it; the harness never rewinds.
use std::hash::Hash;

use log::{debug, info};

use crate::error::HarnessError;
use crate::hasher::UniformHasher;
use crate::ordering::OrderingKind;
use crate::sketch::{Sketch, SketchConfig};

/// Default number of checkpoints per run
pub const DEFAULT_CHECKPOINT_COUNT: usize = 20;
/// Default relative error threshold for time-to-threshold
pub const DEFAULT_ERROR_BOUND: f64 = 0.05;

/// Error sampled at one checkpoint
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CheckpointRecord {
    /// Number of items processed
    pub stream_position: usize,
    /// `stream_position / stream length`
    pub items_processed_fraction: f64,
    pub estimate: f64,
    pub true_cardinality: usize,
    /// `|estimate - true_cardinality| / true_cardinality`
    pub relative_error: f64,
}

/// Checkpoint series of one ordering
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderingResult {
    pub ordering_name: OrderingKind,
    pub checkpoints: Vec<CheckpointRecord>,
    /// First position after which the error stays within the harness error bound,
    /// `None` if the series never settles.
    pub time_to_threshold: Option<usize>,
    pub final_error: f64,
}

/// Summary statistics of a checkpoint series
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConvergenceMetrics {
    pub time_to_threshold: Option<usize>,
    pub error_at_10_percent: f64,
    pub error_at_25_percent: f64,
    pub error_at_50_percent: f64,
    pub final_error: f64,
    /// Population standard deviation of relative errors across checkpoints
    pub error_stability: f64,
}

impl OrderingResult {
    /// Recompute time-to-threshold for another error bound
    pub fn time_to_threshold(&self, error_bound: f64) -> Option<usize> {
        time_to_threshold(&self.checkpoints, error_bound)
    }

    /// Return relative error at the first checkpoint covering `fraction` of the stream
    pub fn error_at(&self, fraction: f64) -> Option<f64> {
        self.checkpoints
            .iter()
            .find(|c| c.items_processed_fraction >= fraction)
            .map(|c| c.relative_error)
    }

    /// Return summary statistics of the series
    pub fn metrics(&self) -> ConvergenceMetrics {
        let errors: Vec<f64> = self.checkpoints.iter().map(|c| c.relative_error).collect();
        let n = errors.len().max(1) as f64;
        let mean = errors.iter().sum::<f64>() / n;
        let variance = errors.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / n;
        ConvergenceMetrics {
            time_to_threshold: self.time_to_threshold,
            error_at_10_percent: self.error_at(0.10).unwrap_or(self.final_error),
            error_at_25_percent: self.error_at(0.25).unwrap_or(self.final_error),
            error_at_50_percent: self.error_at(0.50).unwrap_or(self.final_error),
            final_error: self.final_error,
            error_stability: variance.sqrt(),
        }
    }
}

/// First checkpoint position from which every later checkpoint stays within `error_bound`.
///
/// Returns `None` when the last checkpoint is above the bound (or there are none), so a
/// stream that never converges is not mistaken for one converging at its very end.
pub fn time_to_threshold(checkpoints: &[CheckpointRecord], error_bound: f64) -> Option<usize> {
    let settled = checkpoints
        .iter()
        .rev()
        .take_while(|c| c.relative_error <= error_bound)
        .count();
    if settled == 0 {
        return None;
    }
    Some(checkpoints[checkpoints.len() - settled].stream_position)
}

/// Return `checkpoint_count` strictly increasing stream positions ending at `len`
pub fn checkpoint_positions(
    len: usize,
    checkpoint_count: usize,
) -> Result<Vec<usize>, HarnessError> {
    if len == 0 {
        return Err(HarnessError::EmptyStream);
    }
    if checkpoint_count == 0 {
        return Err(HarnessError::ZeroCheckpoints);
    }
    if checkpoint_count > len {
        return Err(HarnessError::TooFewItems {
            len,
            checkpoints: checkpoint_count,
        });
    }
    // i * len / count, split so that i * len cannot overflow
    let (step, rem) = (len / checkpoint_count, len % checkpoint_count);
    Ok((1..=checkpoint_count)
        .map(|i| step * i + rem * i / checkpoint_count)
        .collect())
}

/// Replays ordered streams through fresh sketches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceHarness {
    sketch: SketchConfig,
    hasher: UniformHasher,
    error_bound: f64,
}

impl ConvergenceHarness {
    /// Creates new harness building sketches from `sketch` and `hasher`
    pub fn new(
        sketch: SketchConfig,
        hasher: UniformHasher,
        error_bound: f64,
    ) -> Result<Self, HarnessError> {
        if !error_bound.is_finite() || error_bound < 0.0 {
            return Err(HarnessError::InvalidErrorBound(error_bound));
        }
        // surface invalid sketch parameters before any run
        sketch.build()?;
        Ok(Self {
            sketch,
            hasher,
            error_bound,
        })
    }

    /// Return relative error bound used for time-to-threshold
    pub fn error_bound(&self) -> f64 {
        self.error_bound
    }

    /// Return sketch configuration
    pub fn sketch_config(&self) -> SketchConfig {
        self.sketch
    }

    /// Run `items` through a fresh sketch, recording `checkpoint_count` checkpoints.
    ///
    /// `true_cardinality` is trusted as ground truth. Fails on empty streams, on a zero
    /// cardinality, when the stream is shorter than `checkpoint_count`, or when the sketch
    /// cannot produce an estimate at a checkpoint.
    pub fn run<I>(
        &self,
        ordering: OrderingKind,
        items: I,
        true_cardinality: usize,
        checkpoint_count: usize,
    ) -> Result<OrderingResult, HarnessError>
    where
        I: IntoIterator,
        I::Item: Hash,
        I::IntoIter: ExactSizeIterator,
    {
        if true_cardinality == 0 {
            return Err(HarnessError::ZeroCardinality);
        }
        let items = items.into_iter();
        let len = items.len();
        let positions = checkpoint_positions(len, checkpoint_count)?;

        let mut sketch = Sketch::new(self.sketch, self.hasher)?;
        let mut checkpoints = Vec::with_capacity(checkpoint_count);
        let mut next = positions.iter().peekable();
        let truth = true_cardinality as f64;

        for (idx, item) in items.enumerate() {
            sketch.insert(&item);
            let position = idx + 1;
            if next.next_if(|&&p| p == position).is_none() {
                continue;
            }
            let estimate = sketch
                .estimate()
                .map_err(|source| HarnessError::Estimate { position, source })?;
            let relative_error = (estimate - truth).abs() / truth;
            debug!(
                "{} checkpoint at {}/{}: estimate = {:.1}, error = {:.4}",
                ordering, position, len, estimate, relative_error
            );
            checkpoints.push(CheckpointRecord {
                stream_position: position,
                items_processed_fraction: position as f64 / len as f64,
                estimate,
                true_cardinality,
                relative_error,
            });
        }

        let final_error = checkpoints.last().map_or(f64::INFINITY, |c| c.relative_error);
        let time_to_threshold = time_to_threshold(&checkpoints, self.error_bound);
        info!(
            "{} ordering with {}: {} items, final error = {:.4}, time to {} error = {:?}",
            ordering,
            sketch.kind().name(),
            len,
            final_error,
            self.error_bound,
            time_to_threshold
        );

        Ok(OrderingResult {
            ordering_name: ordering,
            checkpoints,
            time_to_threshold,
            final_error,
        })
    }
}
