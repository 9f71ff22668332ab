//! Error types shared by the sketches and the convergence harness.
use thiserror::Error;

use crate::ordering::OrderingKind;

/// Errors raised by sketch construction, merging and estimation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SketchError {
    #[error("HyperLogLog precision {0} is outside of the supported [4..18] range")]
    InvalidPrecision(u8),
    #[error("{sketch} `{parameter}` is outside of the supported range")]
    InvalidParameter {
        sketch: &'static str,
        parameter: &'static str,
    },
    #[error("cannot merge {rhs} into {lhs}")]
    IncompatibleMerge { lhs: String, rhs: String },
    /// Every bit of a linear counting vector is set, so `-n * ln(0)` has no finite value.
    #[error("linear counting bit vector of {num_bits} bits is saturated")]
    Saturated { num_bits: usize },
}

/// Errors raised while replaying a stream through the convergence harness.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HarnessError {
    #[error("stream is empty")]
    EmptyStream,
    #[error("true cardinality must be positive")]
    ZeroCardinality,
    #[error("checkpoint count must be positive")]
    ZeroCheckpoints,
    #[error("stream of {len} items is too short for {checkpoints} distinct checkpoints")]
    TooFewItems { len: usize, checkpoints: usize },
    #[error("error bound {0} must be a finite non-negative number")]
    InvalidErrorBound(f64),
    #[error("chunk size must be positive")]
    ZeroChunkSize,
    /// Dataset labels disagree with the stream they describe.
    #[error(
        "dataset {dataset_id} claims {unique_count} unique of {total_count} items, \
         but the stream holds {len} items"
    )]
    InvalidDataset {
        dataset_id: String,
        unique_count: usize,
        total_count: usize,
        len: usize,
    },
    #[error("{ordering} ordering does not hold the same multiset of items as the input")]
    MultisetMismatch { ordering: OrderingKind },
    #[error("estimate failed at stream position {position}")]
    Estimate {
        position: usize,
        #[source]
        source: SketchError,
    },
    #[error(transparent)]
    Sketch(#[from] SketchError),
}
