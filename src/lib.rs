//! `stream-order-sensitivity` estimates the number of distinct elements in a stream with
//! sub-linear memory sketches and measures how the arrival order of the same multiset
//! affects how fast those estimates converge.
//!
//! Sketches (HyperLogLog plus Flajolet-Martin, Linear Counting and K-Minimum-Values
//! baselines) are driven by a convergence harness which replays grouped, random and
//! chronological orderings of a stream and reduces them to a sensitivity factor.
pub mod error;
pub mod experiment;
pub mod flajolet_martin;
pub mod harness;
pub mod hasher;
pub mod hyperloglog;
pub mod kmv;
pub mod linear_counting;
pub mod ordering;
pub mod sensitivity;
pub mod sketch;

pub use crate::error::{HarnessError, SketchError};
pub use crate::experiment::{Experiment, ExperimentConfig, ExperimentRecord};
pub use crate::harness::{CheckpointRecord, ConvergenceHarness, OrderingResult};
pub use crate::hasher::UniformHasher;
pub use crate::ordering::{OrderingGenerator, OrderingKind};
pub use crate::sensitivity::{DatasetInfo, SensitivityCalculator, SensitivityRecord};
pub use crate::sketch::{Sketch, SketchConfig, SketchTrait};
