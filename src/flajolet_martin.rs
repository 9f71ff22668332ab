//! ## Flajolet-Martin sketch
//! Baseline probabilistic counter kept for comparison with HyperLogLog.
//!
//! State is a bit matrix of `K` rows, one 64-bit vector per independent hash function.
//! Each item sets, in every row, the bit at the position of the lowest set bit of that
//! row's hash. The first unset bit `R` of a row grows like `log2` of the cardinality.
//!
//! Its variance is much higher than HyperLogLog's; that is expected from a baseline.
use std::mem::{size_of, size_of_val};

use crate::error::SketchError;
use crate::hasher::remix;
use crate::sketch::SketchTrait;

/// Default number of rows (independent hash functions)
pub const DEFAULT_NUM_HASHES: usize = 64;
/// Maximum number of rows
pub const MAX_NUM_HASHES: usize = 4096;

/// Flajolet-Martin `phi` correction constant
const PHI: f64 = 0.77351;

#[derive(Debug, Clone, PartialEq)]
pub struct FlajoletMartin {
    rows: Vec<u64>,
}

impl FlajoletMartin {
    /// Create new empty `FlajoletMartin` with `num_hashes` rows
    pub fn new(num_hashes: usize) -> Result<Self, SketchError> {
        if num_hashes == 0 || num_hashes > MAX_NUM_HASHES {
            return Err(SketchError::InvalidParameter {
                sketch: "FlajoletMartin",
                parameter: "num_hashes",
            });
        }
        Ok(Self {
            rows: vec![0; num_hashes],
        })
    }

    /// Return number of rows
    #[inline]
    pub fn num_hashes(&self) -> usize {
        self.rows.len()
    }

    /// Return bit matrix rows
    #[inline]
    pub fn rows(&self) -> &[u64] {
        &self.rows
    }

    /// Merge `rhs` into `self` with row-wise bitwise OR
    pub fn merge(&mut self, rhs: &FlajoletMartin) -> Result<(), SketchError> {
        if self.num_hashes() != rhs.num_hashes() {
            return Err(SketchError::IncompatibleMerge {
                lhs: format!("FlajoletMartin(k={})", self.num_hashes()),
                rhs: format!("FlajoletMartin(k={})", rhs.num_hashes()),
            });
        }
        for (lhs, rhs) in self.rows.iter_mut().zip(&rhs.rows) {
            *lhs |= rhs;
        }
        Ok(())
    }
}

impl SketchTrait for FlajoletMartin {
    #[inline]
    fn insert_hash(&mut self, hash: u64) {
        for (round, row) in self.rows.iter_mut().enumerate() {
            // zero hash has no set bit, clamp it to the last position
            let rho = remix(hash, round as u64).trailing_zeros().min(63);
            *row |= 1u64 << rho;
        }
    }

    fn estimate(&self) -> Result<f64, SketchError> {
        if self.is_empty() {
            return Ok(0.0);
        }
        let total: u32 = self.rows.iter().map(|row| (!row).trailing_zeros()).sum();
        let mean = f64::from(total) / self.num_hashes() as f64;
        Ok(mean.exp2() / PHI)
    }

    #[inline]
    fn size_of(&self) -> usize {
        size_of::<Self>() + size_of_val(self.rows.as_slice())
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.rows.iter().all(|&row| row == 0)
    }
}
