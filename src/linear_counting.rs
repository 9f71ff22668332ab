//! ## Linear Counting sketch
//! Baseline bitmap counter: every hash sets one bit of an `N`-bit vector and the
//! cardinality is recovered from the fraction `z` of bits still unset as `-N * ln(z)`.
//!
//! Once every bit is set the estimate has no finite value and [`SketchError::Saturated`]
//! is returned instead of a number; `N` must be sized for the expected cardinality.
use std::mem::{size_of, size_of_val};

use crate::error::SketchError;
use crate::sketch::SketchTrait;

/// Default bit vector length
pub const DEFAULT_NUM_BITS: usize = 16384;
/// Maximum bit vector length
pub const MAX_NUM_BITS: usize = 1 << 30;

#[derive(Debug, Clone, PartialEq)]
pub struct LinearCounting {
    /// Bit vector length
    num_bits: usize,
    /// Bit vector words
    bits: Vec<u64>,
    /// Number of bits set
    ones: usize,
}

impl LinearCounting {
    /// Create new empty `LinearCounting` with `num_bits` bits
    pub fn new(num_bits: usize) -> Result<Self, SketchError> {
        if num_bits == 0 || num_bits > MAX_NUM_BITS {
            return Err(SketchError::InvalidParameter {
                sketch: "LinearCounting",
                parameter: "num_bits",
            });
        }
        Ok(Self {
            num_bits,
            bits: vec![0; num_bits.div_ceil(64)],
            ones: 0,
        })
    }

    /// Return bit vector length
    #[inline]
    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    /// Return number of bits set
    #[inline]
    pub fn ones(&self) -> usize {
        self.ones
    }

    /// Return bit vector words
    #[inline]
    pub fn bits(&self) -> &[u64] {
        &self.bits
    }

    /// Return whether every bit is set
    #[inline]
    pub fn is_saturated(&self) -> bool {
        self.ones == self.num_bits
    }

    /// Set bit `idx`, counting it if it was unset
    #[inline]
    fn set_bit(&mut self, idx: usize) {
        let word = &mut self.bits[idx / 64];
        let mask = 1u64 << (idx % 64);
        if *word & mask == 0 {
            *word |= mask;
            self.ones += 1;
        }
    }

    /// Merge `rhs` into `self` with bitwise OR
    pub fn merge(&mut self, rhs: &LinearCounting) -> Result<(), SketchError> {
        if self.num_bits != rhs.num_bits {
            return Err(SketchError::IncompatibleMerge {
                lhs: format!("LinearCounting(n={})", self.num_bits),
                rhs: format!("LinearCounting(n={})", rhs.num_bits),
            });
        }
        for (lhs, rhs) in self.bits.iter_mut().zip(&rhs.bits) {
            *lhs |= rhs;
        }
        self.ones = self.bits.iter().map(|w| w.count_ones() as usize).sum();
        Ok(())
    }
}

impl SketchTrait for LinearCounting {
    #[inline]
    fn insert_hash(&mut self, hash: u64) {
        // multiply-shift maps the full hash range onto [0, num_bits) without modulo bias
        let idx = ((u128::from(hash) * self.num_bits as u128) >> 64) as usize;
        self.set_bit(idx);
    }

    fn estimate(&self) -> Result<f64, SketchError> {
        if self.is_empty() {
            return Ok(0.0);
        }
        if self.is_saturated() {
            return Err(SketchError::Saturated {
                num_bits: self.num_bits,
            });
        }
        let n = self.num_bits as f64;
        let z = (self.num_bits - self.ones) as f64 / n;
        Ok(-n * z.ln())
    }

    #[inline]
    fn size_of(&self) -> usize {
        size_of::<Self>() + size_of_val(self.bits.as_slice())
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.ones == 0
    }
}
