//! ## K-Minimum-Values sketch
//! Keeps the `K` smallest distinct hashes seen. While fewer than `K` hashes are retained
//! the count is exact (up to hash collisions); afterwards the `K`-th smallest hash `h_k`
//! bounds the density of hashes in the domain and the estimate is `(K - 1) * 2^64 / h_k`.
use std::collections::BTreeSet;
use std::mem::size_of;

use crate::error::SketchError;
use crate::sketch::SketchTrait;

/// Default number of retained hashes
pub const DEFAULT_K: usize = 512;

/// 2^64 as `f64`
const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

#[derive(Debug, Clone, PartialEq)]
pub struct KMinValues {
    k: usize,
    /// `k` smallest distinct hashes seen so far
    mins: BTreeSet<u64>,
}

impl KMinValues {
    /// Create new empty `KMinValues` retaining `k` hashes
    pub fn new(k: usize) -> Result<Self, SketchError> {
        // `k - 1` in the estimator must stay positive
        if k < 2 {
            return Err(SketchError::InvalidParameter {
                sketch: "KMinValues",
                parameter: "k",
            });
        }
        Ok(Self {
            k,
            mins: BTreeSet::new(),
        })
    }

    /// Return number of retained hashes `K`
    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Return retained hashes in ascending order
    pub fn hashes(&self) -> impl Iterator<Item = u64> + '_ {
        self.mins.iter().copied()
    }

    /// Insert hash, evicting the largest retained one when over capacity
    #[inline]
    fn offer(&mut self, hash: u64) {
        if self.mins.len() == self.k {
            match self.mins.last() {
                Some(&largest) if hash < largest => {
                    if self.mins.insert(hash) {
                        self.mins.remove(&largest);
                    }
                }
                _ => {}
            }
        } else {
            self.mins.insert(hash);
        }
    }

    /// Merge `rhs` into `self` keeping the `k` smallest hashes of the union
    pub fn merge(&mut self, rhs: &KMinValues) -> Result<(), SketchError> {
        if self.k != rhs.k {
            return Err(SketchError::IncompatibleMerge {
                lhs: format!("KMinValues(k={})", self.k),
                rhs: format!("KMinValues(k={})", rhs.k),
            });
        }
        for hash in rhs.hashes() {
            self.offer(hash);
        }
        Ok(())
    }
}

impl SketchTrait for KMinValues {
    #[inline]
    fn insert_hash(&mut self, hash: u64) {
        self.offer(hash);
    }

    fn estimate(&self) -> Result<f64, SketchError> {
        if self.mins.len() < self.k {
            return Ok(self.mins.len() as f64);
        }
        match self.mins.last() {
            // all `k` smallest hashes at zero means the domain is exhausted by collisions
            Some(&0) | None => Ok(self.mins.len() as f64),
            Some(&kth) => Ok((self.k - 1) as f64 * TWO_POW_64 / kth as f64),
        }
    }

    #[inline]
    fn size_of(&self) -> usize {
        size_of::<Self>() + self.mins.len() * size_of::<u64>()
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.mins.is_empty()
    }
}
