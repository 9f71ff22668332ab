//! ## HyperLogLog sketch
//! Estimates cardinality with `M = 2^P` registers, each holding the maximum rank (rho)
//! observed for the hashes routed to it.
//!
//! [Original HyperLogLog paper](https://algo.inria.fr/flajolet/Publications/FlFuGaMe07.pdf)
//!
//! Hash layout:
//! - 0..P bits     - register index
//! - P..64 bits    - remainder, whose leading zero run (+1) is the register rank
//!
//! A histogram of register ranks is updated incrementally whenever a register grows.
//! `estimate` derives the zero-register count and the harmonic sum from it in
//! `O(64)` without scanning the registers. Summing `count * 2^-rank` per rank keeps
//! every term exact, which a running `f64` sum does not once ranks get high.
use std::mem::{size_of, size_of_val};

use crate::error::SketchError;
use crate::sketch::SketchTrait;

/// Smallest supported precision
pub const MIN_PRECISION: u8 = 4;
/// Largest supported precision
pub const MAX_PRECISION: u8 = 18;
/// Default precision: 1024 registers, 1.04 / sqrt(1024) = 3.25% standard error
pub const DEFAULT_PRECISION: u8 = 10;

/// 2^64 as `f64`, the size of the hash domain
const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

/// Number of possible ranks: 0 up to `64 - MIN_PRECISION + 1`
const NUM_RANKS: usize = 62;

#[derive(Debug, Clone, PartialEq)]
pub struct HyperLogLog {
    /// Number of bits used for register index
    precision: u8,
    /// Register ranks, one byte per register
    registers: Vec<u8>,
    /// Number of registers holding each rank
    rank_counts: [u32; NUM_RANKS],
}

impl HyperLogLog {
    /// Create new empty `HyperLogLog` with `2^precision` registers
    pub fn new(precision: u8) -> Result<Self, SketchError> {
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&precision) {
            return Err(SketchError::InvalidPrecision(precision));
        }
        let m = 1usize << precision;
        let mut rank_counts = [0; NUM_RANKS];
        rank_counts[0] = 1 << precision;
        Ok(Self {
            precision,
            registers: vec![0; m],
            rank_counts,
        })
    }

    /// Return precision `P`
    #[inline]
    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// Return number of registers `M`
    #[inline]
    pub fn num_registers(&self) -> usize {
        self.registers.len()
    }

    /// Return register ranks
    #[inline]
    pub fn registers(&self) -> &[u8] {
        &self.registers
    }

    /// Highest rank a register can hold: all `64 - P` remainder bits zero, plus one.
    #[inline]
    fn max_rank(&self) -> u8 {
        64 - self.precision + 1
    }

    /// Split hash into register index and rank
    #[inline]
    fn decode_hash(&self, hash: u64) -> (usize, u8) {
        let p = u32::from(self.precision);
        let idx = (hash & ((1 << p) - 1)) as usize;
        // The remainder occupies the low `64 - P` bits of `w`, so its leading
        // zeros are those of `w` minus the `P` always-zero high bits.
        let w = hash >> p;
        let rank = (w.leading_zeros() - p + 1).min(u32::from(self.max_rank()));
        (idx, rank as u8)
    }

    /// Raise register `idx` to `new_rank` if it is higher than the current rank
    #[inline]
    fn update_rank(&mut self, idx: usize, new_rank: u8) {
        let old_rank = self.registers[idx];
        if new_rank > old_rank {
            self.registers[idx] = new_rank;
            self.rank_counts[usize::from(old_rank)] -= 1;
            self.rank_counts[usize::from(new_rank)] += 1;
        }
    }

    /// Merge `rhs` into `self` by taking register-wise maximum.
    ///
    /// Both sketches must use the same precision.
    pub fn merge(&mut self, rhs: &HyperLogLog) -> Result<(), SketchError> {
        if self.precision != rhs.precision {
            return Err(SketchError::IncompatibleMerge {
                lhs: format!("HyperLogLog(p={})", self.precision),
                rhs: format!("HyperLogLog(p={})", rhs.precision),
            });
        }
        for (idx, &rank) in rhs.registers.iter().enumerate() {
            self.update_rank(idx, rank);
        }
        Ok(())
    }

    /// Return number of registers still set to 0
    #[inline]
    pub fn zeros(&self) -> usize {
        self.rank_counts[0] as usize
    }

    /// Return `sum(2^-register)` over all registers.
    ///
    /// Ranks are summed from the highest down so small terms accumulate before they
    /// meet the large ones.
    pub fn harmonic_sum(&self) -> f64 {
        self.rank_counts
            .iter()
            .enumerate()
            .rev()
            .filter(|&(_, &count)| count > 0)
            .map(|(rank, &count)| f64::from(count) * inverse_pow2(rank as u8))
            .sum()
    }

    /// Uncorrected HyperLogLog estimate `alpha * M^2 / sum(2^-register)`
    #[inline]
    pub fn raw_estimate(&self) -> f64 {
        let m = self.num_registers() as f64;
        alpha(self.num_registers()) * m * m / self.harmonic_sum()
    }
}

impl SketchTrait for HyperLogLog {
    #[inline]
    fn insert_hash(&mut self, hash: u64) {
        let (idx, rank) = self.decode_hash(hash);
        self.update_rank(idx, rank);
    }

    /// Return cardinality estimate with small- and large-range corrections applied
    fn estimate(&self) -> Result<f64, SketchError> {
        let zeros = self.zeros();
        if zeros == self.num_registers() {
            return Ok(0.0);
        }
        let m = self.num_registers() as f64;
        let raw = self.raw_estimate();

        if raw <= 2.5 * m && zeros > 0 {
            // Small range: linear counting over empty registers
            return Ok(m * (m / zeros as f64).ln());
        }
        if raw > TWO_POW_64 / 30.0 {
            // Large range: hash collisions, never beyond the hash domain
            let arg = 1.0 - raw / TWO_POW_64;
            if arg > 0.0 {
                return Ok((-TWO_POW_64 * arg.ln()).min(TWO_POW_64));
            }
            return Ok(TWO_POW_64);
        }
        Ok(raw)
    }

    #[inline]
    fn size_of(&self) -> usize {
        size_of::<Self>() + size_of_val(self.registers.as_slice())
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.zeros() == self.num_registers()
    }
}

/// Return `2^-rank`
#[inline]
fn inverse_pow2(rank: u8) -> f64 {
    f64::powi(2.0, -i32::from(rank))
}

/// Parameter for bias correction
#[inline]
fn alpha(m: usize) -> f64 {
    match m {
        16 => 0.673,
        32 => 0.697,
        64 => 0.709,
        _ => 0.7213 / (1.0 + 1.079 / (m as f64)),
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::hasher::UniformHasher;
    use test_case::test_case;

    fn filled(precision: u8, n: usize, seed: u64) -> HyperLogLog {
        let hasher = UniformHasher::new(seed);
        let mut hll = HyperLogLog::new(precision).unwrap();
        for i in 0..n {
            hll.insert_hash(hasher.hash(&i));
        }
        hll
    }

    #[test_case(3; "below minimum")]
    #[test_case(19; "above maximum")]
    fn test_invalid_precision(precision: u8) {
        assert_eq!(
            HyperLogLog::new(precision),
            Err(SketchError::InvalidPrecision(precision))
        );
    }

    #[test]
    fn test_empty_estimate_is_zero() {
        let hll = HyperLogLog::new(DEFAULT_PRECISION).unwrap();
        assert_eq!(hll.estimate(), Ok(0.0));
        assert!(hll.is_empty());
    }

    #[test]
    fn test_decode_hash() {
        let hll = HyperLogLog::new(10).unwrap();
        // index from low 10 bits, remainder with its top bit set -> rank 1
        let hash = (1u64 << 63) | 0b11_1111_1111;
        assert_eq!(hll.decode_hash(hash), (1023, 1));
        // remainder `1` has 53 leading zeros within its 54-bit width -> rank 54
        let hash = (1u64 << 10) | 5;
        assert_eq!(hll.decode_hash(hash), (5, 54));
        // all-zero remainder is clamped to the maximum rank
        assert_eq!(hll.decode_hash(7), (7, 55));
    }

    #[test]
    fn test_rank_is_clamped() {
        let mut hll = HyperLogLog::new(4).unwrap();
        hll.insert_hash(0);
        assert_eq!(hll.registers()[0], 61);
    }

    #[test]
    fn test_duplicates_do_not_change_state() {
        let mut hll = filled(10, 500, 0);
        let before = hll.clone();
        let hasher = UniformHasher::new(0);
        for i in 0..500usize {
            hll.insert_hash(hasher.hash(&i));
        }
        assert_eq!(hll, before);
    }

    #[test]
    fn test_incremental_state_matches_registers() {
        let hll = filled(10, 20_000, 3);
        let zeros = hll.registers().iter().filter(|&&r| r == 0).count();
        let sum: f64 = hll.registers().iter().map(|&r| inverse_pow2(r)).sum();
        assert_eq!(hll.zeros(), zeros);
        assert!((hll.harmonic_sum() - sum).abs() < 1e-9);
    }

    #[test_case(40; "rank 40")]
    #[test_case(60; "rank 60")]
    #[test_case(61; "maximum rank")]
    fn test_harmonic_sum_exact_for_high_ranks(rank: u8) {
        let mut hll = HyperLogLog::new(4).unwrap();
        for idx in 0..16 {
            hll.update_rank(idx, rank);
        }
        assert_eq!(hll.zeros(), 0);
        assert_eq!(hll.harmonic_sum(), 16.0 * inverse_pow2(rank));
    }

    #[test]
    fn test_harmonic_sum_mixed_ranks() {
        let mut hll = HyperLogLog::new(4).unwrap();
        for idx in 0..8 {
            hll.update_rank(idx, 40);
            hll.update_rank(idx + 8, 30);
            // raising a register again moves it between histogram buckets
            hll.update_rank(idx + 8, 50);
        }
        assert_eq!(hll.rank_counts[30], 0);
        assert_eq!(
            hll.harmonic_sum(),
            8.0 * inverse_pow2(40) + 8.0 * inverse_pow2(50)
        );
    }

    #[test]
    fn test_merge_takes_register_maximum() {
        let mut lhs = filled(10, 3_000, 1);
        let rhs = filled(10, 5_000, 2);
        let expected: Vec<u8> = lhs
            .registers()
            .iter()
            .zip(rhs.registers())
            .map(|(&a, &b)| a.max(b))
            .collect();
        lhs.merge(&rhs).unwrap();
        assert_eq!(lhs.registers(), expected.as_slice());
    }

    #[test]
    fn test_merge_precision_mismatch() {
        let mut lhs = HyperLogLog::new(10).unwrap();
        let rhs = HyperLogLog::new(12).unwrap();
        assert!(matches!(
            lhs.merge(&rhs),
            Err(SketchError::IncompatibleMerge { .. })
        ));
    }

    #[test]
    fn test_large_range_correction() {
        let mut hll = HyperLogLog::new(4).unwrap();
        for idx in 0..16 {
            hll.update_rank(idx, 59);
        }
        // sum = 2^-55, so raw = 0.673 * 2^63 lies inside the large range branch
        let raw = hll.raw_estimate();
        assert_eq!(raw, 0.673 * 256.0 * 2f64.powi(55));
        let estimate = hll.estimate().unwrap();
        assert!(estimate > raw);
        assert!(estimate < TWO_POW_64);
        assert_eq!(estimate, -TWO_POW_64 * (1.0 - raw / TWO_POW_64).ln());
    }

    #[test_case(59 => false; "corrected within domain")]
    #[test_case(60 => true; "corrected beyond domain")]
    #[test_case(61 => true; "raw beyond domain")]
    fn test_large_range_never_exceeds_domain(rank: u8) -> bool {
        let mut hll = HyperLogLog::new(4).unwrap();
        for idx in 0..16 {
            hll.update_rank(idx, rank);
        }
        let estimate = hll.estimate().unwrap();
        assert!(estimate.is_finite());
        assert!(estimate <= TWO_POW_64);
        assert!(estimate >= hll.raw_estimate().min(TWO_POW_64));
        estimate == TWO_POW_64
    }

    #[test]
    fn test_size_of() {
        let hll = HyperLogLog::new(10).unwrap();
        assert_eq!(hll.size_of(), size_of::<HyperLogLog>() + 1024);
    }
}
