//! Sketch allows to estimate number of distinct elements in a stream with one of
//! several interchangeable representations:
//! - `HyperLogLog`: `2^P` registers of maximum observed rank, O(1) estimates thanks to
//!   incrementally maintained zero-register count and harmonic sum.
//!   Expected error is `1.04 / sqrt(2^P)`, e.g. 3.25% for `P = 10`.
//! - `FlajoletMartin`: `K` rows of first-set-bit positions (comparison baseline).
//! - `LinearCounting`: single `N`-bit vector (comparison baseline, saturates).
//! - `Kmv`: `K` minimum hash values.
//!
//! All representations consume 64-bit hashes produced by the sketch's own
//! [`UniformHasher`], so any `Hash` item can be inserted. Representations are owned
//! exclusively by one `Sketch` and preallocated at construction.
use std::hash::Hash;

use enum_dispatch::enum_dispatch;

use crate::error::SketchError;
use crate::flajolet_martin::{FlajoletMartin, DEFAULT_NUM_HASHES};
use crate::hasher::UniformHasher;
use crate::hyperloglog::{HyperLogLog, DEFAULT_PRECISION};
use crate::kmv::{KMinValues, DEFAULT_K};
use crate::linear_counting::{LinearCounting, DEFAULT_NUM_BITS};

/// Representation types supported by `Sketch`
#[derive(Debug, Clone, PartialEq)]
#[enum_dispatch]
pub enum SketchKind {
    HyperLogLog(HyperLogLog),
    FlajoletMartin(FlajoletMartin),
    LinearCounting(LinearCounting),
    Kmv(KMinValues),
}

/// Sketch trait which must be implemented by all representations.
#[enum_dispatch(SketchKind)]
pub trait SketchTrait {
    /// Fold a 64-bit hash into the sketch state
    fn insert_hash(&mut self, hash: u64);
    /// Return cardinality estimate, a finite non-negative number
    fn estimate(&self) -> Result<f64, SketchError>;
    /// Return memory size of the representation
    fn size_of(&self) -> usize;
    /// Return whether nothing was inserted yet
    fn is_empty(&self) -> bool;
}

impl SketchKind {
    /// Return short representation name
    pub fn name(&self) -> &'static str {
        match self {
            SketchKind::HyperLogLog(_) => "HyperLogLog",
            SketchKind::FlajoletMartin(_) => "FlajoletMartin",
            SketchKind::LinearCounting(_) => "LinearCounting",
            SketchKind::Kmv(_) => "KMinValues",
        }
    }

    /// Return representation state as 64-bit words: HyperLogLog register ranks,
    /// Flajolet-Martin rows, Linear Counting bit vector words or retained KMV hashes.
    pub fn state(&self) -> Vec<u64> {
        match self {
            SketchKind::HyperLogLog(hll) => {
                hll.registers().iter().map(|&rank| u64::from(rank)).collect()
            }
            SketchKind::FlajoletMartin(fm) => fm.rows().to_vec(),
            SketchKind::LinearCounting(lc) => lc.bits().to_vec(),
            SketchKind::Kmv(kmv) => kmv.hashes().collect(),
        }
    }

    /// Merge representations of the same type and parameters
    fn merge(&mut self, rhs: &SketchKind) -> Result<(), SketchError> {
        match (self, rhs) {
            (SketchKind::HyperLogLog(lhs), SketchKind::HyperLogLog(rhs)) => lhs.merge(rhs),
            (SketchKind::FlajoletMartin(lhs), SketchKind::FlajoletMartin(rhs)) => lhs.merge(rhs),
            (SketchKind::LinearCounting(lhs), SketchKind::LinearCounting(rhs)) => lhs.merge(rhs),
            (SketchKind::Kmv(lhs), SketchKind::Kmv(rhs)) => lhs.merge(rhs),
            (lhs, rhs) => Err(SketchError::IncompatibleMerge {
                lhs: lhs.name().to_string(),
                rhs: rhs.name().to_string(),
            }),
        }
    }
}

/// Parameters selecting a sketch representation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "with_serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type", rename_all = "snake_case")
)]
pub enum SketchConfig {
    HyperLogLog { precision: u8 },
    FlajoletMartin { num_hashes: usize },
    LinearCounting { num_bits: usize },
    Kmv { k: usize },
}

impl SketchConfig {
    /// HyperLogLog with default precision
    pub const fn hyperloglog() -> Self {
        SketchConfig::HyperLogLog {
            precision: DEFAULT_PRECISION,
        }
    }

    /// Flajolet-Martin with default number of rows
    pub const fn flajolet_martin() -> Self {
        SketchConfig::FlajoletMartin {
            num_hashes: DEFAULT_NUM_HASHES,
        }
    }

    /// Linear Counting with default bit vector length
    pub const fn linear_counting() -> Self {
        SketchConfig::LinearCounting {
            num_bits: DEFAULT_NUM_BITS,
        }
    }

    /// K-Minimum-Values with default `k`
    pub const fn kmv() -> Self {
        SketchConfig::Kmv { k: DEFAULT_K }
    }

    /// Build empty representation, validating parameters
    pub fn build(&self) -> Result<SketchKind, SketchError> {
        Ok(match *self {
            SketchConfig::HyperLogLog { precision } => HyperLogLog::new(precision)?.into(),
            SketchConfig::FlajoletMartin { num_hashes } => FlajoletMartin::new(num_hashes)?.into(),
            SketchConfig::LinearCounting { num_bits } => LinearCounting::new(num_bits)?.into(),
            SketchConfig::Kmv { k } => KMinValues::new(k)?.into(),
        })
    }
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self::hyperloglog()
    }
}

/// Distinct-count sketch owning its hasher and representation
#[derive(Debug, Clone, PartialEq)]
pub struct Sketch {
    config: SketchConfig,
    hasher: UniformHasher,
    kind: SketchKind,
}

impl Sketch {
    /// Creates new empty `Sketch`
    pub fn new(config: SketchConfig, hasher: UniformHasher) -> Result<Self, SketchError> {
        Ok(Self {
            config,
            hasher,
            kind: config.build()?,
        })
    }

    /// Insert a hashable item into `Sketch`
    #[inline]
    pub fn insert<T: Hash + ?Sized>(&mut self, item: &T) {
        let hash = self.hasher.hash(item);
        self.kind.insert_hash(hash);
    }

    /// Insert already computed hash into `Sketch`
    #[inline]
    pub fn insert_hash(&mut self, hash: u64) {
        self.kind.insert_hash(hash);
    }

    /// Return cardinality estimate
    #[inline]
    pub fn estimate(&self) -> Result<f64, SketchError> {
        self.kind.estimate()
    }

    /// Merge `rhs` into `self`.
    ///
    /// Fails when representations, their parameters or hash seeds differ: registers
    /// built from different hash functions cannot be combined.
    pub fn merge(&mut self, rhs: &Self) -> Result<(), SketchError> {
        if self.hasher != rhs.hasher {
            return Err(SketchError::IncompatibleMerge {
                lhs: format!("{}(seed={})", self.kind.name(), self.hasher.seed()),
                rhs: format!("{}(seed={})", rhs.kind.name(), rhs.hasher.seed()),
            });
        }
        self.kind.merge(&rhs.kind)
    }

    /// Return configuration this sketch was built with
    #[inline]
    pub fn config(&self) -> SketchConfig {
        self.config
    }

    /// Return hasher used by this sketch
    #[inline]
    pub fn hasher(&self) -> UniformHasher {
        self.hasher
    }

    /// Return underlying representation
    #[inline]
    pub fn kind(&self) -> &SketchKind {
        &self.kind
    }

    /// Return whether nothing was inserted yet
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.kind.is_empty()
    }

    /// Return memory size of `Sketch`
    #[inline]
    pub fn size_of(&self) -> usize {
        std::mem::size_of::<Self>() - std::mem::size_of::<SketchKind>() + self.kind.size_of()
    }
}
