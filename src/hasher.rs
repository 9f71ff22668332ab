//! Seeded uniform hashing of stream items.
//!
//! Every sketch routes items through a [`UniformHasher`], a thin wrapper over a seeded
//! `WyHash`. The seed is fixed at construction, so one experiment always maps the same
//! item to the same 64-bit value and independent runs stay reproducible.
use std::hash::{Hash, Hasher};

use wyhash::WyHash;

/// Deterministic 64-bit hasher with an explicit seed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UniformHasher {
    seed: u64,
}

impl UniformHasher {
    /// Creates new hasher with given `seed`
    #[inline]
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Return seed used by this hasher
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Hash a hashable item into a uniformly distributed `u64`
    #[inline]
    pub fn hash<T: Hash + ?Sized>(&self, item: &T) -> u64 {
        let mut hasher = WyHash::with_seed(self.seed);
        item.hash(&mut hasher);
        hasher.finish()
    }
}

/// Derive the `round`-th independent hash from an already computed item hash.
///
/// Used by sketches which need several hash functions per item (e.g. Flajolet-Martin rows).
#[inline]
pub(crate) fn remix(hash: u64, round: u64) -> u64 {
    wyhash::wyhash(&hash.to_le_bytes(), round)
}
