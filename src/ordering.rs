//! Reorderings of one stream of items.
//!
//! The three canonical orderings differ only in arrival order:
//! - `grouped`: every occurrence of a value placed contiguously, values sorted ascending.
//! - `random`: uniform permutation drawn from a seeded `StdRng`.
//! - `chronological`: the input order as given. Streams without a natural order use the
//!   random permutation instead (same seed, so both sequences are equal).
//!
//! `chunk_shuffled` additionally permutes items within fixed-size consecutive chunks,
//! keeping coarse arrival order while breaking up short bursts.
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::hash::Hash;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::HarnessError;

/// Default ordering seed
pub const DEFAULT_ORDERING_SEED: u64 = 42;
/// Default chunk size for chunk-shuffled ordering
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Stream ordering label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "with_serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum OrderingKind {
    Grouped,
    Random,
    Chronological,
    ChunkShuffled,
}

impl OrderingKind {
    /// Return snake case name of the ordering
    pub fn name(&self) -> &'static str {
        match self {
            OrderingKind::Grouped => "grouped",
            OrderingKind::Random => "random",
            OrderingKind::Chronological => "chronological",
            OrderingKind::ChunkShuffled => "chunk_shuffled",
        }
    }
}

impl Display for OrderingKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The three canonical orderings of one stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Orderings<T> {
    pub grouped: Vec<T>,
    pub random: Vec<T>,
    pub chronological: Vec<T>,
}

impl<T> Orderings<T> {
    /// Iterate over orderings paired with their labels
    pub fn iter(&self) -> impl Iterator<Item = (OrderingKind, &[T])> {
        [
            (OrderingKind::Grouped, self.grouped.as_slice()),
            (OrderingKind::Random, self.random.as_slice()),
            (OrderingKind::Chronological, self.chronological.as_slice()),
        ]
        .into_iter()
    }
}

/// Seeded generator of stream orderings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderingGenerator {
    seed: u64,
}

impl Default for OrderingGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_ORDERING_SEED)
    }
}

impl OrderingGenerator {
    /// Creates new generator with given `seed`
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Return seed used for random permutations
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed)
    }

    /// Place all occurrences of each value contiguously, values in ascending order
    pub fn grouped<T: Ord + Clone>(&self, items: &[T]) -> Vec<T> {
        let mut grouped = items.to_vec();
        grouped.sort();
        grouped
    }

    /// Uniformly random permutation, reproducible for the same seed
    pub fn random<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let mut random = items.to_vec();
        random.shuffle(&mut self.rng());
        random
    }

    /// Shuffle within consecutive chunks of `chunk_size` items
    pub fn chunk_shuffled<T: Clone>(
        &self,
        items: &[T],
        chunk_size: usize,
    ) -> Result<Vec<T>, HarnessError> {
        if chunk_size == 0 {
            return Err(HarnessError::ZeroChunkSize);
        }
        let mut rng = self.rng();
        let mut shuffled = items.to_vec();
        for chunk in shuffled.chunks_mut(chunk_size) {
            chunk.shuffle(&mut rng);
        }
        Ok(shuffled)
    }

    /// Produce the three canonical orderings of `items`.
    ///
    /// `natural_order` tells whether `items` are in a meaningful arrival order; when it is
    /// not, the chronological ordering is the random one. Fails if any ordering does not
    /// hold exactly the multiset of `items`.
    pub fn generate<T: Ord + Hash + Clone>(
        &self,
        items: &[T],
        natural_order: bool,
    ) -> Result<Orderings<T>, HarnessError> {
        let random = self.random(items);
        let chronological = if natural_order {
            items.to_vec()
        } else {
            random.clone()
        };
        let orderings = Orderings {
            grouped: self.grouped(items),
            random,
            chronological,
        };

        let reference = multiset(items);
        for (kind, ordering) in orderings.iter() {
            if ordering.len() != items.len() || multiset(ordering) != reference {
                return Err(HarnessError::MultisetMismatch { ordering: kind });
            }
        }
        Ok(orderings)
    }
}

/// Count occurrences of every value
fn multiset<T: Hash + Eq>(items: &[T]) -> HashMap<&T, usize> {
    let mut counts = HashMap::with_capacity(items.len());
    for item in items {
        *counts.entry(item).or_insert(0) += 1;
    }
    counts
}

/// Return whether both sequences hold the same items with the same multiplicities
pub fn same_multiset<T: Hash + Eq>(lhs: &[T], rhs: &[T]) -> bool {
    lhs.len() == rhs.len() && multiset(lhs) == multiset(rhs)
}

/// Check that `ordering` holds exactly the multiset of `reference`
pub fn verify_multiset<T: Hash + Eq>(
    kind: OrderingKind,
    reference: &[T],
    ordering: &[T],
) -> Result<(), HarnessError> {
    if same_multiset(reference, ordering) {
        Ok(())
    } else {
        Err(HarnessError::MultisetMismatch { ordering: kind })
    }
}
