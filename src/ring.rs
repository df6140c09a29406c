use crate::bitset::{BitSetFilter, MembershipFilter};
use crate::error::{HotnessError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

/// One filter of the ring together with its recency weight.
pub struct Generation<F> {
    index: usize,
    weight: usize,
    filter: F,
}

impl<F: MembershipFilter> Generation<F> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn weight(&self) -> usize {
        self.weight
    }

    pub fn filter(&self) -> &F {
        &self.filter
    }

    pub fn contains(&self, item: &[u8]) -> bool {
        self.filter.query(item)
    }
}

/// Where [`GenerationRing::insert`] put a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Added to the generation under the write cursor.
    Current(usize),
    /// The write cursor's generation already had the key, so it went to the
    /// next generation (walking forward) that did not.
    Cascaded(usize),
    /// Every generation already reports the key; nothing was added.
    Saturated,
}

impl Placement {
    pub fn generation(&self) -> Option<usize> {
        match self {
            Placement::Current(idx) | Placement::Cascaded(idx) => Some(*idx),
            Placement::Saturated => None,
        }
    }
}

/// Snapshot of one generation, for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub index: usize,
    pub weight: usize,
    pub ones: usize,
    pub fill_ratio: f64,
    pub insert_count: usize,
}

/// Fixed ring of weighted generations.
///
/// Weights start as `1..=len` by index with both cursors at 0. Walking
/// forward from the decay cursor always yields the weights `1, 2, ..., len`.
pub struct GenerationRing<F = BitSetFilter> {
    generations: Vec<Generation<F>>,
    write_cursor: usize,
    decay_cursor: usize,
}

impl<F: MembershipFilter> GenerationRing<F> {
    pub fn new(filters: Vec<F>) -> Result<Self> {
        if filters.is_empty() {
            return Err(HotnessError::InvalidConfig(
                "Ring needs at least one generation".into(),
            ));
        }

        let generations = filters
            .into_iter()
            .enumerate()
            .map(|(index, filter)| Generation {
                index,
                weight: index + 1,
                filter,
            })
            .collect();

        Ok(Self {
            generations,
            write_cursor: 0,
            decay_cursor: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.generations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }

    pub fn write_cursor(&self) -> usize {
        self.write_cursor
    }

    pub fn decay_cursor(&self) -> usize {
        self.decay_cursor
    }

    pub fn generations(&self) -> &[Generation<F>] {
        &self.generations
    }

    pub fn generation(&self, index: usize) -> Option<&Generation<F>> {
        self.generations.get(index)
    }

    pub fn weights(&self) -> Vec<usize> {
        self.generations.iter().map(|g| g.weight).collect()
    }

    /// Indices of the generations whose filter reports `item`.
    pub fn hit_generations(&self, item: &[u8]) -> Vec<usize> {
        self.generations
            .iter()
            .filter(|g| g.contains(item))
            .map(|g| g.index)
            .collect()
    }

    /// Sum of the weights of every generation reporting `item`.
    pub fn raw_score(&self, item: &[u8]) -> usize {
        self.generations
            .iter()
            .filter(|g| g.contains(item))
            .map(|g| g.weight)
            .sum()
    }

    /// Cascading insertion: try the write cursor's generation first, then
    /// the following ones, and always advance the write cursor.
    pub fn insert(&mut self, item: &[u8]) -> Placement {
        let len = self.generations.len();
        let current = self.write_cursor;

        let placement = if !self.generations[current].contains(item) {
            self.generations[current].filter.add(item);
            Placement::Current(current)
        } else {
            let free = (1..len)
                .map(|offset| (current + offset) % len)
                .find(|&idx| !self.generations[idx].contains(item));
            match free {
                Some(idx) => {
                    self.generations[idx].filter.add(item);
                    Placement::Cascaded(idx)
                }
                None => Placement::Saturated,
            }
        };

        self.write_cursor = (current + 1) % len;
        trace!(?placement, write_cursor = self.write_cursor, "Key inserted");
        placement
    }

    /// Ages every generation by one and recycles the one reaching zero.
    ///
    /// Returns the index of the recycled generation. All checks run before
    /// anything is modified, so on error the ring is left untouched.
    pub fn decay(&mut self) -> Result<usize> {
        let len = self.generations.len();
        let expected = self.decay_cursor;

        let zeroed: Vec<usize> = self
            .generations
            .iter()
            .filter(|g| g.weight <= 1)
            .map(|g| g.index)
            .collect();

        if zeroed.len() != 1 {
            let err = HotnessError::DecayZeroCount {
                count: zeroed.len(),
            };
            error!(weights = ?self.weights(), "{err}");
            return Err(err);
        }
        if zeroed[0] != expected {
            let err = HotnessError::DecayWeightMismatch {
                index: zeroed[0],
                expected,
            };
            error!(weights = ?self.weights(), "{err}");
            return Err(err);
        }

        let next = (expected + 1) % len;
        let next_weight = if next == expected {
            len
        } else {
            self.generations[next].weight - 1
        };
        if next_weight != 1 {
            let err = HotnessError::DecayCursorWeight {
                index: next,
                weight: next_weight,
            };
            error!(weights = ?self.weights(), "{err}");
            return Err(err);
        }

        for generation in self.generations.iter_mut() {
            generation.weight -= 1;
        }
        let recycled = &mut self.generations[expected];
        recycled.filter.reset();
        recycled.weight = len;
        self.decay_cursor = next;

        debug!(
            recycled = expected,
            decay_cursor = self.decay_cursor,
            weights = ?self.weights(),
            "Generation recycled"
        );
        debug_assert!(self.check_invariants().is_ok());

        Ok(expected)
    }

    /// Verifies that walking from the decay cursor yields `1, 2, ..., len`.
    pub fn check_invariants(&self) -> Result<()> {
        let len = self.generations.len();
        let in_order = (0..len).all(|offset| {
            self.generations[(self.decay_cursor + offset) % len].weight
                == offset + 1
        });

        if in_order {
            Ok(())
        } else {
            Err(HotnessError::WeightOrder {
                weights: self.weights(),
                decay_cursor: self.decay_cursor,
            })
        }
    }

    pub fn stats(&self) -> Vec<GenerationStats> {
        self.generations
            .iter()
            .map(|g| GenerationStats {
                index: g.index,
                weight: g.weight,
                ones: g.filter.ones(),
                fill_ratio: g.filter.fill_ratio(),
                insert_count: g.filter.insert_count(),
            })
            .collect()
    }
}

impl<F: MembershipFilter> std::fmt::Debug for GenerationRing<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "GenerationRing {{ weights: {:?}, write_cursor: {}, decay_cursor: {} }}",
            self.weights(),
            self.write_cursor,
            self.decay_cursor
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(bf_num: usize) -> GenerationRing {
        let filters = (0..bf_num)
            .map(|_| BitSetFilter::new(1024, 3).unwrap())
            .collect();
        GenerationRing::new(filters).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let ring = ring(4);
        assert_eq!(ring.weights(), vec![1, 2, 3, 4]);
        assert_eq!(ring.write_cursor(), 0);
        assert_eq!(ring.decay_cursor(), 0);
        assert!(ring.check_invariants().is_ok());
    }

    #[test]
    fn test_empty_ring_rejected() {
        let result = GenerationRing::<BitSetFilter>::new(Vec::new());
        assert!(matches!(result, Err(HotnessError::InvalidConfig(_))));
    }

    #[test]
    fn test_insert_round_robin() {
        let mut ring = ring(3);
        assert_eq!(ring.insert(b"a"), Placement::Current(0));
        assert_eq!(ring.insert(b"b"), Placement::Current(1));
        assert_eq!(ring.insert(b"c"), Placement::Current(2));
        assert_eq!(ring.write_cursor(), 0);
    }

    #[test]
    fn test_cascade_skips_generations_holding_key() {
        let mut ring = ring(4);
        assert_eq!(ring.insert(b"k"), Placement::Current(0));
        ring.insert(b"x");
        ring.insert(b"y");
        ring.insert(b"z");
        // write cursor is back on generation 0, which has "k"
        assert_eq!(ring.insert(b"k"), Placement::Cascaded(1));
        assert_eq!(ring.write_cursor(), 1);
        assert_eq!(ring.hit_generations(b"k"), vec![0, 1]);
    }

    #[test]
    fn test_saturated_insert_adds_nothing() {
        let mut ring = ring(2);
        ring.insert(b"k");
        ring.insert(b"k");
        let ones: Vec<usize> = ring.stats().iter().map(|s| s.ones).collect();

        assert_eq!(ring.insert(b"k"), Placement::Saturated);
        assert_eq!(ring.write_cursor(), 1);
        let after: Vec<usize> = ring.stats().iter().map(|s| s.ones).collect();
        assert_eq!(ones, after);
        assert_eq!(Placement::Saturated.generation(), None);
    }

    #[test]
    fn test_decay_rotates_weights() {
        let mut ring = ring(4);
        ring.insert(b"old");
        assert_eq!(ring.decay().unwrap(), 0);
        assert_eq!(ring.weights(), vec![4, 1, 2, 3]);
        assert_eq!(ring.decay_cursor(), 1);
        assert!(!ring.generations()[0].contains(b"old"));

        assert_eq!(ring.decay().unwrap(), 1);
        assert_eq!(ring.weights(), vec![3, 4, 1, 2]);
        assert!(ring.check_invariants().is_ok());
    }

    #[test]
    fn test_decay_full_cycle_restores_weights() {
        let mut ring = ring(5);
        for _ in 0..5 {
            ring.decay().unwrap();
        }
        assert_eq!(ring.weights(), vec![1, 2, 3, 4, 5]);
        assert_eq!(ring.decay_cursor(), 0);
    }

    #[test]
    fn test_single_generation_ring() {
        let mut ring = ring(1);
        ring.insert(b"a");
        assert_eq!(ring.insert(b"a"), Placement::Saturated);
        assert_eq!(ring.decay().unwrap(), 0);
        assert_eq!(ring.weights(), vec![1]);
        assert!(!ring.generations()[0].contains(b"a"));
    }

    #[test]
    fn test_decay_detects_zero_in_wrong_generation() {
        let mut ring = ring(3);
        ring.generations[0].weight = 2;
        ring.generations[1].weight = 1;
        ring.generations[2].weight = 3;
        ring.insert(b"kept");

        let err = ring.decay().unwrap_err();
        assert_eq!(
            err,
            HotnessError::DecayWeightMismatch {
                index: 1,
                expected: 0
            }
        );
        assert!(err.is_invariant_violation());
        // nothing was touched
        assert_eq!(ring.weights(), vec![2, 1, 3]);
        assert_eq!(ring.decay_cursor(), 0);
        assert!(ring.generations()[0].contains(b"kept"));
    }

    #[test]
    fn test_decay_detects_duplicate_zero() {
        let mut ring = ring(3);
        ring.generations[2].weight = 1;
        assert_eq!(
            ring.decay().unwrap_err(),
            HotnessError::DecayZeroCount { count: 2 }
        );
    }

    #[test]
    fn test_decay_detects_bad_successor_weight() {
        let mut ring = ring(3);
        ring.generations[1].weight = 3;
        ring.generations[2].weight = 2;
        assert_eq!(
            ring.decay().unwrap_err(),
            HotnessError::DecayCursorWeight {
                index: 1,
                weight: 2
            }
        );
        assert!(matches!(
            ring.check_invariants(),
            Err(HotnessError::WeightOrder { .. })
        ));
    }

    #[test]
    fn test_raw_score_sums_hit_weights() {
        let mut ring = ring(4);
        ring.insert(b"k"); // gen 0, weight 1
        ring.insert(b"k"); // gen 1, weight 2
        ring.insert(b"other");
        ring.insert(b"k"); // gen 3, weight 4
        assert_eq!(ring.hit_generations(b"k"), vec![0, 1, 3]);
        assert_eq!(ring.raw_score(b"k"), 7);
    }
}
