use crate::bitset::MembershipFilter;
use crate::ring::GenerationRing;
use serde::{Deserialize, Serialize};

/// Tag attached to tracked keys and classification results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hotness {
    /// Key has been observed.
    Valid,
    Hot,
    Cold,
}

impl Hotness {
    pub fn is_hot(self) -> bool {
        self == Hotness::Hot
    }
}

impl std::fmt::Display for Hotness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            Hotness::Valid => "VALID",
            Hotness::Hot => "HOT",
            Hotness::Cold => "COLD",
        };
        f.pad(tag)
    }
}

/// Turns ring membership into a weighted score and a HOT/COLD verdict.
///
/// The raw score (sum of the weights of the generations holding the key) is
/// scaled by `max_weight / bf_num`, so the threshold does not depend on the
/// number of generations.
#[derive(Debug, Clone, Copy)]
pub struct HotnessClassifier {
    max_weight: f64,
    hot_threshold: f64,
}

impl HotnessClassifier {
    pub fn new(max_weight: f64, hot_threshold: f64) -> Self {
        Self {
            max_weight,
            hot_threshold,
        }
    }

    pub fn max_weight(&self) -> f64 {
        self.max_weight
    }

    pub fn hot_threshold(&self) -> f64 {
        self.hot_threshold
    }

    pub fn scale(&self, raw_score: usize, bf_num: usize) -> f64 {
        raw_score as f64 * self.max_weight / bf_num as f64
    }

    pub fn score<F: MembershipFilter>(
        &self,
        ring: &GenerationRing<F>,
        item: &[u8],
    ) -> f64 {
        self.scale(ring.raw_score(item), ring.len())
    }

    pub fn verdict(&self, score: f64) -> Hotness {
        if score >= self.hot_threshold {
            Hotness::Hot
        } else {
            Hotness::Cold
        }
    }

    pub fn classify<F: MembershipFilter>(
        &self,
        ring: &GenerationRing<F>,
        item: &[u8],
    ) -> Hotness {
        self.verdict(self.score(ring, item))
    }
}
