use crate::bitset::{BitSetFilter, MembershipFilter};
use crate::classifier::{Hotness, HotnessClassifier};
use crate::config::HotnessConfig;
use crate::error::{HotnessError, Result};
use crate::ring::{GenerationRing, GenerationStats, Placement};
use crate::scheduler::WeightScheduler;
use crate::tracker::{HotnessReport, ObservationTracker};
use std::borrow::Cow;
use std::fmt::Debug;
use std::hash::Hash;
use tracing::debug;

/// A key the filter can classify: hashable for bookkeeping, and encodable to
/// the bytes fed to the hash family.
///
/// Integers encode as fixed-width little-endian bytes.
pub trait HotKey: Eq + Hash + Clone + Debug {
    fn key_bytes(&self) -> Cow<'_, [u8]>;
}

macro_rules! impl_hot_key_for_int {
    ($($t:ty),*) => {
        $(
            impl HotKey for $t {
                fn key_bytes(&self) -> Cow<'_, [u8]> {
                    Cow::Owned(self.to_le_bytes().to_vec())
                }
            }
        )*
    };
}

impl_hot_key_for_int!(u32, u64, usize, i64);

impl HotKey for String {
    fn key_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_bytes())
    }
}

impl HotKey for Vec<u8> {
    fn key_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_slice())
    }
}

/// Hot/cold classifier over a ring of weighted bloom filters.
///
/// Every request goes through [`handle_request`](Self::handle_request)
/// (decay tick on every `decay_window`-th request, then cascading insertion)
/// and can then be scored with [`classify`](Self::classify). Mutating calls
/// take `&mut self`; share an instance behind a single `Mutex` held across
/// the whole request/classify sequence.
pub struct HotnessFilter<K, F = BitSetFilter> {
    config: HotnessConfig,
    ring: GenerationRing<F>,
    scheduler: WeightScheduler,
    classifier: HotnessClassifier,
    tracker: ObservationTracker<K>,
}

impl<K: HotKey> HotnessFilter<K, BitSetFilter> {
    pub fn new(config: HotnessConfig) -> Result<Self> {
        config.validate()?;

        let filters = (0..config.bf_num)
            .map(|_| {
                BitSetFilter::with_hash_function(
                    config.bit_size,
                    config.num_hashes,
                    config.hash_function,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        Self::from_filters(config, filters)
    }
}

impl<K: HotKey, F: MembershipFilter> HotnessFilter<K, F> {
    /// Builds the ring over caller-provided filters, one per generation.
    ///
    /// `bit_size`, `num_hashes` and `hash_function` of the config are not
    /// used to build anything here, but are still validated.
    pub fn from_filters(config: HotnessConfig, filters: Vec<F>) -> Result<Self> {
        config.validate()?;
        if filters.len() != config.bf_num {
            return Err(HotnessError::FilterCountMismatch {
                expected: config.bf_num,
                actual: filters.len(),
            });
        }

        let ring = GenerationRing::new(filters)?;
        if config.verbose {
            debug!(weights = ?ring.weights(), "Initial weights");
        }

        Ok(Self {
            scheduler: WeightScheduler::new(config.decay_window),
            classifier: HotnessClassifier::new(
                config.max_weight,
                config.hot_threshold,
            ),
            tracker: ObservationTracker::new(),
            ring,
            config,
        })
    }

    /// Records `key`, runs a decay tick when due, then places the key.
    ///
    /// On error (a broken ring invariant) nothing has been modified.
    pub fn handle_request(&mut self, key: &K) -> Result<Placement> {
        let recycled = self.scheduler.on_request(&mut self.ring)?;
        if self.config.verbose {
            if let Some(idx) = recycled {
                debug!(
                    request = self.scheduler.request_count(),
                    recycled = idx,
                    weights = ?self.ring.weights(),
                    "After decay"
                );
            }
        }

        self.tracker.record_key(key);
        Ok(self.ring.insert(&key.key_bytes()))
    }

    /// HOT when the scaled score reaches the threshold. HOT keys are
    /// remembered for [`report`](Self::report).
    pub fn classify(&mut self, key: &K) -> Hotness {
        let bytes = key.key_bytes();
        let score = self.classifier.score(&self.ring, &bytes);
        let verdict = self.classifier.verdict(score);

        if verdict.is_hot() {
            self.tracker.record_hot(key);
            if self.config.verbose {
                debug!(
                    ?key,
                    score,
                    hit_generations = ?self.ring.hit_generations(&bytes),
                    "Hot key"
                );
            }
        }
        verdict
    }

    /// `handle_request` followed by `classify`.
    pub fn process(&mut self, key: &K) -> Result<Hotness> {
        self.handle_request(key)?;
        Ok(self.classify(key))
    }

    /// Scaled score, without any bookkeeping.
    pub fn score(&self, key: &K) -> f64 {
        self.classifier.score(&self.ring, &key.key_bytes())
    }

    pub fn raw_score(&self, key: &K) -> usize {
        self.ring.raw_score(&key.key_bytes())
    }

    /// Verdict `classify` would return, without recording it.
    pub fn peek(&self, key: &K) -> Hotness {
        self.classifier.verdict(self.score(key))
    }

    pub fn hit_generations(&self, key: &K) -> Vec<usize> {
        self.ring.hit_generations(&key.key_bytes())
    }

    pub fn report(&self) -> HotnessReport {
        self.tracker.report()
    }

    pub fn weights(&self) -> Vec<usize> {
        self.ring.weights()
    }

    pub fn write_cursor(&self) -> usize {
        self.ring.write_cursor()
    }

    pub fn decay_cursor(&self) -> usize {
        self.ring.decay_cursor()
    }

    pub fn request_count(&self) -> u64 {
        self.scheduler.request_count()
    }

    pub fn decay_count(&self) -> u64 {
        self.scheduler.decay_count()
    }

    pub fn generation_stats(&self) -> Vec<GenerationStats> {
        self.ring.stats()
    }

    pub fn config(&self) -> &HotnessConfig {
        &self.config
    }

    pub fn ring(&self) -> &GenerationRing<F> {
        &self.ring
    }

    pub fn tracker(&self) -> &ObservationTracker<K> {
        &self.tracker
    }
}

impl<K, F: MembershipFilter> std::fmt::Debug for HotnessFilter<K, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "HotnessFilter {{ bf_num: {}, max_weight: {}, hot_threshold: {}, decay_window: {}, bit_size: {}, num_hashes: {}, weights: {:?} }}",
            self.config.bf_num,
            self.config.max_weight,
            self.config.hot_threshold,
            self.config.decay_window,
            self.config.bit_size,
            self.config.num_hashes,
            self.ring.weights()
        )
    }
}
