//! Hot/cold key identification with a generational weighted Bloom filter ring.
//!
//! Given a stream of keys (logical block addresses, cache keys, ...) this crate
//! tells, with fixed memory and no false negatives on recent writes, whether a
//! key is HOT (accessed often and recently) or COLD.
//!
//! HowTo:
//!    * Generations: the filter keeps N bloom filters  BF_0, …, BF_{N-1}  in a ring.
//!    * Weights: each generation carries a weight in  1..=N . Walking forward from
//!      the decay cursor gives  1, 2, …, N , so the weight encodes recency.
//!    * Decay: every  W  requests all weights drop by one. The generation reaching
//!      zero is cleared and comes back with weight  N  as the freshest one.
//!
//! Insertion:
//!     * A key goes into the generation under the write cursor.
//!     * If that generation already holds the key, it goes into the next generation
//!       (walking forward) that does not. Repeated accesses spread over generations.
//!     * If every generation holds the key, nothing is added.
//!     * The write cursor advances by one on every request.
//! Classification:
//!     * score = (sum of weights of generations holding the key) * max_weight / N
//!     * HOT iff score >= hot_threshold.
//!
//! Obvious problems:
//!     * False Positives: a generation may report a key it never saw, which only
//!       ever raises the score.
//!     * Saturation: a key present in every generation is not re-inserted, so the
//!       request carries no extra information.
//!
//! ```
//! use hotness_bloom_rs::{Hotness, HotnessConfigBuilder, HotnessFilter};
//!
//! let config = HotnessConfigBuilder::default()
//!     .decay_window(8)
//!     .bit_size(1024)
//!     .build()
//!     .unwrap();
//! let mut filter = HotnessFilter::<u64>::new(config).unwrap();
//!
//! for _ in 0..4 {
//!     filter.handle_request(&42).unwrap();
//! }
//! assert_eq!(filter.classify(&42), Hotness::Hot);
//! ```

mod bitset;
mod classifier;
pub mod common;
mod config;
mod error;
mod filter;
mod hash;
mod ring;
mod scheduler;
mod tracker;

pub use bitset::{BitSetFilter, MembershipFilter};
pub use classifier::{Hotness, HotnessClassifier};
pub use config::{HotnessConfig, HotnessConfigBuilder, HotnessConfigBuilderError};
pub use error::{HotnessError, Result};
pub use filter::{HotKey, HotnessFilter};
pub use hash::{
    HashFunction, default_hash_function, optimal_bit_size,
    optimal_bit_vector_size, optimal_num_hashes,
};
pub use ring::{Generation, GenerationRing, GenerationStats, Placement};
pub use scheduler::WeightScheduler;
pub use tracker::{HotnessReport, ObservationTracker};
