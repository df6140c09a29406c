use crate::error::{HotnessError, Result};
use crate::hash::{HashFunction, default_hash_function};
use derive_builder::Builder;

/// Configuration of a [`HotnessFilter`](crate::HotnessFilter).
///
/// Everything here is fixed at construction time.
#[derive(Clone, Debug, Builder)]
#[builder(pattern = "owned")]
pub struct HotnessConfig {
    /// Number of generations (bloom filters) in the ring
    #[builder(default = "4")]
    pub bf_num: usize,

    /// Scale applied to the raw weighted score
    #[builder(default = "2.0")]
    pub max_weight: f64,

    /// Minimum scaled score for a key to be HOT
    #[builder(default = "4.0")]
    pub hot_threshold: f64,

    /// Requests between two decay ticks
    #[builder(default = "512")]
    pub decay_window: u64,

    /// Bits per generation, must be a power of two
    #[builder(default = "2048")]
    pub bit_size: usize,

    /// Hash functions per generation
    #[builder(default = "2")]
    pub num_hashes: usize,

    /// Hash family shared by all generations
    #[builder(default = "default_hash_function")]
    pub hash_function: HashFunction,

    /// Emit per-key diagnostics (hit generations of HOT keys)
    #[builder(default = "false")]
    pub verbose: bool,
}

impl Default for HotnessConfig {
    fn default() -> Self {
        Self {
            bf_num: 4,
            max_weight: 2.0,
            hot_threshold: 4.0,
            decay_window: 512,
            bit_size: 2048,
            num_hashes: 2,
            hash_function: default_hash_function,
            verbose: false,
        }
    }
}

impl HotnessConfig {
    pub fn validate(&self) -> Result<()> {
        if self.bf_num == 0 {
            return Err(HotnessError::InvalidConfig(
                "Number of generations must be greater than 0".into(),
            ));
        }
        if !self.max_weight.is_finite() || self.max_weight <= 0.0 {
            return Err(HotnessError::InvalidConfig(format!(
                "Max weight must be a positive finite number, got {}",
                self.max_weight
            )));
        }
        if !self.hot_threshold.is_finite() {
            return Err(HotnessError::InvalidConfig(format!(
                "Hot threshold must be finite, got {}",
                self.hot_threshold
            )));
        }
        if self.decay_window == 0 {
            return Err(HotnessError::InvalidConfig(
                "Decay window must be greater than 0".into(),
            ));
        }
        if !self.bit_size.is_power_of_two() {
            return Err(HotnessError::InvalidConfig(format!(
                "Bit size must be a power of two, got {}",
                self.bit_size
            )));
        }
        if self.num_hashes == 0 {
            return Err(HotnessError::InvalidConfig(
                "Number of hash functions must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Largest score a key can reach: present in every generation.
    pub fn max_score(&self) -> f64 {
        let total_weight = (self.bf_num * (self.bf_num + 1) / 2) as f64;
        total_weight * self.max_weight / self.bf_num as f64
    }

    /// Bytes of filter memory held by the whole ring.
    pub fn memory_bytes(&self) -> usize {
        self.bf_num * self.bit_size.div_ceil(8)
    }
}
