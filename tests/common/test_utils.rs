use hotness_bloom_rs::{
    HotnessConfig, HotnessConfigBuilder, HotnessFilter, MembershipFilter,
};
use std::collections::HashSet;

/// 32-key reference access trace.
#[allow(dead_code)]
pub const REFERENCE_TRACE: [u64; 32] = [
    6, 20, 5, 9, 22, 3, 3, 11, 1, 3, 0, 5, 4, 2, 1, 0, 3, 3, 3, 4, 19, 1, 26,
    6, 5, 6, 5, 7, 7, 26, 6, 5,
];

/// Membership filter without false positives, so scores in tests are exact.
#[derive(Debug, Default)]
pub struct ExactFilter {
    items: HashSet<Vec<u8>>,
    inserts: usize,
}

impl MembershipFilter for ExactFilter {
    fn add(&mut self, item: &[u8]) {
        self.items.insert(item.to_vec());
        self.inserts += 1;
    }

    fn query(&self, item: &[u8]) -> bool {
        self.items.contains(item)
    }

    fn reset(&mut self) {
        self.items.clear();
        self.inserts = 0;
    }

    fn ones(&self) -> usize {
        self.items.len()
    }

    fn fill_ratio(&self) -> f64 {
        0.0
    }

    fn insert_count(&self) -> usize {
        self.inserts
    }
}

/// Small reference ring: 4 generations of 32 bits,
/// decay every 8 requests.
#[allow(dead_code)]
pub fn reference_config() -> HotnessConfig {
    HotnessConfigBuilder::default()
        .bf_num(4)
        .max_weight(2.0)
        .hot_threshold(4.0)
        .decay_window(8)
        .bit_size(32)
        .num_hashes(2)
        .build()
        .expect("Unable to build HotnessConfig")
}

#[allow(dead_code)]
pub fn exact_filter(config: HotnessConfig) -> HotnessFilter<u64, ExactFilter> {
    let filters = (0..config.bf_num).map(|_| ExactFilter::default()).collect();
    HotnessFilter::from_filters(config, filters)
        .expect("Failed to create HotnessFilter")
}

/// Panics unless walking from the decay cursor yields `1..=len`.
#[allow(dead_code)]
pub fn assert_weight_rotation(weights: &[usize], decay_cursor: usize) {
    let len = weights.len();
    for offset in 0..len {
        assert_eq!(
            weights[(decay_cursor + offset) % len],
            offset + 1,
            "weights {weights:?} out of order from decay cursor {decay_cursor}"
        );
    }
}
