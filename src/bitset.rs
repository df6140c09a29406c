use crate::error::{HotnessError, Result};
use crate::hash::{HashFunction, default_hash_function};
use bitvec::{bitvec, order::Lsb0, vec::BitVec};

/// Contract of a single generation's membership filter.
///
/// Implementations may report false positives but never false negatives:
/// after `add(item)` and until the next `reset()`, `query(item)` must be true.
pub trait MembershipFilter {
    fn add(&mut self, item: &[u8]);
    fn query(&self, item: &[u8]) -> bool;
    fn reset(&mut self);

    /// Number of set bits, or stored items for exact filters.
    fn ones(&self) -> usize;
    /// Share of the filter that is occupied, in `[0, 1]`.
    fn fill_ratio(&self) -> f64;
    /// `add` calls since construction or the last reset.
    fn insert_count(&self) -> usize;
}

/// Bloom filter over a power-of-two bit array.
pub struct BitSetFilter {
    bit_size: usize,
    num_hashes: usize,
    hash_function: HashFunction,
    bits: BitVec<usize, Lsb0>,
    insert_count: usize,
}

impl BitSetFilter {
    pub fn new(bit_size: usize, num_hashes: usize) -> Result<Self> {
        Self::with_hash_function(bit_size, num_hashes, default_hash_function)
    }

    pub fn with_hash_function(
        bit_size: usize,
        num_hashes: usize,
        hash_function: HashFunction,
    ) -> Result<Self> {
        if !bit_size.is_power_of_two() {
            return Err(HotnessError::InvalidConfig(format!(
                "Bit size must be a power of two, got {bit_size}"
            )));
        }
        if num_hashes == 0 {
            return Err(HotnessError::InvalidConfig(
                "Number of hash functions must be greater than 0".into(),
            ));
        }

        Ok(Self {
            bit_size,
            num_hashes,
            hash_function,
            bits: bitvec![0; bit_size],
            insert_count: 0,
        })
    }

    pub fn bit_size(&self) -> usize {
        self.bit_size
    }

    pub fn num_hashes(&self) -> usize {
        self.num_hashes
    }

    /// Memory held by the bit array, in bytes.
    pub fn size_in_bytes(&self) -> usize {
        self.bit_size.div_ceil(8)
    }

    /// Probability that a key never added is reported present, given the
    /// current fill.
    pub fn estimated_fpr(&self) -> f64 {
        self.fill_ratio().powi(self.num_hashes as i32)
    }

    fn indices(&self, item: &[u8]) -> Vec<usize> {
        let mask = self.bit_size - 1;
        (self.hash_function)(item, self.num_hashes)
            .into_iter()
            .map(|digest| digest as usize & mask)
            .collect()
    }
}

impl MembershipFilter for BitSetFilter {
    fn add(&mut self, item: &[u8]) {
        for idx in self.indices(item) {
            self.bits.set(idx, true);
        }
        self.insert_count += 1;
    }

    fn query(&self, item: &[u8]) -> bool {
        self.indices(item).into_iter().all(|idx| self.bits[idx])
    }

    fn reset(&mut self) {
        self.bits.fill(false);
        self.insert_count = 0;
    }

    fn ones(&self) -> usize {
        self.bits.count_ones()
    }

    fn fill_ratio(&self) -> f64 {
        self.ones() as f64 / self.bit_size as f64
    }

    fn insert_count(&self) -> usize {
        self.insert_count
    }
}

impl std::fmt::Debug for BitSetFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BitSetFilter {{ bit_size: {}, num_hashes: {}, ones: {}, insert_count: {} }}",
            self.bit_size,
            self.num_hashes,
            self.ones(),
            self.insert_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_hash(_item: &[u8], num_hashes: usize) -> Vec<u32> {
        vec![7; num_hashes]
    }

    fn saturated_hash(_item: &[u8], num_hashes: usize) -> Vec<u32> {
        vec![u32::MAX; num_hashes]
    }

    #[test]
    fn test_add_and_query() {
        let mut filter = BitSetFilter::new(1024, 3).unwrap();

        filter.add(b"some data");
        filter.add(b"another data");
        assert!(filter.query(b"some data"));
        assert!(filter.query(b"another data"));
        assert_eq!(filter.insert_count(), 2);
        assert!(filter.ones() <= 6);
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut filter = BitSetFilter::new(64, 2).unwrap();
        filter.add(b"lba");
        let ones = filter.ones();
        filter.add(b"lba");
        assert_eq!(filter.ones(), ones);
        assert!(filter.query(b"lba"));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut filter = BitSetFilter::new(256, 2).unwrap();
        for i in 0u64..50 {
            filter.add(&i.to_le_bytes());
        }
        assert!(filter.ones() > 0);

        filter.reset();
        assert_eq!(filter.ones(), 0);
        assert_eq!(filter.insert_count(), 0);
        assert_eq!(filter.fill_ratio(), 0.0);
        for i in 0u64..50 {
            assert!(!filter.query(&i.to_le_bytes()));
        }
    }

    #[test]
    fn test_digests_are_masked_into_range() {
        let mut filter =
            BitSetFilter::with_hash_function(32, 2, saturated_hash).unwrap();
        filter.add(b"x");
        assert!(filter.bits[31]);
        assert_eq!(filter.ones(), 1);
    }

    #[test]
    fn test_custom_hash_function_collides() {
        let mut filter =
            BitSetFilter::with_hash_function(16, 2, constant_hash).unwrap();
        filter.add(b"first");
        // every item maps to bit 7, so anything is a (false) positive now
        assert!(filter.query(b"second"));
    }

    #[test]
    fn test_rejects_invalid_shape() {
        assert!(matches!(
            BitSetFilter::new(1000, 2),
            Err(HotnessError::InvalidConfig(_))
        ));
        assert!(matches!(
            BitSetFilter::new(0, 2),
            Err(HotnessError::InvalidConfig(_))
        ));
        assert!(matches!(
            BitSetFilter::new(1024, 0),
            Err(HotnessError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_estimated_fpr_tracks_fill() {
        let mut filter = BitSetFilter::new(64, 2).unwrap();
        assert_eq!(filter.estimated_fpr(), 0.0);
        filter.add(b"a");
        let ratio = filter.fill_ratio();
        assert!((filter.estimated_fpr() - ratio * ratio).abs() < f64::EPSILON);
        assert_eq!(filter.size_in_bytes(), 8);
    }
}
