use fnv::FnvHasher;
use murmur3::murmur3_32;
use std::hash::Hasher;
use std::io::Cursor;

/// A type alias for the hash family used by every generation filter.
///
/// **Parameters:**
///
/// - `item: &[u8]`
///   - The encoded key.
/// - `num_hashes: usize`
///   - How many independent digests to produce.
///
/// **Returns:**
///
/// - `Vec<u32>`
///   - Exactly `num_hashes` raw digests. They are *not* reduced to the bit
///     range: the filter masks each one with `bit_size - 1`, so any 32-bit
///     value is acceptable.
///
/// The function must be deterministic, the same item always yielding the
/// same digests, otherwise the filter loses its no-false-negative guarantee.
pub type HashFunction = fn(&[u8], usize) -> Vec<u32>;

pub(crate) fn hash_murmur32(key: &[u8]) -> u32 {
    let mut cursor = Cursor::new(key);
    // Reading from an in-memory cursor cannot fail.
    murmur3_32(&mut cursor, 0).unwrap_or_default()
}

pub(crate) fn hash_fnv32(key: &[u8]) -> u32 {
    let mut hasher = FnvHasher::default();
    hasher.write(key);
    hasher.finish() as u32
}

/// Double hashing over murmur3 and FNV-1a: digest `i` is `h1 + i * h2`.
pub fn default_hash_function(item: &[u8], num_hashes: usize) -> Vec<u32> {
    let h1 = hash_murmur32(item);
    let h2 = hash_fnv32(item);
    (0..num_hashes)
        .map(|i| h1.wrapping_add((i as u32).wrapping_mul(h2)))
        .collect()
}

pub fn optimal_bit_vector_size(n: usize, fpr: f64) -> usize {
    let ln2 = std::f64::consts::LN_2;
    ((-(n as f64) * fpr.ln()) / (ln2 * ln2)).ceil() as usize
}

pub fn optimal_num_hashes(n: usize, m: usize) -> usize {
    ((m as f64 / n as f64) * std::f64::consts::LN_2).round() as usize
}

/// Like [`optimal_bit_vector_size`], rounded up to the next power of two so
/// the result can be used directly as a generation's `bit_size`.
pub fn optimal_bit_size(n: usize, fpr: f64) -> usize {
    optimal_bit_vector_size(n, fpr).max(1).next_power_of_two()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_murmur_reference_vector() {
        assert_eq!(hash_murmur32(b""), 0);
        assert_eq!(hash_murmur32(b"hello"), 0x248b_fa47);
    }

    #[test]
    fn test_fnv_is_truncated_fnv1a_64() {
        // FNV-1a 64 of "a" is 0xaf63dc4c8601ec8c
        assert_eq!(hash_fnv32(b"a"), 0x8601_ec8c);
    }

    #[test]
    fn test_default_hash_function_shape() {
        let digests = default_hash_function(b"lba-42", 4);
        assert_eq!(digests.len(), 4);
        assert_eq!(digests[0], hash_murmur32(b"lba-42"));
        assert_eq!(digests, default_hash_function(b"lba-42", 4));
        assert!(default_hash_function(b"lba-42", 0).is_empty());
    }

    #[test]
    fn test_optimal_bit_size_is_power_of_two() {
        for (n, fpr) in [(1, 0.5), (100, 0.01), (10_000, 0.001), (3, 0.2)] {
            let bits = optimal_bit_size(n, fpr);
            assert!(bits.is_power_of_two());
            assert!(bits >= optimal_bit_vector_size(n, fpr));
        }
    }

    #[test]
    fn test_optimal_num_hashes() {
        let m = optimal_bit_vector_size(1000, 0.01);
        assert_eq!(optimal_num_hashes(1000, m), 7);
    }
}
