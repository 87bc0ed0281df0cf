//! Probabilistic k-mer membership filter.
//!
//! A fixed-size Bloom filter keyed by precomputed hash values; the filter
//! never sees sequence content. Lookups may report a non-member as present
//! (rate depends on load), but a member is never reported absent.
//!
//! Bits are stored in relaxed atomics so concurrent workers can insert and
//! query without locking; higher-level atomicity (the recheck-then-insert
//! sequence at contig emission) is the driver's responsibility.

use crate::constants::round_up_to_multiple;
use crate::error::AssemblyError;
use crate::rolling::KmerHashIterator;
use std::sync::atomic::{AtomicU64, Ordering};

/// Bloom filter over canonical k-mer hashes.
pub struct BloomFilter {
    words: Vec<AtomicU64>,
    num_bits: u64,
    k: usize,
    num_hashes: usize,
}

impl BloomFilter {
    /// Create a filter with capacity `num_bits`, rounded up to a multiple of
    /// 64, for k-length windows hashed `num_hashes` times.
    pub fn new(num_bits: u64, num_hashes: usize, k: usize) -> Result<Self, AssemblyError> {
        if num_bits == 0 {
            return Err(AssemblyError::Config(
                "filter capacity must be non-zero".into(),
            ));
        }
        if num_hashes == 0 {
            return Err(AssemblyError::Config(
                "filter needs at least one hash function".into(),
            ));
        }
        if k < 2 {
            return Err(AssemblyError::Config(format!(
                "k must be at least 2, got {k}"
            )));
        }
        let num_bits = round_up_to_multiple(num_bits, 64);
        let words = (0..num_bits / 64).map(|_| AtomicU64::new(0)).collect();
        Ok(Self {
            words,
            num_bits,
            k,
            num_hashes,
        })
    }

    /// Window length this filter was built for.
    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of hash functions per element.
    #[inline]
    pub fn num_hashes(&self) -> usize {
        self.num_hashes
    }

    /// Filter capacity in bits.
    #[inline]
    pub fn num_bits(&self) -> u64 {
        self.num_bits
    }

    #[inline]
    fn slot(&self, hash: u64) -> (usize, u64) {
        let bit = hash % self.num_bits;
        ((bit / 64) as usize, 1u64 << (bit % 64))
    }

    /// Set the bit positions for one element. Idempotent.
    pub fn insert(&self, hashes: &[u64]) {
        debug_assert_eq!(hashes.len(), self.num_hashes);
        for &h in hashes {
            let (word, mask) = self.slot(h);
            self.words[word].fetch_or(mask, Ordering::Relaxed);
        }
    }

    /// True iff every bit position for this element is set.
    pub fn contains(&self, hashes: &[u64]) -> bool {
        debug_assert_eq!(hashes.len(), self.num_hashes);
        hashes.iter().all(|&h| {
            let (word, mask) = self.slot(h);
            self.words[word].load(Ordering::Relaxed) & mask != 0
        })
    }

    /// Number of set bits, for occupancy diagnostics.
    pub fn pop_count(&self) -> u64 {
        self.words
            .iter()
            .map(|w| w.load(Ordering::Relaxed).count_ones() as u64)
            .sum()
    }

    /// Insert every ACGT k-mer of `seq`.
    pub fn load_sequence(&self, seq: &[u8]) {
        for window in KmerHashIterator::new(seq, self.k) {
            self.insert(&window.hash.hashes(self.num_hashes));
        }
    }
}

impl std::fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloomFilter")
            .field("num_bits", &self.num_bits)
            .field("k", &self.k)
            .field("num_hashes", &self.num_hashes)
            .field("pop_count", &self.pop_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rolling::RollingHash;

    fn hashes_of(kmer: &[u8], filter: &BloomFilter) -> Vec<u64> {
        RollingHash::from_kmer(kmer)
            .unwrap()
            .hashes(filter.num_hashes())
    }

    #[test]
    fn test_capacity_rounds_up() {
        let filter = BloomFilter::new(100, 2, 4).unwrap();
        assert_eq!(filter.num_bits(), 128);
        assert_eq!(filter.k(), 4);
        assert_eq!(filter.num_hashes(), 2);
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(BloomFilter::new(0, 1, 4).is_err());
        assert!(BloomFilter::new(64, 0, 4).is_err());
        assert!(BloomFilter::new(64, 1, 1).is_err());
    }

    #[test]
    fn test_insert_contains() {
        let filter = BloomFilter::new(1 << 16, 3, 4).unwrap();
        let h = hashes_of(b"ACGT", &filter);
        assert!(!filter.contains(&h));
        filter.insert(&h);
        assert!(filter.contains(&h));
        // Idempotent
        let pop = filter.pop_count();
        filter.insert(&h);
        assert_eq!(filter.pop_count(), pop);
    }

    #[test]
    fn test_no_false_negatives() {
        let filter = BloomFilter::new(256, 2, 4).unwrap();
        let kmers: Vec<&[u8]> = vec![b"ACGT", b"AAAA", b"TTCA", b"GGCC", b"ATAT"];
        for kmer in &kmers {
            filter.insert(&hashes_of(kmer, &filter));
        }
        for kmer in &kmers {
            assert!(filter.contains(&hashes_of(kmer, &filter)));
        }
    }

    #[test]
    fn test_strand_equivalence() {
        // A k-mer and its reverse complement share hash values.
        let filter = BloomFilter::new(1 << 16, 2, 4).unwrap();
        filter.insert(&hashes_of(b"AAAC", &filter));
        assert!(filter.contains(&hashes_of(b"GTTT", &filter)));
    }

    #[test]
    fn test_load_sequence() {
        let filter = BloomFilter::new(1 << 16, 1, 4).unwrap();
        filter.load_sequence(b"ACGTAC");
        for kmer in [b"ACGT", b"CGTA", b"GTAC"] {
            assert!(filter.contains(&hashes_of(kmer, &filter)));
        }
        assert!(!filter.contains(&hashes_of(b"AAAA", &filter)));
    }
}
