//! Strand-canonical rolling hash over DNA windows.
//!
//! A window hash is the XOR of per-base seed constants, each rotated by the
//! base's distance from the window end. Rotation distributes over XOR, so
//! sliding the window one base in either direction is a constant number of
//! rotate/XOR operations rather than a rehash of all k bases.
//!
//! Both strands are tracked: `fwd` hashes the window as written, `rc` hashes
//! its reverse complement. Their minimum is the canonical base value, which
//! is identical for a window and its reverse complement. The filter-facing
//! hash family is derived from that base value with seeded ahash states, so
//! any number of filter hash functions costs O(1) extra state per window.

use crate::constants::{FILTER_HASH_SEED, SEED_A, SEED_C, SEED_G, SEED_T};
use crate::encoding::{complement, is_acgt};
use ahash::RandomState;
use std::hash::{BuildHasher, Hasher};

/// Seed constant for one base.
#[inline]
const fn seed(base: u8) -> u64 {
    match base {
        b'A' => SEED_A,
        b'C' => SEED_C,
        b'G' => SEED_G,
        b'T' => SEED_T,
        _ => panic!("rolling hash over non-ACGT base"),
    }
}

/// Derive `num_hashes` filter bit-position hashes from a window's canonical
/// base value. Deterministic across runs.
pub fn filter_hashes(base_value: u64, num_hashes: usize) -> Vec<u64> {
    (0..num_hashes as u64)
        .map(|i| {
            let s = FILTER_HASH_SEED.wrapping_add(i.wrapping_mul(0xa076_1d64_78bd_642f));
            let state = RandomState::with_seeds(s, !s, s.rotate_left(32), !(s.rotate_left(32)));
            let mut hasher = state.build_hasher();
            hasher.write_u64(base_value);
            hasher.finish()
        })
        .collect()
}

/// Rolling hash state for one k-length window.
///
/// Carried alongside the window's text form in a graph vertex so that
/// neighbour hashes can be derived in O(1).
#[derive(Clone, Copy, Debug)]
pub struct RollingHash {
    k: usize,
    fwd: u64,
    rc: u64,
}

impl RollingHash {
    /// Hash a window from scratch. Returns `None` if the window contains a
    /// non-ACGT byte.
    pub fn from_kmer(kmer: &[u8]) -> Option<Self> {
        if kmer.iter().any(|&b| !is_acgt(b)) {
            return None;
        }
        let k = kmer.len();
        let mut fwd = 0u64;
        let mut rc = 0u64;
        for (i, &b) in kmer.iter().enumerate() {
            fwd ^= seed(b).rotate_left((k - 1 - i) as u32);
            rc ^= seed(complement(b)).rotate_left(i as u32);
        }
        Some(Self { k, fwd, rc })
    }

    /// Window length.
    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Strand-canonical value for this window: identical for the window and
    /// its reverse complement.
    #[inline]
    pub fn base_value(&self) -> u64 {
        self.fwd.min(self.rc)
    }

    /// Filter hash family for this window.
    #[inline]
    pub fn hashes(&self, num_hashes: usize) -> Vec<u64> {
        filter_hashes(self.base_value(), num_hashes)
    }

    /// State after sliding one base forward: `outgoing` leaves the front of
    /// the window, `incoming` joins at the back.
    #[must_use]
    pub fn roll_forward(&self, outgoing: u8, incoming: u8) -> Self {
        let k = self.k as u32;
        let fwd = self.fwd.rotate_left(1) ^ seed(outgoing).rotate_left(k) ^ seed(incoming);
        let rc = (self.rc ^ seed(complement(outgoing))).rotate_right(1)
            ^ seed(complement(incoming)).rotate_left(k - 1);
        Self { k: self.k, fwd, rc }
    }

    /// State after sliding one base backward: `incoming` joins at the front
    /// of the window, `outgoing` leaves the back.
    #[must_use]
    pub fn roll_backward(&self, incoming: u8, outgoing: u8) -> Self {
        let k = self.k as u32;
        let fwd = seed(incoming).rotate_left(k - 1) ^ (self.fwd ^ seed(outgoing)).rotate_right(1);
        let rc = seed(complement(incoming))
            ^ (self.rc ^ seed(complement(outgoing)).rotate_left(k - 1)).rotate_left(1);
        Self { k: self.k, fwd, rc }
    }
}

/// Window yielded by [`KmerHashIterator`].
#[derive(Clone, Copy, Debug)]
pub struct SeqWindow {
    /// Start offset of the window in the source sequence.
    pub pos: usize,
    /// Rolling hash state of the window.
    pub hash: RollingHash,
}

/// Iterator over every ACGT-only k-length window of a sequence.
///
/// Windows containing a non-ACGT byte are skipped; after a skip, the next
/// yielded position jumps by more than one and the hash state is re-seeded
/// from scratch. On clean sequence each step is a single roll.
pub struct KmerHashIterator<'a> {
    seq: &'a [u8],
    k: usize,
    /// Position of the previously yielded window, if any.
    prev: Option<SeqWindow>,
    /// Next candidate window start.
    next_pos: usize,
}

impl<'a> KmerHashIterator<'a> {
    /// Create an iterator over the k-length windows of `seq`.
    pub fn new(seq: &'a [u8], k: usize) -> Self {
        assert!(k >= 2, "window length must be at least 2");
        Self {
            seq,
            k,
            prev: None,
            next_pos: 0,
        }
    }

    /// Window length.
    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Locate the first fully-ACGT window starting at or after `from`,
    /// hashing it from scratch.
    fn reseed_from(&self, mut from: usize) -> Option<SeqWindow> {
        while from + self.k <= self.seq.len() {
            let window = &self.seq[from..from + self.k];
            // Jump past the rightmost bad byte rather than advancing by one.
            match window.iter().rposition(|&b| !is_acgt(b)) {
                Some(bad) => from += bad + 1,
                None => {
                    let hash = RollingHash::from_kmer(window)
                        .expect("validated window must hash");
                    return Some(SeqWindow { pos: from, hash });
                }
            }
        }
        None
    }
}

impl Iterator for KmerHashIterator<'_> {
    type Item = SeqWindow;

    fn next(&mut self) -> Option<Self::Item> {
        let window = match self.prev {
            Some(prev) if prev.pos + 1 == self.next_pos => {
                let incoming_at = self.next_pos + self.k - 1;
                if incoming_at < self.seq.len() && is_acgt(self.seq[incoming_at]) {
                    // Clean slide: single roll from the previous window.
                    let hash = prev
                        .hash
                        .roll_forward(self.seq[prev.pos], self.seq[incoming_at]);
                    Some(SeqWindow {
                        pos: self.next_pos,
                        hash,
                    })
                } else {
                    // The incoming byte is bad (or we ran off the end); no
                    // window can start before it.
                    self.reseed_from(self.next_pos + self.k)
                }
            }
            _ => self.reseed_from(self.next_pos),
        };
        if let Some(w) = window {
            self.prev = Some(w);
            self.next_pos = w.pos + 1;
        } else {
            self.next_pos = self.seq.len();
        }
        window
    }
}
