//! Implicit de Bruijn graph over a membership filter.
//!
//! There is no stored vertex or edge set. A vertex exists iff the solid
//! filter affirms its k-mer's hashes; edges are discovered by deriving the
//! at-most-four single-base shifts of a vertex and testing each for
//! membership. Graph identity is on canonical k-mers: a vertex and its
//! reverse complement are the same vertex.

use crate::bloom::BloomFilter;
use crate::constants::BASES;
use crate::encoding::is_reverse_complement;
use crate::rolling::RollingHash;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Direction of travel along the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Toward the suffix: append a base on the right.
    Forward,
    /// Toward the prefix: prepend a base on the left.
    Reverse,
}

impl Direction {
    /// The other direction.
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }
}

/// A graph vertex: the k-mer as oriented in the originating sequence, plus
/// its rolling hash state so neighbour hashes derive in O(1).
///
/// Equality and hashing are canonical: a vertex equals another whose k-mer
/// is the same word or its reverse complement.
#[derive(Clone)]
pub struct Vertex {
    kmer: Box<[u8]>,
    hash: RollingHash,
}

impl Vertex {
    /// Build a vertex from an oriented k-mer and its hash state.
    pub fn new(kmer: &[u8], hash: RollingHash) -> Self {
        debug_assert_eq!(kmer.len(), hash.k());
        Self {
            kmer: kmer.into(),
            hash,
        }
    }

    /// Build a vertex by hashing `kmer` from scratch. `None` if the word
    /// contains a non-ACGT byte.
    pub fn from_kmer(kmer: &[u8]) -> Option<Self> {
        RollingHash::from_kmer(kmer).map(|hash| Self {
            kmer: kmer.into(),
            hash,
        })
    }

    /// The k-mer as oriented in the sequence it came from.
    #[inline]
    pub fn kmer(&self) -> &[u8] {
        &self.kmer
    }

    /// Rolling hash state.
    #[inline]
    pub fn hash(&self) -> &RollingHash {
        &self.hash
    }

    /// Window length.
    #[inline]
    pub fn k(&self) -> usize {
        self.kmer.len()
    }

    /// First base of the oriented k-mer.
    #[inline]
    pub fn first_base(&self) -> u8 {
        self.kmer[0]
    }

    /// Last base of the oriented k-mer.
    #[inline]
    pub fn last_base(&self) -> u8 {
        self.kmer[self.kmer.len() - 1]
    }

    /// The vertex one base step away in `dir`, entering on `base`.
    #[must_use]
    pub fn shift(&self, dir: Direction, base: u8) -> Self {
        let k = self.k();
        let mut kmer = Vec::with_capacity(k);
        let hash = match dir {
            Direction::Forward => {
                kmer.extend_from_slice(&self.kmer[1..]);
                kmer.push(base);
                self.hash.roll_forward(self.first_base(), base)
            }
            Direction::Reverse => {
                kmer.push(base);
                kmer.extend_from_slice(&self.kmer[..k - 1]);
                self.hash.roll_backward(base, self.last_base())
            }
        };
        Self {
            kmer: kmer.into(),
            hash,
        }
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.kmer == other.kmer || is_reverse_complement(&self.kmer, &other.kmer)
    }
}

impl Eq for Vertex {}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Strand-canonical, so equal vertices collide as required.
        state.write_u64(self.hash.base_value());
    }
}

impl fmt::Debug for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vertex({})", String::from_utf8_lossy(&self.kmer))
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.kmer))
    }
}

/// Membership view of the de Bruijn graph induced by a solid-k-mer filter.
#[derive(Debug, Clone, Copy)]
pub struct ImplicitDbg<'a> {
    solid: &'a BloomFilter,
}

impl<'a> ImplicitDbg<'a> {
    /// Create the view over a solid-k-mer filter.
    pub fn new(solid: &'a BloomFilter) -> Self {
        Self { solid }
    }

    /// The underlying filter.
    #[inline]
    pub fn solid(&self) -> &'a BloomFilter {
        self.solid
    }

    /// Window length of the graph.
    #[inline]
    pub fn k(&self) -> usize {
        self.solid.k()
    }

    /// True iff the filter affirms this vertex.
    pub fn contains(&self, v: &Vertex) -> bool {
        self.solid
            .contains(&v.hash().hashes(self.solid.num_hashes()))
    }

    /// Neighbours of `v` one base step away in `dir`, at most four.
    pub fn neighbors(&self, v: &Vertex, dir: Direction) -> Vec<Vertex> {
        let mut out = Vec::with_capacity(4);
        for base in BASES {
            let candidate = v.shift(dir, base);
            if self.contains(&candidate) {
                out.push(candidate);
            }
        }
        out
    }

    /// Forward neighbours (single-base suffix extensions).
    #[inline]
    pub fn successors(&self, v: &Vertex) -> Vec<Vertex> {
        self.neighbors(v, Direction::Forward)
    }

    /// Reverse neighbours (single-base prefix extensions).
    #[inline]
    pub fn predecessors(&self, v: &Vertex) -> Vec<Vertex> {
        self.neighbors(v, Direction::Reverse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_from(seqs: &[&[u8]], k: usize) -> BloomFilter {
        let filter = BloomFilter::new(1 << 16, 1, k).unwrap();
        for seq in seqs {
            filter.load_sequence(seq);
        }
        filter
    }

    #[test]
    fn test_vertex_canonical_identity() {
        let a = Vertex::from_kmer(b"AAAC").unwrap();
        let rc = Vertex::from_kmer(b"GTTT").unwrap();
        let other = Vertex::from_kmer(b"AAAG").unwrap();
        assert_eq!(a, rc);
        assert_ne!(a, other);

        let mut set = ahash::AHashSet::new();
        set.insert(a.clone());
        assert!(set.contains(&rc));
        assert!(!set.contains(&other));
    }

    #[test]
    fn test_vertex_shift() {
        let v = Vertex::from_kmer(b"ACGT").unwrap();
        let fwd = v.shift(Direction::Forward, b'A');
        assert_eq!(fwd.kmer(), b"CGTA");
        let rev = v.shift(Direction::Reverse, b'T');
        assert_eq!(rev.kmer(), b"TACG");

        // Shifted hash state matches a from-scratch hash.
        let scratch = RollingHash::from_kmer(b"CGTA").unwrap();
        assert_eq!(fwd.hash().base_value(), scratch.base_value());
        let scratch = RollingHash::from_kmer(b"TACG").unwrap();
        assert_eq!(rev.hash().base_value(), scratch.base_value());
    }

    #[test]
    fn test_successors_on_linear_sequence() {
        let solid = solid_from(&[b"AACCGGTT"], 4);
        let graph = ImplicitDbg::new(&solid);

        let v = Vertex::from_kmer(b"ACCG").unwrap();
        assert!(graph.contains(&v));

        let succs = graph.successors(&v);
        assert_eq!(succs.len(), 1);
        assert_eq!(succs[0].kmer(), b"CCGG");

        let preds = graph.predecessors(&v);
        assert_eq!(preds.len(), 1);
        assert_eq!(preds[0].kmer(), b"AACC");
    }

    #[test]
    fn test_degree_at_fork() {
        // AAC extends to both AACA and AACC.
        let solid = solid_from(&[b"AACA", b"AACC"], 3);
        let graph = ImplicitDbg::new(&solid);
        let v = Vertex::from_kmer(b"AAC").unwrap();
        let succs = graph.successors(&v);
        assert_eq!(succs.len(), 2);
    }

    #[test]
    fn test_membership_is_canonical() {
        let solid = solid_from(&[b"AAAC"], 4);
        let graph = ImplicitDbg::new(&solid);
        // The reverse complement is the same vertex.
        assert!(graph.contains(&Vertex::from_kmer(b"GTTT").unwrap()));
    }
}
