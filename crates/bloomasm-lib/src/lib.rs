// bloomasm: probabilistic de Bruijn graph assembly of DNA short reads.
//
// The graph is never materialized: a Bloom filter of solid k-mers stands in
// for the vertex set, and neighbours are found by rolling each vertex's
// hash one base in either direction and testing membership.

#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod assemble;
pub mod bloom;
pub mod constants;
pub mod encoding;
pub mod error;
pub mod extend;
pub mod fasta;
pub mod graph;
pub mod graphviz;
pub mod path;
pub mod rolling;

// Re-export common types at crate root
pub use assemble::{load_reads, Assembler, AssemblyConfig, AssemblyStats};
pub use bloom::BloomFilter;
pub use error::AssemblyError;
pub use extend::{extend_path, min_branch_len, split_path, true_branches, ExtendResult};
pub use fasta::{ContigWriter, FastaConcat, FastaRecord};
pub use graph::{Direction, ImplicitDbg, Vertex};
pub use graphviz::{trim_to_solid, write_graph, GraphStats};
pub use path::{seq_to_path, Path};
pub use rolling::{KmerHashIterator, RollingHash};

/// Version information
pub fn version() -> (u8, u8, u8) {
    (0, 1, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let (major, minor, patch) = version();
        assert_eq!(major, 0);
        assert_eq!(minor, 1);
        assert_eq!(patch, 0);
    }
}
