//! GraphViz serialization of the implicit graph.
//!
//! Reads seed breadth-first traversals over the filter-backed graph; nodes
//! and edges are printed in dot format as they are discovered. Each read is
//! first trimmed to its longest run of filter-member k-mers so traversals
//! start inside the graph. Both strands are traversed.

use crate::bloom::BloomFilter;
use crate::encoding::reverse_complement;
use crate::error::AssemblyError;
use crate::fasta::FastaConcat;
use crate::graph::{ImplicitDbg, Vertex};
use crate::rolling::KmerHashIterator;
use ahash::AHashSet;
use std::collections::VecDeque;
use std::io::Write;
use tracing::info;

/// Interval for progress messages, in reads.
const GRAPH_PROGRESS_STEP: u64 = 1000;

/// Trim `seq` to its longest contiguous run of positions whose k-mer is a
/// member of `filter`, with no skipped (non-ACGT) position inside the run.
/// Ties are broken toward the earliest run; the result is empty when no
/// position qualifies.
pub fn trim_to_solid<'a>(seq: &'a [u8], filter: &BloomFilter) -> &'a [u8] {
    let k = filter.k();
    if seq.len() < k {
        return &seq[..0];
    }

    let mut prev_pos: Option<usize> = None;
    let mut run_start: Option<usize> = None;
    let mut run_len = 0usize;
    let mut best: Option<(usize, usize)> = None;

    let mut close_run = |start: Option<usize>, len: usize| {
        if let Some(s) = start {
            if len > best.map_or(0, |(_, l)| l) {
                best = Some((s, len));
            }
        }
    };

    for window in KmerHashIterator::new(seq, k) {
        let member = filter.contains(&window.hash.hashes(filter.num_hashes()));
        let skipped = prev_pos.is_some_and(|p| window.pos - p > 1);
        if !member || skipped {
            close_run(run_start, run_len);
            run_start = None;
            run_len = 0;
        }
        if member {
            if run_start.is_none() {
                run_start = Some(window.pos);
            }
            run_len += 1;
        }
        prev_pos = Some(window.pos);
    }
    close_run(run_start, run_len);

    match best {
        Some((start, len)) => &seq[start..start + len + k - 1],
        None => &seq[..0],
    }
}

/// Node and edge tallies of one dump.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GraphStats {
    /// Distinct vertices discovered.
    pub nodes_visited: u64,
    /// Edges traversed (each once).
    pub edges_visited: u64,
    /// Reads pulled from the input.
    pub reads_processed: u64,
}

fn breadth_first<W: Write>(
    graph: &ImplicitDbg<'_>,
    start: Vertex,
    visited: &mut AHashSet<Vertex>,
    out: &mut W,
    stats: &mut GraphStats,
) -> Result<(), AssemblyError> {
    if !visited.insert(start.clone()) {
        return Ok(());
    }
    writeln!(out, "\t{start};")?;
    stats.nodes_visited += 1;

    let mut queue = VecDeque::from([start]);
    while let Some(u) = queue.pop_front() {
        for v in graph.successors(&u) {
            writeln!(out, "\t{u} -> {v};")?;
            stats.edges_visited += 1;
            if visited.insert(v.clone()) {
                writeln!(out, "\t{v};")?;
                stats.nodes_visited += 1;
                queue.push_back(v);
            }
        }
    }
    Ok(())
}

/// Dump the subgraph reachable from the reads of `inputs` in dot format.
pub fn write_graph<P, W>(
    inputs: &[P],
    solid: &BloomFilter,
    out: &mut W,
    verbose: bool,
) -> Result<GraphStats, AssemblyError>
where
    P: AsRef<std::path::Path>,
    W: Write,
{
    let k = solid.k();
    let graph = ImplicitDbg::new(solid);
    let mut visited: AHashSet<Vertex> = AHashSet::new();
    let mut stats = GraphStats::default();
    let mut reader = FastaConcat::new(inputs)?;

    if verbose {
        info!("Generating graph dump...");
    }
    writeln!(out, "digraph g {{")?;
    while let Some(record) = reader.next_record()? {
        let seq = trim_to_solid(&record.seq, solid);
        if !seq.is_empty() {
            // Forward strand, then reverse complement, so vertices on both
            // sides of the seed k-mer are reached.
            if let Some(start) = Vertex::from_kmer(&seq[..k]) {
                breadth_first(&graph, start, &mut visited, out, &mut stats)?;
            }
            let rc = reverse_complement(seq);
            if let Some(start) = Vertex::from_kmer(&rc[..k]) {
                breadth_first(&graph, start, &mut visited, out, &mut stats)?;
            }
        }
        stats.reads_processed += 1;
        if verbose && stats.reads_processed % GRAPH_PROGRESS_STEP == 0 {
            info!(
                "processed {} reads (k-mers visited: {}, edges visited: {})",
                stats.reads_processed, stats.nodes_visited, stats.edges_visited
            );
        }
    }
    writeln!(out, "}}")?;

    if verbose {
        info!(
            "processed {} reads (k-mers visited: {}, edges visited: {})",
            stats.reads_processed, stats.nodes_visited, stats.edges_visited
        );
        info!("Graph dump complete");
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn solid_from(seqs: &[&[u8]], k: usize) -> BloomFilter {
        let filter = BloomFilter::new(1 << 20, 1, k).unwrap();
        for seq in seqs {
            filter.load_sequence(seq);
        }
        filter
    }

    #[test]
    fn test_trim_keeps_fully_solid_sequence() {
        let solid = solid_from(&[b"ATCGGCATTC"], 4);
        assert_eq!(trim_to_solid(b"ATCGGCATTC", &solid), b"ATCGGCATTC");
    }

    #[test]
    fn test_trim_selects_longest_run() {
        // Only ATCGGC's windows are solid; the tail is foreign.
        let solid = solid_from(&[b"ATCGGC"], 4);
        assert_eq!(trim_to_solid(b"ATCGGCTTTT", &solid), b"ATCGGC");
        // A leading foreign stretch is dropped too.
        assert_eq!(trim_to_solid(b"TTTTATCGGC", &solid), b"ATCGGC");
    }

    #[test]
    fn test_trim_breaks_run_at_skipped_position() {
        let solid = solid_from(&[b"ATCGGC", b"GCATTC"], 4);
        // The N splits two solid runs; the earlier, longer one wins.
        assert_eq!(trim_to_solid(b"ATCGGCNGCAT", &solid), b"ATCGGC");
    }

    #[test]
    fn test_trim_ties_take_earliest() {
        let solid = solid_from(&[b"ATCG", b"GCAT"], 4);
        // Two single-window runs of equal length.
        assert_eq!(trim_to_solid(b"ATCGNGCAT", &solid), b"ATCG");
    }

    #[test]
    fn test_trim_empty_cases() {
        let solid = solid_from(&[b"ATCG"], 4);
        assert_eq!(trim_to_solid(b"ATC", &solid), b"");
        assert_eq!(trim_to_solid(b"TTTTTT", &solid), b"");
    }

    #[test]
    fn test_write_graph_single_kmer() {
        let solid = solid_from(&[b"AAAC"], 4);
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b">r\nAAAC\n").unwrap();
        file.flush().unwrap();

        let mut out = Vec::new();
        let stats = write_graph(&[file.path()], &solid, &mut out, false).unwrap();
        assert_eq!(stats.nodes_visited, 1);
        assert_eq!(stats.edges_visited, 0);
        assert_eq!(stats.reads_processed, 1);
        assert_eq!(String::from_utf8(out).unwrap(), "digraph g {\n\tAAAC;\n}\n");
    }

    #[test]
    fn test_write_graph_linear_chain() {
        let solid = solid_from(&[b"ATCGGCATTC"], 4);
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b">r\nATCGGCATTC\n").unwrap();
        file.flush().unwrap();

        let mut out = Vec::new();
        let stats = write_graph(&[file.path()], &solid, &mut out, false).unwrap();
        // Seven distinct canonical vertices chained by six edges.
        assert_eq!(stats.nodes_visited, 7);
        assert_eq!(stats.edges_visited, 6);
        let dot = String::from_utf8(out).unwrap();
        assert!(dot.starts_with("digraph g {\n"));
        assert!(dot.ends_with("}\n"));
        assert!(dot.contains("ATCG -> TCGG;"));
    }
}
