//! Read-seeded parallel assembly driver.
//!
//! Each worker repeatedly pulls one read from the shared input, gates it
//! (too short, error-laden, already covered), converts it to a graph path,
//! splits the path at true branches, extends the terminal pieces, and emits
//! the surviving pieces as FASTA contigs.
//!
//! Shared state is the assembled-k-mer filter, the contig writer, and the
//! counters. The recheck-insert-write sequence at emission is one critical
//! section: without it two workers could both find a region unclaimed and
//! write the same contig.

use crate::bloom::BloomFilter;
use crate::constants::{ASSEMBLY_PROGRESS_STEP, LOAD_BATCH_BYTES, LOAD_PROGRESS_STEP};
use crate::error::AssemblyError;
use crate::extend::{extend_with_chop, min_branch_len, split_path};
use crate::fasta::{ContigWriter, FastaConcat, FastaRecord};
use crate::graph::{Direction, ImplicitDbg};
use crate::path::seq_to_path;
use crate::rolling::KmerHashIterator;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::info;

/// Assembly parameters.
#[derive(Debug, Clone)]
pub struct AssemblyConfig {
    /// K-mer length; must match the solid set's.
    pub k: usize,
    /// Genome size hint in bases; sizes the assembled-k-mer filter.
    pub genome_size: u64,
    /// Hash functions per filter element; must match the solid set's.
    pub num_hashes: usize,
    /// Worker thread count; 0 uses all available cores.
    pub threads: usize,
    /// Emit progress and summary diagnostics.
    pub verbose: bool,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            k: 31,
            genome_size: 100_000_000,
            num_hashes: 1,
            threads: 0,
            verbose: false,
        }
    }
}

impl AssemblyConfig {
    /// Create a configuration with the given k-mer length and genome size
    /// hint, validating the parameters.
    pub fn new(k: usize, genome_size: u64) -> Result<Self, AssemblyError> {
        let config = Self {
            k,
            genome_size,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the parameters.
    pub fn validate(&self) -> Result<(), AssemblyError> {
        if self.k < 2 {
            return Err(AssemblyError::Config(format!(
                "k must be at least 2, got {}",
                self.k
            )));
        }
        if self.genome_size == 0 {
            return Err(AssemblyError::Config(
                "genome size hint must be non-zero".into(),
            ));
        }
        if self.num_hashes == 0 {
            return Err(AssemblyError::Config(
                "at least one hash function is required".into(),
            ));
        }
        Ok(())
    }

    /// Log the configuration.
    pub fn print(&self) {
        info!("Assembly configuration:");
        info!("  k = {}", self.k);
        info!("  genome_size = {}", self.genome_size);
        info!("  num_hashes = {}", self.num_hashes);
        if self.threads == 0 {
            info!("  threads = all available cores");
        } else {
            info!("  threads = {}", self.threads);
        }
    }
}

/// Monotone assembly counters, updated with relaxed atomic adds.
#[derive(Debug, Default)]
pub struct AssemblyCounters {
    reads_processed: AtomicU64,
    reads_extended: AtomicU64,
    bases_assembled: AtomicU64,
}

impl AssemblyCounters {
    fn snapshot(&self, contigs: u64) -> AssemblyStats {
        AssemblyStats {
            reads_processed: self.reads_processed.load(Ordering::Relaxed),
            reads_extended: self.reads_extended.load(Ordering::Relaxed),
            bases_assembled: self.bases_assembled.load(Ordering::Relaxed),
            contigs,
        }
    }
}

/// Final tallies of one assembly run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssemblyStats {
    /// Reads pulled from the input, including skipped ones.
    pub reads_processed: u64,
    /// Reads that passed every gate, whether or not a contig was emitted.
    pub reads_extended: u64,
    /// Total bases across emitted contigs.
    pub bases_assembled: u64,
    /// Number of emitted contigs.
    pub contigs: u64,
}

fn progress_line(extended: u64, processed: u64, bases: u64) -> String {
    let pct = if processed > 0 {
        100.0 * extended as f64 / processed as f64
    } else {
        0.0
    };
    format!("Extended {extended} of {processed} reads ({pct:.1}%), assembled {bases} bp so far")
}

/// True iff `seq` spans at least one window, every window is ACGT-only and
/// contiguous with its neighbour, and every window's k-mer is in `filter`.
///
/// A non-ACGT byte anywhere in the window span fails the check, so a read
/// with a single bad base is rejected whole.
pub fn all_kmers_in(seq: &[u8], filter: &BloomFilter) -> bool {
    let k = filter.k();
    if seq.len() < k {
        return false;
    }
    let expected = seq.len() - k + 1;
    let mut produced = 0usize;
    for window in KmerHashIterator::new(seq, k) {
        if !filter.contains(&window.hash.hashes(filter.num_hashes())) {
            return false;
        }
        produced += 1;
    }
    produced == expected
}

/// Stream every record of `inputs` and insert all its k-mers into `filter`.
///
/// Workers pull batches of records bounded by a byte budget so the input
/// lock is acquired once per batch. Returns the number of reads loaded.
pub fn load_reads<P: AsRef<std::path::Path>>(
    inputs: &[P],
    filter: &BloomFilter,
    threads: usize,
    verbose: bool,
) -> Result<u64, AssemblyError> {
    let reader = Mutex::new(FastaConcat::new(inputs)?);
    let loaded = AtomicU64::new(0);
    let failed = AtomicBool::new(false);
    let error: Mutex<Option<AssemblyError>> = Mutex::new(None);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| AssemblyError::Config(format!("failed to create thread pool: {e}")))?;

    pool.broadcast(|_| {
        let mut batch: Vec<FastaRecord> = Vec::new();
        loop {
            if failed.load(Ordering::Relaxed) {
                return;
            }
            batch.clear();
            {
                let mut guard = reader.lock().unwrap();
                let mut bytes = 0usize;
                while bytes < LOAD_BATCH_BYTES {
                    match guard.next_record() {
                        Ok(Some(record)) => {
                            bytes += record.seq.len();
                            batch.push(record);
                        }
                        Ok(None) => break,
                        Err(e) => {
                            failed.store(true, Ordering::Relaxed);
                            *error.lock().unwrap() = Some(e);
                            return;
                        }
                    }
                }
            }
            if batch.is_empty() {
                return;
            }
            for record in &batch {
                filter.load_sequence(&record.seq);
                let count = loaded.fetch_add(1, Ordering::Relaxed) + 1;
                if verbose && count % LOAD_PROGRESS_STEP == 0 {
                    info!("Loaded {count} reads into filter");
                }
            }
        }
    });

    if let Some(e) = error.lock().unwrap().take() {
        return Err(e);
    }
    let total = loaded.load(Ordering::Relaxed);
    if verbose {
        info!(
            "Loaded {total} reads into filter ({} of {} bits set)",
            filter.pop_count(),
            filter.num_bits()
        );
    }
    Ok(total)
}

/// The assembly driver.
#[derive(Debug)]
pub struct Assembler {
    config: AssemblyConfig,
}

impl Assembler {
    /// Create a driver with a validated configuration.
    pub fn new(config: AssemblyConfig) -> Result<Self, AssemblyError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The driver's configuration.
    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    /// Assemble `inputs` against the solid set, writing FASTA contigs to
    /// `out`. Terminates when the input is exhausted.
    pub fn assemble<P, W>(
        &self,
        inputs: &[P],
        solid: &BloomFilter,
        out: &mut W,
    ) -> Result<AssemblyStats, AssemblyError>
    where
        P: AsRef<std::path::Path>,
        W: Write + Send,
    {
        if solid.k() != self.config.k {
            return Err(AssemblyError::Config(format!(
                "solid set was built for k={}, configured k={}",
                solid.k(),
                self.config.k
            )));
        }
        if solid.num_hashes() != self.config.num_hashes {
            return Err(AssemblyError::Config(format!(
                "solid set uses {} hash functions, configured {}",
                solid.num_hashes(),
                self.config.num_hashes
            )));
        }

        let min_len = min_branch_len(self.config.k);
        if self.config.verbose {
            self.config.print();
            info!("Treating branches shorter than {min_len} k-mers as filter false positives");
        }

        // Capacity is rounded up to a whole number of 64-bit words.
        let assembled = BloomFilter::new(
            self.config.genome_size,
            self.config.num_hashes,
            self.config.k,
        )?;
        let graph = ImplicitDbg::new(solid);
        let reader = Mutex::new(FastaConcat::new(inputs)?);
        let emit = Mutex::new(ContigWriter::new(out));
        let counters = AssemblyCounters::default();
        let failed = AtomicBool::new(false);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
            .map_err(|e| AssemblyError::Config(format!("failed to create thread pool: {e}")))?;

        let results = pool.broadcast(|_| -> Result<(), AssemblyError> {
            loop {
                if failed.load(Ordering::Relaxed) {
                    return Ok(());
                }
                let pulled = reader.lock().unwrap().next_record();
                let record = match pulled {
                    Ok(Some(record)) => record,
                    Ok(None) => return Ok(()),
                    Err(e) => {
                        failed.store(true, Ordering::Relaxed);
                        return Err(e);
                    }
                };
                if let Err(e) = self.process_read(&record, &graph, &assembled, &emit, &counters) {
                    failed.store(true, Ordering::Relaxed);
                    return Err(e);
                }
            }
        });
        for result in results {
            result?;
        }

        let mut writer = emit.into_inner().unwrap();
        writer.flush()?;
        let stats = counters.snapshot(writer.num_contigs());
        if self.config.verbose {
            info!(
                "{}",
                progress_line(stats.reads_extended, stats.reads_processed, stats.bases_assembled)
            );
            info!("Assembly complete");
        }
        Ok(stats)
    }

    /// Gate, split, extend, and emit one read.
    fn process_read<W: Write>(
        &self,
        record: &FastaRecord,
        graph: &ImplicitDbg<'_>,
        assembled: &BloomFilter,
        emit: &Mutex<ContigWriter<W>>,
        counters: &AssemblyCounters,
    ) -> Result<(), AssemblyError> {
        let k = self.config.k;
        let min_len = min_branch_len(k);

        let mut skip = record.seq.len() < k;
        // Only extend error-free reads.
        if !skip && !all_kmers_in(&record.seq, graph.solid()) {
            skip = true;
        }
        // Skip reads lying wholly in previously assembled regions.
        if !skip && all_kmers_in(&record.seq, assembled) {
            skip = true;
        }

        if !skip {
            if let Some(path) = seq_to_path(&record.seq, k) {
                // Split at branching vertices to prevent over-assembly,
                // then grow only the outward-facing ends.
                let pieces = split_path(&path, graph, min_len);
                let num_pieces = pieces.len();
                for (i, mut piece) in pieces.into_iter().enumerate() {
                    if num_pieces == 1 {
                        extend_with_chop(&mut piece, Direction::Forward, graph, min_len);
                        extend_with_chop(&mut piece, Direction::Reverse, graph, min_len);
                    } else if i == 0 {
                        extend_with_chop(&mut piece, Direction::Reverse, graph, min_len);
                    } else if i == num_pieces - 1 {
                        extend_with_chop(&mut piece, Direction::Forward, graph, min_len);
                    }
                    let seq = piece.to_seq()?;

                    // Recheck under the emission lock: another worker may
                    // have claimed this region since the coverage gate.
                    let mut writer = emit.lock().unwrap();
                    if !all_kmers_in(&seq, assembled) {
                        assembled.load_sequence(&seq);
                        writer.write_contig(&record.id, &seq)?;
                        counters
                            .bases_assembled
                            .fetch_add(seq.len() as u64, Ordering::Relaxed);
                    }
                }
            }
            counters.reads_extended.fetch_add(1, Ordering::Relaxed);
        }

        let processed = counters.reads_processed.fetch_add(1, Ordering::Relaxed) + 1;
        if self.config.verbose && processed % ASSEMBLY_PROGRESS_STEP == 0 {
            let extended = counters.reads_extended.load(Ordering::Relaxed);
            let bases = counters.bases_assembled.load(Ordering::Relaxed);
            info!("{}", progress_line(extended, processed, bases));
        }
        Ok(())
    }
}
