use anyhow::Context;
use bloomasm_lib::{
    load_reads, write_graph, Assembler, AssemblyConfig, AssemblyError, BloomFilter,
};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{BufWriter, Write};
use tracing::info;

#[derive(Parser)]
#[command(name = "bloomasm")]
#[command(version = "0.1.0")]
#[command(about = "Probabilistic de Bruijn graph assembler for DNA short reads", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble reads into contigs
    Assemble {
        /// Input FASTA/FASTQ files (gzip ok)
        #[arg(required = true)]
        inputs: Vec<String>,

        /// K-mer length
        #[arg(short, long)]
        k: usize,

        /// Approximate genome size in bases (sizes the k-mer filters)
        #[arg(short, long)]
        genome_size: u64,

        /// Number of hash functions per k-mer filter
        #[arg(short = 'H', long, default_value = "1")]
        num_hashes: usize,

        /// Worker threads (0 = all available cores)
        #[arg(short, long, default_value = "0")]
        threads: usize,

        /// Output FASTA file (default: stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Print progress messages to stderr
        #[arg(short, long)]
        verbose: bool,
    },

    /// Dump the de Bruijn graph reachable from the reads in GraphViz format
    Graph {
        /// Input FASTA/FASTQ files (gzip ok)
        #[arg(required = true)]
        inputs: Vec<String>,

        /// K-mer length
        #[arg(short, long)]
        k: usize,

        /// Approximate genome size in bases (sizes the k-mer filter)
        #[arg(short, long)]
        genome_size: u64,

        /// Number of hash functions per k-mer filter
        #[arg(short = 'H', long, default_value = "1")]
        num_hashes: usize,

        /// Output dot file (default: stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Print progress messages to stderr
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing: use RUST_LOG if set, otherwise default to info
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Assemble {
            inputs,
            k,
            genome_size,
            num_hashes,
            threads,
            output,
            verbose,
        } => assemble_command(inputs, k, genome_size, num_hashes, threads, output, verbose),
        Commands::Graph {
            inputs,
            k,
            genome_size,
            num_hashes,
            output,
            verbose,
        } => graph_command(inputs, k, genome_size, num_hashes, output, verbose),
    }
}

/// Build the solid-k-mer filter from the reads, then assemble them.
#[allow(clippy::too_many_arguments)]
fn assemble_command(
    inputs: Vec<String>,
    k: usize,
    genome_size: u64,
    num_hashes: usize,
    threads: usize,
    output: Option<String>,
    verbose: bool,
) -> anyhow::Result<()> {
    reject_stdin(&inputs)?;

    let config = AssemblyConfig {
        k,
        genome_size,
        num_hashes,
        threads,
        verbose,
    };
    let assembler = Assembler::new(config)?;

    info!("Building solid k-mer filter (k={k}, {num_hashes} hash functions)...");
    let solid = BloomFilter::new(genome_size, num_hashes, k)?;
    let loaded = load_reads(&inputs, &solid, threads, verbose)?;
    info!("Loaded {loaded} reads into the solid filter");

    info!("Assembling...");
    let stats = match &output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("cannot create {path}"))?;
            let mut out = BufWriter::new(file);
            let stats = assembler.assemble(&inputs, &solid, &mut out)?;
            out.flush()?;
            stats
        }
        None => {
            let mut out = BufWriter::new(std::io::stdout());
            let stats = assembler.assemble(&inputs, &solid, &mut out)?;
            out.flush()?;
            stats
        }
    };

    info!(
        "Assembled {} contigs, {} bp, from {} reads ({} extended)",
        stats.contigs, stats.bases_assembled, stats.reads_processed, stats.reads_extended
    );
    Ok(())
}

/// Build the k-mer filter from the reads, then dump the reachable graph.
fn graph_command(
    inputs: Vec<String>,
    k: usize,
    genome_size: u64,
    num_hashes: usize,
    output: Option<String>,
    verbose: bool,
) -> anyhow::Result<()> {
    reject_stdin(&inputs)?;

    info!("Building k-mer filter (k={k}, {num_hashes} hash functions)...");
    let filter = BloomFilter::new(genome_size, num_hashes, k)?;
    let loaded = load_reads(&inputs, &filter, 0, verbose)?;
    info!("Loaded {loaded} reads into the filter");

    let stats = match &output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("cannot create {path}"))?;
            let mut out = BufWriter::new(file);
            let stats = write_graph(&inputs, &filter, &mut out, verbose)?;
            out.flush()?;
            stats
        }
        None => {
            let mut out = BufWriter::new(std::io::stdout());
            let stats = write_graph(&inputs, &filter, &mut out, verbose)?;
            out.flush()?;
            stats
        }
    };

    info!(
        "Visited {} k-mers and {} edges across {} reads",
        stats.nodes_visited, stats.edges_visited, stats.reads_processed
    );
    Ok(())
}

/// Both subcommands read their inputs twice (filter load, then traversal),
/// so standard input cannot be used.
fn reject_stdin(inputs: &[String]) -> Result<(), AssemblyError> {
    if inputs.iter().any(|p| p == "-") {
        return Err(AssemblyError::Config(
            "standard input cannot be read twice; pass the reads as files".into(),
        ));
    }
    Ok(())
}
