//! FASTA input and contig output.
//!
//! Input is read with needletail (transparent gzip, multi-line records) and
//! multiple files are concatenated logically; `-` names standard input.
//! Records are copied to owned, case-folded buffers so the shared reader
//! lock is held only long enough to pull the next record.

use crate::encoding::fold_case;
use crate::error::AssemblyError;
use needletail::parser::FastxReader;
use needletail::{parse_fastx_file, parse_fastx_stdin};
use std::io::Write;
use std::path::{Path, PathBuf};

/// One input read: ID token and uppercase sequence bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FastaRecord {
    /// First whitespace-delimited token of the header line.
    pub id: String,
    /// Sequence bytes, folded to uppercase.
    pub seq: Vec<u8>,
}

impl FastaRecord {
    fn from_parts(header: &[u8], seq: &[u8]) -> Self {
        let id = header
            .split(|b| b.is_ascii_whitespace())
            .next()
            .unwrap_or_default();
        let mut seq = seq.to_vec();
        fold_case(&mut seq);
        Self {
            id: String::from_utf8_lossy(id).into_owned(),
            seq,
        }
    }
}

/// Sequential reader over one or more FASTA/FASTQ inputs.
pub struct FastaConcat {
    inputs: Vec<PathBuf>,
    next_input: usize,
    current: Option<Box<dyn FastxReader>>,
}

impl FastaConcat {
    /// Create a reader over `inputs`, in order. Each plain path is checked
    /// for readability up front so missing files fail before any assembly
    /// work starts; `-` is read from standard input.
    pub fn new<P: AsRef<Path>>(inputs: &[P]) -> Result<Self, AssemblyError> {
        let inputs: Vec<PathBuf> = inputs.iter().map(|p| p.as_ref().to_path_buf()).collect();
        if inputs.is_empty() {
            return Err(AssemblyError::Config("no input files given".into()));
        }
        for path in &inputs {
            if path.as_os_str() != "-" {
                std::fs::metadata(path)?;
            }
        }
        Ok(Self {
            inputs,
            next_input: 0,
            current: None,
        })
    }

    fn open_next(&mut self) -> Result<bool, AssemblyError> {
        let Some(path) = self.inputs.get(self.next_input) else {
            return Ok(false);
        };
        self.next_input += 1;
        let reader = if path.as_os_str() == "-" {
            parse_fastx_stdin()
        } else {
            parse_fastx_file(path)
        }
        .map_err(|e| AssemblyError::InputFormat(format!("{}: {e}", path.display())))?;
        self.current = Some(reader);
        Ok(true)
    }

    /// Pull the next record, crossing file boundaries transparently.
    /// `Ok(None)` when every input is exhausted.
    pub fn next_record(&mut self) -> Result<Option<FastaRecord>, AssemblyError> {
        loop {
            let Some(reader) = self.current.as_mut() else {
                if self.open_next()? {
                    continue;
                }
                return Ok(None);
            };
            match reader.next() {
                Some(Ok(record)) => {
                    return Ok(Some(FastaRecord::from_parts(record.id(), &record.seq())));
                }
                Some(Err(e)) => {
                    return Err(AssemblyError::InputFormat(e.to_string()));
                }
                None => {
                    self.current = None;
                }
            }
        }
    }
}

impl std::fmt::Debug for FastaConcat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastaConcat")
            .field("inputs", &self.inputs)
            .field("next_input", &self.next_input)
            .finish()
    }
}

/// FASTA writer for assembled contigs.
///
/// Contig ordinals are contiguous from zero in emission order; the header
/// records which read seeded the contig.
#[derive(Debug)]
pub struct ContigWriter<W: Write> {
    out: W,
    next_id: u64,
}

impl<W: Write> ContigWriter<W> {
    /// Wrap an output stream.
    pub fn new(out: W) -> Self {
        Self { out, next_id: 0 }
    }

    /// Write one contig record and return its ordinal.
    pub fn write_contig(&mut self, read_id: &str, seq: &[u8]) -> Result<u64, AssemblyError> {
        let id = self.next_id;
        writeln!(self.out, ">{id} read:{read_id}")?;
        self.out.write_all(seq)?;
        self.out.write_all(b"\n")?;
        self.next_id += 1;
        Ok(id)
    }

    /// Number of contigs written so far.
    #[inline]
    pub fn num_contigs(&self) -> u64 {
        self.next_id
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<(), AssemblyError> {
        self.out.flush()?;
        Ok(())
    }
}
