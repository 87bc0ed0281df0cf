//! Error types for assembly.

use thiserror::Error;

/// Errors that abort the assembly pipeline.
///
/// Reads that are merely short, error-laden, or already covered by earlier
/// contigs are not errors; they take the silent skip path in the driver.
#[derive(Error, Debug)]
pub enum AssemblyError {
    /// A read or write on an input/output stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The input could not be parsed as FASTA/FASTQ.
    #[error("malformed sequence input: {0}")]
    InputFormat(String),

    /// Invalid or mismatched construction parameters.
    #[error("configuration error: {0}")]
    Config(String),

    /// A path was converted to a sequence but consecutive vertices do not
    /// overlap by k-1 bases. This is an invariant breach: the driver only
    /// builds paths from contiguous windows.
    #[error("path gap: vertices {0} and {1} do not overlap by k-1 bases")]
    PathGap(usize, usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = AssemblyError::Config("k must be at least 2".into());
        assert!(err.to_string().contains("configuration error"));

        let err = AssemblyError::PathGap(3, 4);
        assert!(err.to_string().contains("path gap"));
    }

    #[test]
    fn test_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err: AssemblyError = io.into();
        assert!(matches!(err, AssemblyError::Io(_)));
    }
}
