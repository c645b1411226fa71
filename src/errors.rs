use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error type for record decoding, sampling, and configuration failures.
#[derive(Debug, Error)]
pub enum SamplerError {
    /// A record line could not be decoded; the split is aborted.
    #[error("record decode failed at {}:{line}: {reason}", .path.display())]
    RecordDecode {
        path: PathBuf,
        line: u64,
        reason: String,
    },
    #[error("cannot draw {requested} records for label '{label}': only {available} available")]
    SampleSize {
        label: String,
        requested: usize,
        available: usize,
    },
    #[error("configuration error: {0}")]
    Config(String),
    /// The underlying file could not be read (not a data problem).
    #[error(transparent)]
    Io(#[from] io::Error),
}
