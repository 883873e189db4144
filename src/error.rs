use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal error classes surfaced by the alignment run.
///
/// Kernel failures are not represented here: a rejected alignment drops its
/// record and bumps a counter, it never aborts the run.
#[derive(Debug, Error)]
pub enum AlignError {
    /// An input file could not be opened, decompressed, or read.
    #[error("input {}: {source}", path.display())]
    InputOpen { path: PathBuf, source: io::Error },

    /// A mapping line violated the expected mashmap column layout.
    #[error("malformed mapping record ({reason}): {line:?}")]
    MalformedMapping { line: String, reason: String },

    /// The same sequence id appeared twice while building the reference index.
    #[error("duplicate reference sequence id {0:?}")]
    DuplicateRefId(String),

    /// I/O error on the alignment output stream.
    #[error("writing alignment output: {0}")]
    OutputWrite(io::Error),
}
