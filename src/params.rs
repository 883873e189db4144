use std::path::PathBuf;

use crate::kernel::KernelKind;

/// Run configuration for one alignment batch. The CLI in `main` maps its
/// arguments onto this; tests construct it directly.
#[derive(Debug, Clone)]
pub struct Params {
    /// Reference FASTA file(s), plain or gzipped.
    pub ref_files: Vec<PathBuf>,
    /// Query FASTA file(s), ordered consistently with the mapping file.
    pub query_files: Vec<PathBuf>,
    /// Mashmap mapping file (PAF), grouped by query id in FASTA order.
    pub mappings: PathBuf,
    /// Alignment output path (PAF records with alignment tags appended).
    pub output: PathBuf,
    /// Worker thread count, >= 1.
    pub threads: usize,
    /// Target minimum percent identity; 0 disables the edit bound.
    pub percentage_identity: f32,
    /// Alignment backend.
    pub kernel: KernelKind,
}
