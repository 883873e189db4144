//! Pluggable pairwise-alignment kernels.
//!
//! The pipeline treats the aligner as a capability: given a strand-oriented
//! query segment (the pattern) and a reference window (the text), produce a
//! semi-global alignment path or report failure. Two interchangeable
//! backends are provided; both align the pattern end-to-end and leave the
//! text free on both flanks.

use crate::cigar::{self, CigarPath};

pub mod edit_dp;
pub mod wavefront;

/// Which alignment backend to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelKind {
    /// Unit-cost edit-distance DP with traceback.
    EditDistance,
    /// Gap-affine wavefront alignment.
    Wavefront,
}

/// A successful semi-global alignment.
#[derive(Debug, Clone)]
pub struct AlignmentPath {
    /// Unit edits along the path (mismatches + inserted + deleted bases).
    pub edit_distance: u32,
    /// Run-length extended-CIGAR path.
    pub ops: CigarPath,
}

impl AlignmentPath {
    pub fn alignment_length(&self) -> u32 {
        cigar::alignment_length(&self.ops)
    }
}

/// Capability interface consumed by the worker pool.
pub trait PairwiseAligner: Send + Sync {
    /// Align `pattern` semi-globally inside `text`, requesting a full path.
    ///
    /// `max_edits` bounds the acceptable edit distance; `None` means
    /// unbounded. Returns `None` when no alignment within the bound exists
    /// or the kernel produced an empty path.
    fn align(&self, pattern: &[u8], text: &[u8], max_edits: Option<u32>)
        -> Option<AlignmentPath>;
}

/// Instantiate the configured backend.
pub fn build(kind: KernelKind) -> Box<dyn PairwiseAligner> {
    match kind {
        KernelKind::EditDistance => Box::new(edit_dp::EditDistanceAligner),
        KernelKind::Wavefront => Box::new(wavefront::WavefrontAligner::default()),
    }
}
