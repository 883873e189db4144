pub mod cigar;
pub mod error;
pub mod fasta; // FASTA reading for references and queries (gz-aware)
pub mod kernel; // pluggable pairwise-alignment backends
pub mod paf;
pub mod params;
pub mod pipeline;
pub mod refindex;
pub mod utils;
