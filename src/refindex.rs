//! Reference sequence index.
//!
//! All reference sequences are loaded up front into a keyed read-only map
//! and shared by reference with every worker for the lifetime of the
//! pipeline. Uppercasing happens at load time so the per-alignment hot
//! path never touches case.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::AlignError;
use crate::fasta::FastaReader;

#[derive(Debug)]
pub struct ReferenceIndex {
    sequences: HashMap<String, Vec<u8>>,
    total_bases: u64,
}

impl ReferenceIndex {
    /// Scan one or more FASTA inputs and index every sequence by id.
    ///
    /// A repeated id, within or across files, is a fatal error.
    pub fn build(paths: &[PathBuf]) -> Result<Self, AlignError> {
        let mut sequences: HashMap<String, Vec<u8>> = HashMap::new();
        let mut total_bases = 0u64;

        for path in paths {
            log::debug!("parsing reference sequences in {}", path.display());
            let mut reader = FastaReader::open(path)?;
            let mut file_seqs = 0usize;
            let mut file_bases = 0u64;

            while let Some(record) = reader.next_record()? {
                file_seqs += 1;
                file_bases += record.seq.len() as u64;
                if sequences.insert(record.id.clone(), record.seq).is_some() {
                    return Err(AlignError::DuplicateRefId(record.id));
                }
            }

            total_bases += file_bases;
            log::info!(
                "Loaded {} reference sequences ({} bp) from {}",
                file_seqs,
                file_bases,
                path.display()
            );
        }

        Ok(Self {
            sequences,
            total_bases,
        })
    }

    /// Immutable view of a reference sequence.
    ///
    /// Every mapping record handed to a worker refers to a sequence this
    /// index contains; an absent key here means that invariant was broken
    /// upstream, so this panics rather than returning an error.
    pub fn get(&self, id: &str) -> &[u8] {
        self.sequences
            .get(id)
            .unwrap_or_else(|| panic!("reference sequence {:?} missing from index", id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sequences.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn total_bases(&self) -> u64 {
        self.total_bases
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let dir = PathBuf::from("target/test_refindex");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_build_and_get() {
        let path = write_temp("refs.fa", ">r1\nacgtacgtac\n>r2 extra header words\nTTTT\n");
        let index = ReferenceIndex::build(&[path]).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.total_bases(), 14);
        assert_eq!(index.get("r1"), b"ACGTACGTAC");
        assert_eq!(index.get("r2"), b"TTTT");
        assert!(index.contains("r2"));
        assert!(!index.contains("r3"));
    }

    #[test]
    fn test_duplicate_id_within_file_is_fatal() {
        let path = write_temp("dup.fa", ">r1\nAAAA\n>r1\nCCCC\n");
        let err = ReferenceIndex::build(&[path]).unwrap_err();
        match err {
            AlignError::DuplicateRefId(id) => assert_eq!(id, "r1"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_id_across_files_is_fatal() {
        let a = write_temp("a.fa", ">shared\nAAAA\n");
        let b = write_temp("b.fa", ">shared\nCCCC\n");
        assert!(ReferenceIndex::build(&[a, b]).is_err());
    }

    #[test]
    #[should_panic(expected = "missing from index")]
    fn test_get_absent_id_panics() {
        let path = write_temp("one.fa", ">r1\nAAAA\n");
        let index = ReferenceIndex::build(&[path]).unwrap();
        index.get("nope");
    }
}
