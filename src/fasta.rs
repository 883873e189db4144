// FASTA reader module using bio::io::fasta
//
// Wraps the bio reader with gzip detection by file extension and
// uppercases sequence bytes at read time, so downstream consumers never
// see mixed-case bases.

use bio::io::fasta;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::error::AlignError;
use crate::utils;

/// One FASTA record: the id is the first whitespace token of the header.
pub struct FastaRecord {
    pub id: String,
    pub seq: Vec<u8>,
}

/// Streaming FASTA reader over a plain or gzipped file.
pub struct FastaReader {
    path: PathBuf,
    records: fasta::Records<BufReader<Box<dyn Read>>>,
}

impl std::fmt::Debug for FastaReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastaReader")
            .field("path", &self.path)
            .finish()
    }
}

impl FastaReader {
    pub fn open(path: &Path) -> Result<Self, AlignError> {
        let input = utils::xzopen(path).map_err(|e| AlignError::InputOpen {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            records: fasta::Reader::new(input).records(),
        })
    }

    /// Next record, uppercased, or `None` at end of file.
    pub fn next_record(&mut self) -> Result<Option<FastaRecord>, AlignError> {
        match self.records.next() {
            Some(Ok(record)) => Ok(Some(FastaRecord {
                id: record.id().to_string(),
                seq: record.seq().to_ascii_uppercase(),
            })),
            Some(Err(e)) => Err(AlignError::InputOpen {
                path: self.path.clone(),
                source: e,
            }),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let dir = PathBuf::from("target/test_fasta");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_reads_records_uppercased() {
        let path = write_temp(
            "basic.fa",
            ">s1 some description\nacgt\nACGT\n>s2\nnnnn\n",
        );
        let mut reader = FastaReader::open(&path).unwrap();

        let rec = reader.next_record().unwrap().unwrap();
        assert_eq!(rec.id, "s1");
        assert_eq!(rec.seq, b"ACGTACGT".to_vec());

        let rec = reader.next_record().unwrap().unwrap();
        assert_eq!(rec.id, "s2");
        assert_eq!(rec.seq, b"NNNN".to_vec());

        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn test_open_missing_file_fails() {
        let err = FastaReader::open(Path::new("target/test_fasta/no_such.fa")).unwrap_err();
        assert!(matches!(err, AlignError::InputOpen { .. }));
    }

    #[test]
    fn test_reads_gzipped_input() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let dir = PathBuf::from("target/test_fasta");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("zipped.fa.gz");
        let mut enc = GzEncoder::new(fs::File::create(&path).unwrap(), Compression::default());
        enc.write_all(b">z1\nacgtacgt\n").unwrap();
        enc.finish().unwrap();

        let mut reader = FastaReader::open(&path).unwrap();
        let rec = reader.next_record().unwrap().unwrap();
        assert_eq!(rec.id, "z1");
        assert_eq!(rec.seq, b"ACGTACGT".to_vec());
    }
}
