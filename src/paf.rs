//! Mashmap mapping records.
//!
//! One record per line, whitespace separated, PAF column layout. Only the
//! columns the aligner consumes are retained; the raw line is carried
//! through the pipeline verbatim for output pass-through.

use crate::error::AlignError;

/// Mapping orientation of the query segment against the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
}

/// One parsed mashmap mapping row.
///
/// Coordinates are 0-based and inclusive on both ends, matching the
/// emitting mapper (region length = end - start + 1).
#[derive(Debug, Clone)]
pub struct MappingRecord {
    pub query_id: String,
    pub q_start: usize,
    pub q_end: usize,
    pub strand: Strand,
    pub ref_id: String,
    pub r_start: usize,
    pub r_end: usize,
}

fn parse_coord(token: &str, column: usize, line: &str) -> Result<usize, AlignError> {
    token.parse::<usize>().map_err(|_| AlignError::MalformedMapping {
        line: line.to_string(),
        reason: format!("column {} is not a non-negative integer", column),
    })
}

impl MappingRecord {
    /// Parse one mapping line. At least 9 whitespace-separated columns are
    /// required; extra columns are ignored.
    pub fn parse(line: &str) -> Result<Self, AlignError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 9 {
            return Err(AlignError::MalformedMapping {
                line: line.to_string(),
                reason: format!("expected at least 9 columns, found {}", tokens.len()),
            });
        }

        let strand = match tokens[4] {
            "+" => Strand::Forward,
            "-" => Strand::Reverse,
            other => {
                return Err(AlignError::MalformedMapping {
                    line: line.to_string(),
                    reason: format!("unknown strand token {:?}", other),
                })
            }
        };

        let record = MappingRecord {
            query_id: tokens[0].to_string(),
            q_start: parse_coord(tokens[2], 2, line)?,
            q_end: parse_coord(tokens[3], 3, line)?,
            strand,
            ref_id: tokens[5].to_string(),
            r_start: parse_coord(tokens[7], 7, line)?,
            r_end: parse_coord(tokens[8], 8, line)?,
        };

        if record.q_start > record.q_end {
            return Err(AlignError::MalformedMapping {
                line: line.to_string(),
                reason: "query interval start exceeds end".to_string(),
            });
        }
        if record.r_start > record.r_end {
            return Err(AlignError::MalformedMapping {
                line: line.to_string(),
                reason: "reference interval start exceeds end".to_string(),
            });
        }

        Ok(record)
    }

    /// Length of the query segment (inclusive coordinates).
    pub fn query_span(&self) -> usize {
        self.q_end - self.q_start + 1
    }

    /// Length of the reference window (inclusive coordinates).
    pub fn ref_span(&self) -> usize {
        self.r_end - self.r_start + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forward_record() {
        let rec = MappingRecord::parse("q1 8 0 7 + r1 10 0 7 42").unwrap();
        assert_eq!(rec.query_id, "q1");
        assert_eq!(rec.q_start, 0);
        assert_eq!(rec.q_end, 7);
        assert_eq!(rec.strand, Strand::Forward);
        assert_eq!(rec.ref_id, "r1");
        assert_eq!(rec.r_start, 0);
        assert_eq!(rec.r_end, 7);
        assert_eq!(rec.query_span(), 8);
        assert_eq!(rec.ref_span(), 8);
    }

    #[test]
    fn test_parse_reverse_record_with_tabs() {
        let rec = MappingRecord::parse("q1\t4\t0\t3\t-\tr1\t8\t4\t7").unwrap();
        assert_eq!(rec.strand, Strand::Reverse);
        assert_eq!(rec.r_start, 4);
        assert_eq!(rec.r_end, 7);
    }

    #[test]
    fn test_parse_rejects_short_line() {
        let err = MappingRecord::parse("q1 8 0 7 + r1 10 0").unwrap_err();
        assert!(matches!(err, AlignError::MalformedMapping { .. }));
    }

    #[test]
    fn test_parse_rejects_bad_strand() {
        let err = MappingRecord::parse("q1 8 0 7 * r1 10 0 7").unwrap_err();
        match err {
            AlignError::MalformedMapping { reason, .. } => {
                assert!(reason.contains("strand"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_integer() {
        let err = MappingRecord::parse("q1 8 x 7 + r1 10 0 7").unwrap_err();
        match err {
            AlignError::MalformedMapping { reason, .. } => {
                assert!(reason.contains("column 2"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_rejects_inverted_interval() {
        assert!(MappingRecord::parse("q1 8 7 0 + r1 10 0 7").is_err());
        assert!(MappingRecord::parse("q1 8 0 7 + r1 10 7 0").is_err());
    }
}
