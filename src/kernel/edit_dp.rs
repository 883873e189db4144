//! Banded semi-global edit-distance alignment with full traceback.
//!
//! Unit-cost dynamic programming with the text free on both flanks: row 0
//! costs nothing (the alignment may start anywhere in the text) and the
//! end point is the cheapest cell of the last row (the alignment may stop
//! anywhere). The band is a left diagonal cutoff: reaching cell `(i, j)`
//! costs at least `i - j`, so columns left of the `i - k` diagonal can
//! never stay within the bound `k` and are skipped. The free text start
//! makes every column to the right reachable, so the band is open on that
//! side; rows whose minimum exceeds the bound abort the search instead.
//! Unbounded queries start from a small band and double it until the
//! optimum fits inside.
//!
//! The traceback matrix is one byte per cell, so memory is
//! `(pattern + 1) * (text + 1)` bytes — sized for the segment-scale
//! windows the upstream mapper emits, not whole chromosomes.

use super::{AlignmentPath, PairwiseAligner};
use crate::cigar::{self, CigarPath, OP_DEL, OP_INS, OP_MATCH, OP_MISMATCH};

pub struct EditDistanceAligner;

const TB_START: u8 = 0; // row 0, free text prefix
const TB_DIAG: u8 = 1;
const TB_UP: u8 = 2; // consumes pattern only
const TB_LEFT: u8 = 3; // consumes text only

/// Starting band for unbounded alignments; doubled until the distance fits.
const INITIAL_BAND: u32 = 64;

/// One banded pass. Cells whose true distance is at most `limit` lie on
/// paths that never leave the band, so they are computed exactly; anything
/// beyond the bound is rejected.
fn banded(pattern: &[u8], text: &[u8], limit: u32) -> Option<AlignmentPath> {
    let m = pattern.len();
    let n = text.len();
    let band = limit as usize;

    let width = n + 1;
    let mut traceback = vec![TB_START; (m + 1) * width];
    let mut prev = vec![0u32; width];
    let mut curr = vec![0u32; width];

    for i in 1..=m {
        curr[0] = i as u32;
        traceback[i * width] = TB_UP;
        let jlo = if i > band { i - band } else { 1 };
        let mut row_min = if jlo == 1 { curr[0] } else { u32::MAX };

        for j in jlo..=n {
            let sub = prev[j - 1] + u32::from(pattern[i - 1] != text[j - 1]);
            let ins = prev[j] + 1;
            let del = if j == jlo && jlo > 1 {
                u32::MAX // left neighbour is outside the band
            } else {
                curr[j - 1] + 1
            };

            // prefer the diagonal, then pattern consumption, on ties
            let (best, dir) = if sub <= ins && sub <= del {
                (sub, TB_DIAG)
            } else if ins <= del {
                (ins, TB_UP)
            } else {
                (del, TB_LEFT)
            };

            curr[j] = best;
            traceback[i * width + j] = dir;
            row_min = row_min.min(best);
        }

        if row_min > limit {
            return None; // no cell can recover within the bound
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    // Free text suffix: end at the cheapest cell of the last row, leftmost
    // on ties. Only the banded cells of the row were computed.
    let mut best_j = if m > band { m - band } else { 0 };
    for j in (best_j + 1)..=n {
        if prev[j] < prev[best_j] {
            best_j = j;
        }
    }
    let distance = prev[best_j];
    if distance > limit {
        return None;
    }

    let mut path = CigarPath::new();
    let mut i = m;
    let mut j = best_j;
    loop {
        match traceback[i * width + j] {
            TB_DIAG => {
                let op = if pattern[i - 1] == text[j - 1] {
                    OP_MATCH
                } else {
                    OP_MISMATCH
                };
                cigar::push(&mut path, op, 1);
                i -= 1;
                j -= 1;
            }
            TB_UP => {
                cigar::push(&mut path, OP_INS, 1);
                i -= 1;
            }
            TB_LEFT => {
                cigar::push(&mut path, OP_DEL, 1);
                j -= 1;
            }
            TB_START => break,
            _ => unreachable!(),
        }
    }
    path.reverse();

    Some(AlignmentPath {
        edit_distance: distance,
        ops: path,
    })
}

impl PairwiseAligner for EditDistanceAligner {
    fn align(
        &self,
        pattern: &[u8],
        text: &[u8],
        max_edits: Option<u32>,
    ) -> Option<AlignmentPath> {
        if pattern.is_empty() {
            return None;
        }
        match max_edits {
            Some(limit) => banded(pattern, text, limit),
            None => {
                // The distance never exceeds the pattern length, so a band
                // that wide is exact; smaller bands are tried first.
                let mut band = INITIAL_BAND;
                while (band as usize) < pattern.len() {
                    if let Some(path) = banded(pattern, text, band) {
                        return Some(path);
                    }
                    band = band.saturating_mul(2);
                }
                banded(pattern, text, pattern.len() as u32)
            }
        }
    }
}
