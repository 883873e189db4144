//! Gap-affine wavefront alignment, semi-global.
//!
//! Wavefronts of furthest-reaching text offsets are kept per score for the
//! match (`M`), insertion (`I`) and deletion (`D`) states; matches extend
//! along diagonals for free. The free text prefix seeds score 0 on every
//! text diagonal, and the search stops at the first score whose `M`
//! wavefront consumes the whole pattern (the text suffix is free).
//! All wavefronts are retained for the backtrace, so memory grows with the
//! alignment score — sized for the bounded-divergence windows the upstream
//! mapper emits.

use super::{AlignmentPath, PairwiseAligner};
use crate::cigar::{self, CigarPath, OP_DEL, OP_INS, OP_MATCH, OP_MISMATCH};

const NULL: i32 = i32::MIN;

/// Gap-affine penalties; matches are free. A gap of length `L` costs
/// `gap_open + gap_extend * L`.
#[derive(Debug, Clone, Copy)]
pub struct Penalties {
    pub mismatch: u32,
    pub gap_open: u32,
    pub gap_extend: u32,
}

impl Default for Penalties {
    fn default() -> Self {
        Self {
            mismatch: 4,
            gap_open: 6,
            gap_extend: 2,
        }
    }
}

#[derive(Default)]
pub struct WavefrontAligner {
    penalties: Penalties,
}

impl WavefrontAligner {
    pub fn new(penalties: Penalties) -> Self {
        Self { penalties }
    }
}

/// One score's wavefronts. Diagonals are `k = h - v` (text minus pattern
/// position); offsets store the furthest-reaching text position `h`.
struct Wavefront {
    lo: i32,
    hi: i32,
    m: Vec<i32>,
    i: Vec<i32>,
    d: Vec<i32>,
}

impl Wavefront {
    fn new(lo: i32, hi: i32) -> Self {
        let len = (hi - lo + 1) as usize;
        Self {
            lo,
            hi,
            m: vec![NULL; len],
            i: vec![NULL; len],
            d: vec![NULL; len],
        }
    }

    #[inline]
    fn idx(&self, k: i32) -> Option<usize> {
        if k < self.lo || k > self.hi {
            None
        } else {
            Some((k - self.lo) as usize)
        }
    }

    #[inline]
    fn get_m(&self, k: i32) -> i32 {
        self.idx(k).map_or(NULL, |i| self.m[i])
    }

    #[inline]
    fn get_i(&self, k: i32) -> i32 {
        self.idx(k).map_or(NULL, |i| self.i[i])
    }

    #[inline]
    fn get_d(&self, k: i32) -> i32 {
        self.idx(k).map_or(NULL, |i| self.d[i])
    }
}

/// Candidate sources of `M[s][k]` before diagonal extension.
struct Candidates {
    mismatch: i32,
    ins: i32,
    del: i32,
}

impl Candidates {
    fn best(&self) -> i32 {
        self.mismatch.max(self.ins).max(self.del)
    }
}

struct Search<'a> {
    pattern: &'a [u8],
    text: &'a [u8],
    m: i32,
    n: i32,
    x: i32,
    oe: i32,
    e: i32,
    waves: Vec<Wavefront>,
}

impl<'a> Search<'a> {
    /// Extend a furthest-reaching point along its diagonal over matches.
    fn extend(&self, k: i32, mut h: i32) -> i32 {
        let mut v = h - k;
        while v < self.m
            && h < self.n
            && self.pattern[v as usize] == self.text[h as usize]
        {
            v += 1;
            h += 1;
        }
        h
    }

    /// Valid `(h, v)` cell for this problem.
    fn in_range(&self, h: i32, k: i32) -> bool {
        let v = h - k;
        (0..=self.n).contains(&h) && (0..=self.m).contains(&v)
    }

    fn prev_m(&self, s: i32, delta: i32, k: i32) -> i32 {
        if s >= delta {
            self.waves[(s - delta) as usize].get_m(k)
        } else {
            NULL
        }
    }

    fn prev_i(&self, s: i32, delta: i32, k: i32) -> i32 {
        if s >= delta {
            self.waves[(s - delta) as usize].get_i(k)
        } else {
            NULL
        }
    }

    fn prev_d(&self, s: i32, delta: i32, k: i32) -> i32 {
        if s >= delta {
            self.waves[(s - delta) as usize].get_d(k)
        } else {
            NULL
        }
    }

    /// The recurrence for diagonal `k` at score `s`, shared by the forward
    /// pass and the backtrace.
    fn candidates(&self, s: i32, k: i32) -> Candidates {
        // insertion consumes one pattern base: k+1 -> k, offset unchanged
        let mut ins = self.prev_m(s, self.oe, k + 1).max(self.prev_i(s, self.e, k + 1));
        if ins != NULL && !self.in_range(ins, k) {
            ins = NULL;
        }

        // deletion consumes one text base: k-1 -> k, offset + 1
        let mut del = self.prev_m(s, self.oe, k - 1).max(self.prev_d(s, self.e, k - 1));
        if del != NULL {
            del += 1;
            if !self.in_range(del, k) {
                del = NULL;
            }
        }

        // mismatch advances both: same k, offset + 1
        let mut mismatch = self.prev_m(s, self.x, k);
        if mismatch != NULL {
            mismatch += 1;
            if !self.in_range(mismatch, k) {
                mismatch = NULL;
            }
        }

        Candidates { mismatch, ins, del }
    }

    fn compute_wavefront(&self, s: i32) -> Wavefront {
        let prev = &self.waves[(s - 1) as usize];
        let lo = (prev.lo - 1).max(-self.m);
        let hi = (prev.hi + 1).min(self.n);
        let mut wave = Wavefront::new(lo, hi);

        for k in lo..=hi {
            let cands = self.candidates(s, k);
            let slot = (k - lo) as usize;
            wave.i[slot] = cands.ins;
            wave.d[slot] = cands.del;
            let best = cands.best();
            if best != NULL {
                wave.m[slot] = self.extend(k, best);
            }
        }
        wave
    }

    /// Lowest diagonal whose `M` point consumed the whole pattern.
    fn terminal_diagonal(&self, wave: &Wavefront) -> Option<i32> {
        (wave.lo..=wave.hi).find(|&k| {
            let h = wave.get_m(k);
            h != NULL && h - k == self.m
        })
    }

    fn backtrace(&self, final_s: i32, final_k: i32) -> CigarPath {
        enum State {
            M,
            I,
            D,
        }

        let mut path = CigarPath::new(); // built back-to-front
        let mut s = final_s;
        let mut k = final_k;
        let mut h = self.waves[s as usize].get_m(k);
        let mut state = State::M;

        loop {
            match state {
                State::M => {
                    if s == 0 {
                        // score-0 seed at (v=0, h=k); the rest was extension
                        debug_assert_eq!(self.waves[0].get_m(k), h);
                        cigar::push(&mut path, OP_MATCH, (h - k) as u32);
                        break;
                    }
                    let cands = self.candidates(s, k);
                    let pre = cands.best();
                    debug_assert!(pre != NULL && pre <= h);
                    cigar::push(&mut path, OP_MATCH, (h - pre) as u32);
                    h = pre;
                    if cands.ins != NULL && h == cands.ins {
                        state = State::I;
                    } else if cands.del != NULL && h == cands.del {
                        state = State::D;
                    } else {
                        debug_assert_eq!(h, cands.mismatch);
                        cigar::push(&mut path, OP_MISMATCH, 1);
                        s -= self.x;
                        h -= 1;
                    }
                }
                State::I => {
                    cigar::push(&mut path, OP_INS, 1);
                    let ext = self.prev_i(s, self.e, k + 1);
                    if ext == h {
                        s -= self.e;
                    } else {
                        debug_assert_eq!(self.prev_m(s, self.oe, k + 1), h);
                        s -= self.oe;
                        state = State::M;
                    }
                    k += 1;
                }
                State::D => {
                    cigar::push(&mut path, OP_DEL, 1);
                    h -= 1;
                    let ext = self.prev_d(s, self.e, k - 1);
                    if ext == h {
                        s -= self.e;
                    } else {
                        debug_assert_eq!(self.prev_m(s, self.oe, k - 1), h);
                        s -= self.oe;
                        state = State::M;
                    }
                    k -= 1;
                }
            }
        }

        path.reverse();
        path
    }
}

impl PairwiseAligner for WavefrontAligner {
    fn align(
        &self,
        pattern: &[u8],
        text: &[u8],
        max_edits: Option<u32>,
    ) -> Option<AlignmentPath> {
        let m = pattern.len() as i32;
        let n = text.len() as i32;
        if m == 0 {
            return None;
        }

        let x = self.penalties.mismatch as i32;
        let e = self.penalties.gap_extend as i32;
        let oe = (self.penalties.gap_open + self.penalties.gap_extend) as i32;

        // A pure-insertion path always exists, so the search is bounded;
        // with an edit bound no admissible path can cost more than
        // limit * max(mismatch, open + extend).
        let mut score_cap = self.penalties.gap_open as i32 + e * m;
        if let Some(limit) = max_edits {
            score_cap = score_cap.min(limit as i32 * x.max(oe));
        }

        let mut search = Search {
            pattern,
            text,
            m,
            n,
            x,
            oe,
            e,
            waves: Vec::new(),
        };

        // Free text prefix: seed every diagonal k with (v=0, h=k).
        let mut seed = Wavefront::new(0, n);
        for k in 0..=n {
            seed.m[k as usize] = search.extend(k, k);
        }
        let mut terminal = search.terminal_diagonal(&seed);
        search.waves.push(seed);

        let mut s: i32 = 0;
        while terminal.is_none() {
            s += 1;
            if s > score_cap {
                return None;
            }
            let wave = search.compute_wavefront(s);
            terminal = search.terminal_diagonal(&wave);
            search.waves.push(wave);
        }

        let ops = search.backtrace(s, terminal.unwrap());
        if ops.is_empty() {
            return None;
        }
        let edit_distance = cigar::edits(&ops);
        if let Some(limit) = max_edits {
            if edit_distance > limit {
                return None;
            }
        }

        Some(AlignmentPath { edit_distance, ops })
    }
}
