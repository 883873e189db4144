// Parity checks between the two alignment backends. The edit-distance DP
// is unit-cost optimal; the wavefront backend optimizes gap-affine score,
// so the panel below sticks to cases where the optima coincide and
// otherwise checks accounting invariants only.

use mashalign::cigar;
use mashalign::kernel::{build, KernelKind, PairwiseAligner};

fn backends() -> Vec<(&'static str, Box<dyn PairwiseAligner>)> {
    vec![
        ("edit", build(KernelKind::EditDistance)),
        ("wfa", build(KernelKind::Wavefront)),
    ]
}

#[test]
fn test_backends_agree_on_clean_cases() {
    // (pattern, text, expected edit distance)
    let panel: Vec<(&[u8], &[u8], u32)> = vec![
        (b"ACGTACGT", b"ACGTACGT", 0),
        (b"ACGTACGT", b"ACGTACGTAC", 0),
        (b"ACGT", b"TTTTACGTTTTT", 0),
        (b"ACGTACGTAC", b"ACGTTCGTAC", 1),
        (b"ACGTTTACGT", b"ACGTACGT", 2),
        (b"ACGTAC", b"ACGTTTAC", 2),
    ];

    for (pattern, text, expected) in panel {
        for (name, aligner) in backends() {
            let path = aligner
                .align(pattern, text, None)
                .unwrap_or_else(|| panic!("{name} failed on {pattern:?} vs {text:?}"));
            assert_eq!(
                path.edit_distance, expected,
                "{name} edit distance on {pattern:?} vs {text:?}"
            );
            assert_eq!(
                cigar::edits(&path.ops),
                path.edit_distance,
                "{name} path edits disagree with reported distance"
            );
            assert_eq!(
                cigar::query_span(&path.ops) as usize,
                pattern.len(),
                "{name} path must consume the whole pattern"
            );
            assert!(cigar::ref_span(&path.ops) as usize <= text.len());
        }
    }
}

#[test]
fn test_backends_agree_on_rejection() {
    for (name, aligner) in backends() {
        assert!(
            aligner.align(b"AAAAAAAA", b"TTTTTTTT", Some(0)).is_none(),
            "{name} must reject at bound 0"
        );
        assert!(
            aligner.align(b"", b"ACGT", None).is_none(),
            "{name} must reject an empty pattern"
        );
    }
}

#[test]
fn test_wavefront_never_beats_unit_optimum() {
    let panel: Vec<(&[u8], &[u8])> = vec![
        (b"ACGTAGGTACCT", b"GGACGTACGTACGTGG"),
        (b"AACCGGTT", b"TTGGCCAA"),
        (b"ACACACAC", b"ACAGACAC"),
    ];

    let edit = build(KernelKind::EditDistance);
    let wfa = build(KernelKind::Wavefront);
    for (pattern, text) in panel {
        let unit = edit.align(pattern, text, None).unwrap();
        let affine = wfa.align(pattern, text, None).unwrap();
        assert!(
            affine.edit_distance >= unit.edit_distance,
            "affine path has fewer unit edits than the unit-cost optimum"
        );
        assert_eq!(cigar::query_span(&affine.ops) as usize, pattern.len());
    }
}
