//! Reorder a native witness into the canonical layout

use log::trace;

use super::layout::{Layout, LayoutMode};
use super::R1csError;

/// Reorder `w` (native order) into `[inputs, one, outputs, internal]`.
///
/// `one` is written into the constant slot rather than copied from `w[0]`.
///
/// In [LayoutMode::Reference] the internal block is read starting at native index
/// `n_outputs + n_inputs`, i.e. one entry early: the last input appears again right after the
/// outputs and the result has `n_vars + 1` entries. Existing exported fixtures have this shape.
/// [LayoutMode::Corrected] yields a true permutation, with `out[k] == w[layout.from_canonical(k)]`.
pub fn reindex_witness<T: Clone>(
    w: &[T],
    one: T,
    layout: &Layout,
    mode: LayoutMode,
) -> Result<Vec<T>, R1csError> {
    if w.len() != layout.n_vars || layout.n_vars < layout.last_io() + 1 {
        return Err(R1csError::WitnessLengthMismatch {
            expected: layout.n_vars.max(layout.last_io() + 1),
            actual: w.len(),
        });
    }
    let n_outputs = layout.n_outputs;
    let last_io = layout.last_io();
    let tail_start = match mode {
        LayoutMode::Reference => last_io,
        LayoutMode::Corrected => last_io + 1,
    };
    trace!(
        "Reindexing {} witness entries ({:?}), internal block from native {}",
        w.len(),
        mode,
        tail_start
    );
    let mut out = Vec::with_capacity(w.len() + 1);
    out.extend_from_slice(&w[n_outputs + 1..last_io + 1]);
    out.push(one);
    out.extend_from_slice(&w[1..n_outputs + 1]);
    out.extend_from_slice(&w[tail_start..]);
    Ok(out)
}

/// The native index whose value [reindex_witness] places at canonical index `k`.
///
/// For the constant slot this is `0`, which holds the one by construction.
pub fn native_source(layout: &Layout, mode: LayoutMode, k: usize) -> usize {
    match mode {
        LayoutMode::Reference if k > layout.last_io() => k - 1,
        _ => layout.from_canonical(k),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn native(layout: &Layout) -> Vec<String> {
        (0..layout.n_vars)
            .map(|i| if i == 0 { "1".into() } else { format!("w{i}") })
            .collect()
    }

    #[quickcheck]
    fn corrected_round_trips(layout: Layout) -> bool {
        let w = native(&layout);
        let out = reindex_witness(&w, "1".to_owned(), &layout, LayoutMode::Corrected).unwrap();
        out.len() == w.len()
            && (0..out.len()).all(|k| out[k] == w[layout.from_canonical(k)])
            && (0..w.len()).all(|i| out[layout.to_canonical(i)] == w[i])
    }

    #[quickcheck]
    fn reference_matches_native_source(layout: Layout) -> bool {
        let w = native(&layout);
        let out = reindex_witness(&w, "1".to_owned(), &layout, LayoutMode::Reference).unwrap();
        out.len() == w.len() + 1
            && (0..out.len()).all(|k| out[k] == w[native_source(&layout, LayoutMode::Reference, k)])
    }

    #[quickcheck]
    fn modes_agree_before_internals(layout: Layout) -> bool {
        let w = native(&layout);
        let r = reindex_witness(&w, "1".to_owned(), &layout, LayoutMode::Reference).unwrap();
        let c = reindex_witness(&w, "1".to_owned(), &layout, LayoutMode::Corrected).unwrap();
        r[..=layout.last_io()] == c[..=layout.last_io()]
    }

    #[test]
    fn reference_overlap_is_kept() {
        // [1, o1, o2, x1, x2, x3, t1, t2]
        let layout = Layout::new(2, 1, 2, 8);
        let w = native(&layout);
        let out = reindex_witness(&w, "1".to_owned(), &layout, LayoutMode::Reference).unwrap();
        assert_eq!(
            out,
            vec!["w3", "w4", "w5", "1", "w1", "w2", "w5", "w6", "w7"]
        );
        // canonical 6 should hold t1 (native 6) but holds the last input: known discrepancy
        assert_ne!(out[6], w[layout.from_canonical(6)]);
        assert_eq!(out[6], w[5]);
    }

    #[test]
    fn corrected_layout() {
        let layout = Layout::new(2, 1, 2, 8);
        let w = native(&layout);
        let out = reindex_witness(&w, "1".to_owned(), &layout, LayoutMode::Corrected).unwrap();
        assert_eq!(out, vec!["w3", "w4", "w5", "1", "w1", "w2", "w6", "w7"]);
    }

    #[test]
    fn length_checked() {
        let layout = Layout::new(2, 1, 2, 8);
        let mut w = native(&layout);
        w.pop();
        assert!(matches!(
            reindex_witness(&w, "1".to_owned(), &layout, LayoutMode::Corrected),
            Err(R1csError::WitnessLengthMismatch {
                expected: 8,
                actual: 7
            })
        ));
        let too_small = Layout::new(2, 1, 2, 4);
        let w: Vec<String> = (0..4).map(|i| i.to_string()).collect();
        assert!(reindex_witness(&w, "1".to_owned(), &too_small, LayoutMode::Reference).is_err());
    }
}
