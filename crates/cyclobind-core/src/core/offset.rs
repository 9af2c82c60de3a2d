use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Pairwise relative-position matrix consumed by the structure-prediction model.
///
/// Entry `(i, j)` holds `residue_index[i] - residue_index[j]` for a linear chain.
pub type OffsetMatrix = DMatrix<i64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignConvention {
    /// Negates the circular distance wherever it is shorter than the linear one, so that
    /// crossing the closure point keeps the same direction as the interior of the ring.
    #[default]
    BugFixed,
    /// Multiplies the circular distance by the linear sign only. Neighbours across the
    /// closure point end up with the opposite sign of interior neighbours.
    Legacy,
}

#[derive(Debug, Error)]
#[error("Invalid sign convention '{0}'. Expected 'bug-fixed' or 'legacy'.")]
pub struct ParseSignConventionError(String);

impl FromStr for SignConvention {
    type Err = ParseSignConventionError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bug-fixed" | "bugfixed" | "bug_fixed" => Ok(SignConvention::BugFixed),
            "legacy" => Ok(SignConvention::Legacy),
            _ => Err(ParseSignConventionError(s.to_string())),
        }
    }
}

impl fmt::Display for SignConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SignConvention::BugFixed => "bug-fixed",
            SignConvention::Legacy => "legacy",
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum OffsetError {
    #[error("Binder length must be a positive integer")]
    EmptyBinder,

    #[error(
        "Requested binder length {requested} does not match the prepared binder length {prepared}"
    )]
    BinderLengthMismatch { requested: usize, prepared: usize },

    #[error("Offset matrix is {rows}x{cols}, expected {expected}x{expected}")]
    ShapeMismatch {
        expected: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Protocol '{protocol}' defines no binder segment to cyclize")]
    NoBinderSegment { protocol: &'static str },
}

/// Index jump the engine inserts between the last target residue and the binder.
pub const BINDER_CHAIN_GAP: i64 = 50;

/// Segment lengths of a modeled complex: target residues first, binder residues last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainLayout {
    pub target_len: usize,
    pub binder_len: usize,
}

impl ChainLayout {
    pub fn new(target_len: usize, binder_len: usize) -> Self {
        Self {
            target_len,
            binder_len,
        }
    }

    #[inline]
    pub fn total_len(&self) -> usize {
        self.target_len + self.binder_len
    }

    /// First row/column of the binder block.
    #[inline]
    pub fn binder_start(&self) -> usize {
        self.target_len
    }

    /// Residue indices of a freshly prepared complex: the target numbered from zero, the
    /// binder starting [`BINDER_CHAIN_GAP`] past the last target residue.
    pub fn residue_index(&self) -> Vec<i64> {
        let last_target = self.target_len.saturating_sub(1) as i64;
        let binder_first = last_target + BINDER_CHAIN_GAP;
        (0..self.target_len as i64)
            .chain((0..self.binder_len as i64).map(|k| binder_first + k))
            .collect()
    }
}

pub fn linear_offset(residue_index: &[i64]) -> OffsetMatrix {
    let n = residue_index.len();
    OffsetMatrix::from_fn(n, n, |i, j| residue_index[i] - residue_index[j])
}

/// Shortest path between positions `a` and `b` on a ring of `len` residues.
///
/// Both positions are unrolled to `{p, p + len}` and the smallest of the four absolute
/// differences is taken, which covers travel in either direction across the closure point.
pub fn circular_distance(a: usize, b: usize, len: usize) -> usize {
    let (a, b, l) = (a as i64, b as i64, len as i64);
    [a, a + l]
        .into_iter()
        .flat_map(|x| [b, b + l].into_iter().map(move |y| (x - y).abs()))
        .min()
        .unwrap_or(0) as usize
}

/// Builds the `len x len` offset block of a head-to-tail cyclic chain.
pub fn cyclic_offset(len: usize, convention: SignConvention) -> Result<OffsetMatrix, OffsetError> {
    if len == 0 {
        return Err(OffsetError::EmptyBinder);
    }

    Ok(OffsetMatrix::from_fn(len, len, |a, b| {
        let linear = a as i64 - b as i64;
        let mut circular = circular_distance(a, b, len) as i64;
        if convention == SignConvention::BugFixed && circular < linear.abs() {
            circular = -circular;
        }
        circular * linear.signum()
    }))
}

/// Overwrites the binder-binder block of `offset` with the cyclic block for `binder_len`.
///
/// Only the last `binder_len` rows and columns are written. On error the matrix is left
/// untouched.
pub fn apply_cyclic_offset(
    offset: &mut OffsetMatrix,
    layout: ChainLayout,
    binder_len: usize,
    convention: SignConvention,
) -> Result<(), OffsetError> {
    if binder_len == 0 {
        return Err(OffsetError::EmptyBinder);
    }
    if binder_len != layout.binder_len {
        return Err(OffsetError::BinderLengthMismatch {
            requested: binder_len,
            prepared: layout.binder_len,
        });
    }
    let expected = layout.total_len();
    if offset.nrows() != expected || offset.ncols() != expected {
        return Err(OffsetError::ShapeMismatch {
            expected,
            rows: offset.nrows(),
            cols: offset.ncols(),
        });
    }

    let block = cyclic_offset(binder_len, convention)?;
    let start = layout.binder_start();
    offset
        .view_mut((start, start), (binder_len, binder_len))
        .copy_from(&block);
    Ok(())
}

pub fn binder_block(offset: &OffsetMatrix, layout: ChainLayout) -> OffsetMatrix {
    let start = layout.binder_start();
    offset
        .view((start, start), (layout.binder_len, layout.binder_len))
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complex_residue_index(target_len: usize, binder_len: usize) -> Vec<i64> {
        ChainLayout::new(target_len, binder_len).residue_index()
    }

    #[test]
    fn residue_index_places_binder_after_chain_gap() {
        let index = ChainLayout::new(3, 2).residue_index();
        assert_eq!(index, vec![0, 1, 2, 52, 53]);
        assert_eq!(index[3] - index[2], BINDER_CHAIN_GAP);
        assert!(ChainLayout::new(0, 0).residue_index().is_empty());
        assert_eq!(ChainLayout::new(0, 2).residue_index(), vec![50, 51]);
    }

    #[test]
    fn linear_offset_is_antisymmetric_and_monotonic() {
        let offset = linear_offset(&[3, 4, 5, 9]);
        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(offset[(i, j)], -offset[(j, i)]);
            }
            for j in 1..4 {
                assert!(offset[(i, j)] < offset[(i, j - 1)]);
            }
        }
        assert_eq!(offset[(3, 0)], 6);
    }

    #[test]
    fn circular_distance_wraps_around_the_closure_point() {
        assert_eq!(circular_distance(0, 3, 4), 1);
        assert_eq!(circular_distance(0, 12, 13), 1);
        assert_eq!(circular_distance(2, 9, 13), 6);
        assert_eq!(circular_distance(5, 5, 13), 0);
    }

    #[test]
    fn cyclic_offset_rejects_empty_binder() {
        assert_eq!(
            cyclic_offset(0, SignConvention::BugFixed),
            Err(OffsetError::EmptyBinder)
        );
    }

    #[test]
    fn cyclic_offset_for_four_residues_matches_hand_computation() {
        let offset = cyclic_offset(4, SignConvention::BugFixed).unwrap();
        #[rustfmt::skip]
        let expected = OffsetMatrix::from_row_slice(4, 4, &[
             0, -1, -2,  1,
             1,  0, -1, -2,
             2,  1,  0, -1,
            -1,  2,  1,  0,
        ]);
        assert_eq!(offset, expected);
        assert_eq!(offset[(0, 3)].abs(), 1);
    }

    #[test]
    fn default_binder_length_wraps_first_and_last_residue() {
        let offset = cyclic_offset(13, SignConvention::BugFixed).unwrap();
        assert_eq!(offset[(0, 12)].abs(), 1);
        assert_eq!(offset[(12, 0)].abs(), 1);
    }

    #[test]
    fn magnitudes_never_exceed_half_the_ring() {
        for len in 1..=40 {
            for convention in [SignConvention::BugFixed, SignConvention::Legacy] {
                let offset = cyclic_offset(len, convention).unwrap();
                let max = offset.iter().map(|v| v.unsigned_abs()).max().unwrap();
                assert!(max as usize <= len / 2, "len {len} {convention}");
            }
        }
    }

    #[test]
    fn magnitudes_equal_shortest_ring_distance() {
        let len = 11;
        let offset = cyclic_offset(len, SignConvention::BugFixed).unwrap();
        for i in 0..len {
            for j in 0..len {
                let d = i.abs_diff(j);
                assert_eq!(offset[(i, j)].unsigned_abs() as usize, d.min(len - d));
            }
        }
    }

    #[test]
    fn diagonal_is_zero() {
        let offset = cyclic_offset(9, SignConvention::BugFixed).unwrap();
        assert!(offset.diagonal().iter().all(|&v| v == 0));
    }

    #[test]
    fn magnitude_is_symmetric() {
        for convention in [SignConvention::BugFixed, SignConvention::Legacy] {
            let offset = cyclic_offset(13, convention).unwrap();
            for i in 0..13 {
                for j in 0..13 {
                    assert_eq!(offset[(i, j)].abs(), offset[(j, i)].abs());
                }
            }
        }
    }

    #[test]
    fn bug_fixed_and_legacy_differ_only_in_sign() {
        for len in 1..=25 {
            let fixed = cyclic_offset(len, SignConvention::BugFixed).unwrap();
            let legacy = cyclic_offset(len, SignConvention::Legacy).unwrap();
            for (a, b) in fixed.iter().zip(legacy.iter()) {
                assert_eq!(a.abs(), b.abs());
            }
        }
    }

    #[test]
    fn bug_fixed_keeps_sequence_direction_across_the_closure() {
        let len = 13;
        let offset = cyclic_offset(len, SignConvention::BugFixed).unwrap();
        for i in 0..len {
            assert_eq!(offset[(i, (i + 1) % len)], -1);
            assert_eq!(offset[((i + 1) % len, i)], 1);
        }
        for i in 0..len {
            for j in 0..len {
                assert_eq!(offset[(i, j)], -offset[(j, i)]);
            }
        }
    }

    #[test]
    fn legacy_flips_direction_at_the_closure() {
        let offset = cyclic_offset(13, SignConvention::Legacy).unwrap();
        assert_eq!(offset[(0, 1)], -1);
        assert_eq!(offset[(12, 0)], 1);
        assert_eq!(offset[(0, 12)], -1);
    }

    #[test]
    fn apply_only_touches_binder_block() {
        let layout = ChainLayout::new(7, 5);
        let original = linear_offset(&complex_residue_index(7, 5));
        let mut patched = original.clone();
        apply_cyclic_offset(&mut patched, layout, 5, SignConvention::BugFixed).unwrap();

        for i in 0..layout.total_len() {
            for j in 0..layout.total_len() {
                let in_binder = i >= 7 && j >= 7;
                if !in_binder {
                    assert_eq!(patched[(i, j)], original[(i, j)], "cell ({i}, {j})");
                }
            }
        }
        assert_eq!(
            binder_block(&patched, layout),
            cyclic_offset(5, SignConvention::BugFixed).unwrap()
        );
    }

    #[test]
    fn apply_is_idempotent() {
        let layout = ChainLayout::new(4, 13);
        let mut once = linear_offset(&complex_residue_index(4, 13));
        apply_cyclic_offset(&mut once, layout, 13, SignConvention::BugFixed).unwrap();
        let mut twice = once.clone();
        apply_cyclic_offset(&mut twice, layout, 13, SignConvention::BugFixed).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn apply_rejects_length_mismatch_without_mutation() {
        let layout = ChainLayout::new(3, 6);
        let original = linear_offset(&complex_residue_index(3, 6));
        let mut offset = original.clone();
        let result = apply_cyclic_offset(&mut offset, layout, 5, SignConvention::BugFixed);
        assert_eq!(
            result,
            Err(OffsetError::BinderLengthMismatch {
                requested: 5,
                prepared: 6
            })
        );
        assert_eq!(offset, original);
    }

    #[test]
    fn apply_rejects_wrong_matrix_shape() {
        let layout = ChainLayout::new(3, 6);
        let mut offset = linear_offset(&complex_residue_index(2, 6));
        let result = apply_cyclic_offset(&mut offset, layout, 6, SignConvention::Legacy);
        assert!(matches!(
            result,
            Err(OffsetError::ShapeMismatch { expected: 9, rows: 8, cols: 8 })
        ));
    }

    #[test]
    fn sign_convention_parses_common_spellings() {
        assert_eq!(
            "bug-fixed".parse::<SignConvention>().unwrap(),
            SignConvention::BugFixed
        );
        assert_eq!(
            " Legacy ".parse::<SignConvention>().unwrap(),
            SignConvention::Legacy
        );
        assert!("fixed".parse::<SignConvention>().is_err());
    }
}
