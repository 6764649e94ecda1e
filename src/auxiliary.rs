//! Stride and axis-list helpers shared by shapes, cursors and loop setup.

use crate::{LoopError, Result};

/// Compute column-major strides: dimension 0 varies fastest.
///
/// `strides[0] = 1`, `strides[i] = strides[i - 1] * dims[i - 1]`, in elements.
pub fn col_major_strides(dims: &[usize]) -> Vec<usize> {
    let rank = dims.len();
    if rank == 0 {
        return vec![];
    }
    let mut strides = vec![1usize; rank];
    for i in 1..rank {
        strides[i] = strides[i - 1] * dims[i - 1];
    }
    strides
}

/// Check that every axis lies in `[0, rank)` and, when `unique`, that no
/// axis repeats.
pub(crate) fn validate_axes(axes: &[usize], rank: usize, unique: bool) -> Result<()> {
    let mut seen = vec![false; rank];
    for &axis in axes {
        if axis >= rank {
            return Err(LoopError::AxisOutOfRange { axis, rank });
        }
        if seen[axis] && unique {
            return Err(LoopError::DuplicateAxis { axis });
        }
        seen[axis] = true;
    }
    Ok(())
}

/// Keep the first occurrence of every axis, preserving order.
pub(crate) fn dedup_axes(axes: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(axes.len());
    for &axis in axes {
        if !out.contains(&axis) {
            out.push(axis);
        }
    }
    out
}

/// Check that `perm` is a permutation of `[0, rank)`.
pub(crate) fn validate_permutation(perm: &[usize], rank: usize) -> Result<()> {
    if perm.len() != rank {
        return Err(LoopError::RankMismatch(perm.len(), rank));
    }
    validate_axes(perm, rank, true)
}

/// The permutation that undoes `perm`: `inv[perm[i]] = i`.
///
/// `perm` must already be a valid permutation.
pub fn inverse_permutation(perm: &[usize]) -> Vec<usize> {
    let mut inv = vec![0usize; perm.len()];
    for (i, &p) in perm.iter().enumerate() {
        inv[p] = i;
    }
    inv
}

/// The axes of `[0, rank)` not listed in `axes`, ascending.
pub(crate) fn complement_axes(axes: &[usize], rank: usize) -> Vec<usize> {
    (0..rank).filter(|a| !axes.contains(a)).collect()
}
