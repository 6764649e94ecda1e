//! Cursors restricted to a sub-box or to the border of an array.
//!
//! These never touch the shape: a restricted cursor walks the same buffer
//! with narrower per-axis bounds, so its offsets index the same buffer.

use tracing::trace;

use crate::axes::{AxisSelection, AxisVec};
use crate::cursor::{check_block, LoopCursor};
use crate::{LoopError, Result, ShapeDescriptor};

/// A Ready cursor over the same buffer, axes and base as `cursor`, walking
/// only the inclusive `bounds` of each axis.
///
/// # Errors
/// - [`LoopError::RankMismatch`] unless there is one bound per axis
/// - [`LoopError::RangeOutOfBounds`] if a bound is inverted or leaves the
///   cursor's current bounds
/// - [`LoopError::NonContiguousBlock`] if the narrowed block axes no longer
///   form one run
pub fn restrict_to_sub_box(cursor: &LoopCursor, bounds: &[(usize, usize)]) -> Result<LoopCursor> {
    let rank = cursor.shape().rank();
    if bounds.len() != rank {
        return Err(LoopError::RankMismatch(bounds.len(), rank));
    }
    for (axis, &(lo, hi)) in bounds.iter().enumerate() {
        if lo > hi || lo < cursor.lower()[axis] || hi > cursor.upper()[axis] {
            return Err(LoopError::RangeOutOfBounds {
                axis,
                lo,
                hi,
                size: cursor.shape().dim(axis),
            });
        }
    }
    let (lower, upper): (AxisVec, AxisVec) = bounds.iter().copied().unzip();
    check_block(cursor.shape(), cursor.selection(), &lower, &upper)?;
    trace!(bounds = ?bounds, "restricted cursor to sub-box");
    Ok(cursor.with_bounds(lower, upper))
}

/// A Ready cursor over the part of `cursor`'s range that lies at least
/// `margins[axis]` elements away from both ends of every axis.
///
/// # Errors
/// - [`LoopError::RankMismatch`] unless there is one margin per axis
/// - [`LoopError::RangeOutOfBounds`] if the margins leave nothing on some
///   axis
pub fn restrict_to_interior(cursor: &LoopCursor, margins: &[usize]) -> Result<LoopCursor> {
    let rank = cursor.shape().rank();
    if margins.len() != rank {
        return Err(LoopError::RankMismatch(margins.len(), rank));
    }
    let mut bounds = Vec::with_capacity(rank);
    for (axis, &m) in margins.iter().enumerate() {
        let (lo, hi) = (cursor.lower()[axis], cursor.upper()[axis]);
        if m > (hi - lo) / 2 {
            return Err(LoopError::RangeOutOfBounds {
                axis,
                lo: lo.saturating_add(m),
                hi: hi.saturating_sub(m),
                size: cursor.shape().dim(axis),
            });
        }
        bounds.push((lo + m, hi - m));
    }
    restrict_to_sub_box(cursor, &bounds)
}

/// A cursor over one border of `shape`, one element thick.
///
/// `edge_index / 2` names the axis and `edge_index % 2` the side: 0 for the
/// low border (index 0), 1 for the high one (index `dim - 1`). The cursor
/// walks `active_axes`, `active_axes[0]` innermost, over the full extent of
/// every other axis.
///
/// # Errors
/// [`LoopError::AxisOutOfRange`] if the addressed axis does not exist or is
/// not active, plus the errors of [`LoopCursor::new`] for a bad selection.
pub fn restrict_to_edge_shell(
    shape: &ShapeDescriptor,
    active_axes: &[usize],
    edge_index: usize,
) -> Result<LoopCursor> {
    let (axis, high) = (edge_index / 2, edge_index % 2 == 1);
    if axis >= shape.rank() || !active_axes.contains(&axis) {
        return Err(LoopError::AxisOutOfRange {
            axis,
            rank: shape.rank(),
        });
    }
    let mut bounds = shape.full_bounds();
    let at = if high { shape.dim(axis) - 1 } else { 0 };
    bounds[axis] = (at, at);
    trace!(axis, high, "edge shell cursor");
    LoopCursor::new(shape, AxisSelection::new(active_axes), Some(&bounds), 0)
}

/// Cursors that together visit every border element of the active axes
/// exactly once.
///
/// The shells of `active_axes[0]` span the full array; each later axis
/// skips the borders already covered by the axes before it. An axis of
/// extent 1 contributes only its low shell.
pub fn edge_shells(shape: &ShapeDescriptor, active_axes: &[usize]) -> Result<Vec<LoopCursor>> {
    let selection = AxisSelection::new(active_axes);
    selection.validate(shape.rank())?;
    let mut bounds = shape.full_bounds();
    let mut shells = Vec::with_capacity(2 * active_axes.len());
    for &axis in active_axes {
        let top = shape.dim(axis) - 1;
        let sides: &[usize] = if top > 0 { &[0, top] } else { &[0] };
        for &at in sides {
            let mut shell = bounds.clone();
            shell[axis] = (at, at);
            shells.push(LoopCursor::new(shape, selection.clone(), Some(&shell), 0)?);
        }
        // Nothing of this axis is left once both borders are taken.
        if top < 2 {
            break;
        }
        bounds[axis] = (1, top - 1);
    }
    trace!(shells = shells.len(), "edge shells");
    Ok(shells)
}
