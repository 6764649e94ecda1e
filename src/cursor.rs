//! Dimension loop cursors.
//!
//! A [`LoopCursor`] is an odometer over the selected axes of a
//! [`ShapeDescriptor`]. It never touches the buffer it describes: callers
//! read and write `buffer[cursor.offset()]` themselves, so several cursors can
//! step over different arrays without borrowing them.
//!
//! The flat offset is maintained incrementally: a plain step adds one
//! stride, a wrap subtracts the distance travelled on that axis. It is never
//! recomputed from the coordinates while stepping.

use crate::axes::{AxisSelection, AxisVec};
use crate::{LoopError, Result, ShapeDescriptor};

/// Lifecycle of a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Every coordinate sits at the lower bound of its range.
    Ready,
    /// At least one step taken, positions remain.
    Advancing,
    /// The outermost level wrapped. Terminal until [`LoopCursor::reset`].
    Exhausted,
}

/// What a call to [`LoopCursor::advance`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rollover {
    /// Only the innermost level moved.
    Inner,
    /// Levels `0..=k` wrapped back to their lower bounds and level `k + 1`
    /// moved by one.
    Carry(usize),
    /// The outermost level wrapped; there are no positions left.
    Exhausted,
}

impl Rollover {
    /// Highest wrapped level, if any level wrapped without exhausting.
    #[inline]
    pub fn carried_level(self) -> Option<usize> {
        match self {
            Rollover::Carry(level) => Some(level),
            _ => None,
        }
    }

    /// Whether level `level` wrapped during the step.
    #[inline]
    pub fn wrapped(self, level: usize) -> bool {
        match self {
            Rollover::Inner => false,
            Rollover::Carry(k) => level <= k,
            Rollover::Exhausted => true,
        }
    }
}

/// A strided run of elements handed out per step for the block axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub offset: usize,
    pub len: usize,
    pub stride: usize,
}

impl Run {
    /// Offsets of the run, in order.
    pub fn offsets(&self) -> impl Iterator<Item = usize> {
        let Run {
            offset,
            len,
            stride,
        } = *self;
        (0..len).map(move |i| offset + i * stride)
    }
}

/// Stateful cursor over the active axes of a shape.
///
/// Coordinates are kept for every axis of the shape. Inactive axes stay at
/// the lower bound of their range, so restricting an inactive axis picks the
/// fixed position the loop runs at.
#[derive(Debug, Clone)]
pub struct LoopCursor {
    shape: ShapeDescriptor,
    selection: AxisSelection,
    base: usize,
    coords: AxisVec,
    lower: AxisVec,
    upper: AxisVec,
    offset: usize,
    state: CursorState,
    run_len: usize,
    run_stride: usize,
}

/// Build a cursor with one nesting level per active axis, `active_axes[0]`
/// innermost.
///
/// `bounds` holds an inclusive `(lo, hi)` range per axis of `shape` and
/// defaults to the full extent. `base` is the element offset of the buffer
/// start and is added to every reported offset.
pub fn make_cursor(
    shape: &ShapeDescriptor,
    active_axes: &[usize],
    bounds: Option<&[(usize, usize)]>,
    base: usize,
) -> Result<LoopCursor> {
    LoopCursor::new(shape, AxisSelection::new(active_axes), bounds, base)
}

impl LoopCursor {
    /// Build a cursor over `selection`.
    ///
    /// # Errors
    /// - [`LoopError::AxisOutOfRange`], [`LoopError::DuplicateAxis`] for a bad
    ///   selection
    /// - [`LoopError::RankMismatch`], [`LoopError::RangeOutOfBounds`] for bad
    ///   bounds
    /// - [`LoopError::NonContiguousBlock`] if several block axes cannot be
    ///   handed out as one strided run
    pub fn new(
        shape: &ShapeDescriptor,
        selection: AxisSelection,
        bounds: Option<&[(usize, usize)]>,
        base: usize,
    ) -> Result<Self> {
        selection.validate(shape.rank())?;
        let (lower, upper): (AxisVec, AxisVec) = match bounds {
            Some(bounds) => {
                shape.check_bounds(bounds)?;
                bounds.iter().copied().unzip()
            }
            None => shape.dims().iter().map(|&d| (0, d - 1)).unzip(),
        };
        check_block(shape, &selection, &lower, &upper)?;
        Ok(Self::build(shape.clone(), selection, lower, upper, base))
    }

    /// Assemble a cursor from already validated parts, positioned at Ready.
    pub(crate) fn build(
        shape: ShapeDescriptor,
        selection: AxisSelection,
        lower: AxisVec,
        upper: AxisVec,
        base: usize,
    ) -> Self {
        let offset = base
            + lower
                .iter()
                .zip(shape.strides().iter())
                .map(|(&lo, &s)| lo * s)
                .sum::<usize>();
        let (run_len, run_stride) = match selection.block_axes() {
            [] => (1, 1),
            block => (
                block.iter().map(|&a| upper[a] - lower[a] + 1).product(),
                shape.stride(block[0]),
            ),
        };
        Self {
            coords: lower.clone(),
            shape,
            selection,
            base,
            lower,
            upper,
            offset,
            state: CursorState::Ready,
            run_len,
            run_stride,
        }
    }

    /// Step to the next position in nesting order.
    ///
    /// Once the cursor is exhausted every further call returns
    /// [`Rollover::Exhausted`] and leaves it unchanged.
    #[inline]
    pub fn advance(&mut self) -> Rollover {
        if self.state == CursorState::Exhausted {
            return Rollover::Exhausted;
        }
        for level in 0..self.selection.level_count() {
            if self.step_level(level) {
                self.state = CursorState::Advancing;
                return if level == 0 {
                    Rollover::Inner
                } else {
                    Rollover::Carry(level - 1)
                };
            }
        }
        self.state = CursorState::Exhausted;
        Rollover::Exhausted
    }

    /// Move level `level` by one position.
    ///
    /// Returns `false` if the level was at its last position; it is then
    /// wrapped back to its lower bounds.
    #[inline]
    pub(crate) fn step_level(&mut self, level: usize) -> bool {
        let ends = self.selection.level_bounds();
        let start = if level == 0 { 0 } else { ends[level - 1] };
        let end = ends[level];
        for i in start..end {
            let axis = self.selection.coordinate_axes()[i];
            let stride = self.shape.stride(axis);
            if self.coords[axis] < self.upper[axis] {
                self.coords[axis] += 1;
                self.offset += stride;
                return true;
            }
            self.offset -= (self.coords[axis] - self.lower[axis]) * stride;
            self.coords[axis] = self.lower[axis];
        }
        false
    }

    /// Put level `level` back at its lower bounds.
    #[inline]
    pub(crate) fn reset_level(&mut self, level: usize) {
        let ends = self.selection.level_bounds();
        let start = if level == 0 { 0 } else { ends[level - 1] };
        let end = ends[level];
        for i in start..end {
            let axis = self.selection.coordinate_axes()[i];
            self.offset -= (self.coords[axis] - self.lower[axis]) * self.shape.stride(axis);
            self.coords[axis] = self.lower[axis];
        }
    }

    /// Apply the step another cursor reported, level by level.
    ///
    /// Levels of extent 1 stay where they are. The caller guarantees that
    /// every other level has the same extent as in the cursor that produced
    /// `rollover`.
    #[inline]
    pub(crate) fn follow(&mut self, rollover: Rollover) {
        match rollover {
            Rollover::Inner => {
                self.step_level(0);
                self.state = CursorState::Advancing;
            }
            Rollover::Carry(k) => {
                for level in 0..=k {
                    self.reset_level(level);
                }
                self.step_level(k + 1);
                self.state = CursorState::Advancing;
            }
            Rollover::Exhausted => {
                if self.state != CursorState::Exhausted {
                    for level in 0..self.selection.level_count() {
                        self.reset_level(level);
                    }
                    self.state = CursorState::Exhausted;
                }
            }
        }
    }

    /// Return to [`CursorState::Ready`] in place, for another pass over the
    /// same positions.
    pub fn reset(&mut self) {
        for level in 0..self.selection.level_count() {
            self.reset_level(level);
        }
        self.state = CursorState::Ready;
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.state == CursorState::Exhausted
    }

    #[inline]
    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Current flat element offset, including the base offset.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Current coordinate of every axis of the shape.
    #[inline]
    pub fn coords(&self) -> &[usize] {
        &self.coords
    }

    /// The block run at the current position. Without block axes this is the
    /// single current element.
    #[inline]
    pub fn run(&self) -> Run {
        Run {
            offset: self.offset,
            len: self.run_len,
            stride: self.run_stride,
        }
    }

    #[inline]
    pub fn shape(&self) -> &ShapeDescriptor {
        &self.shape
    }

    #[inline]
    pub fn selection(&self) -> &AxisSelection {
        &self.selection
    }

    #[inline]
    pub fn base(&self) -> usize {
        self.base
    }

    /// Inclusive `(lo, hi)` range of every axis.
    pub fn bounds(&self) -> Vec<(usize, usize)> {
        self.lower
            .iter()
            .copied()
            .zip(self.upper.iter().copied())
            .collect()
    }

    #[inline]
    pub fn level_count(&self) -> usize {
        self.selection.level_count()
    }

    /// Number of positions level `level` walks through.
    pub fn level_extent(&self, level: usize) -> usize {
        self.selection
            .level(level)
            .iter()
            .map(|&a| self.upper[a] - self.lower[a] + 1)
            .product()
    }

    /// Number of positions from Ready to Exhausted; the cursor reports
    /// exhaustion on the `total_steps()`-th call to `advance`.
    pub fn total_steps(&self) -> usize {
        (0..self.level_count()).map(|l| self.level_extent(l)).product()
    }

    /// A fresh Ready cursor over the same shape and axes with new bounds.
    pub(crate) fn with_bounds(&self, lower: AxisVec, upper: AxisVec) -> Self {
        Self::build(
            self.shape.clone(),
            self.selection.clone(),
            lower,
            upper,
            self.base,
        )
    }

    pub(crate) fn lower(&self) -> &[usize] {
        &self.lower
    }

    pub(crate) fn upper(&self) -> &[usize] {
        &self.upper
    }
}

/// Several block axes form one run only if each outer axis steps exactly
/// over the full extent of the one before it.
pub(crate) fn check_block(
    shape: &ShapeDescriptor,
    selection: &AxisSelection,
    lower: &[usize],
    upper: &[usize],
) -> Result<()> {
    let block = selection.block_axes();
    for pair in block.windows(2) {
        let (inner, outer) = (pair[0], pair[1]);
        let full = lower[inner] == 0 && upper[inner] == shape.dim(inner) - 1;
        if !full || shape.stride(outer) != shape.stride(inner) * shape.dim(inner) {
            return Err(LoopError::NonContiguousBlock {
                axes: block.to_vec(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ElementType;

    fn shape(dims: &[usize]) -> ShapeDescriptor {
        ShapeDescriptor::new(dims, ElementType::Int32).unwrap()
    }

    fn walk(cursor: &mut LoopCursor) -> Vec<(Vec<usize>, usize)> {
        let mut out = vec![(cursor.coords().to_vec(), cursor.offset())];
        while cursor.advance() != Rollover::Exhausted {
            out.push((cursor.coords().to_vec(), cursor.offset()));
        }
        out
    }

    #[test]
    fn test_single_axis_of_2d() {
        let s = shape(&[4, 3]);
        let mut c = make_cursor(&s, &[0], None, 0).unwrap();
        let offsets: Vec<usize> = walk(&mut c).into_iter().map(|(_, o)| o).collect();
        assert_eq!(offsets, vec![0, 1, 2, 3]);
        assert!(c.is_exhausted());
    }

    #[test]
    fn test_nesting_order_follows_selection() {
        let s = shape(&[2, 3]);
        let mut c = make_cursor(&s, &[1, 0], None, 0).unwrap();
        let offsets: Vec<usize> = walk(&mut c).into_iter().map(|(_, o)| o).collect();
        assert_eq!(offsets, vec![0, 2, 4, 1, 3, 5]);
    }

    #[test]
    fn test_rollover_levels() {
        let s = shape(&[2, 2, 2]);
        let mut c = make_cursor(&s, &[0, 1, 2], None, 0).unwrap();
        let rolls: Vec<Rollover> = (0..8).map(|_| c.advance()).collect();
        assert_eq!(
            rolls,
            vec![
                Rollover::Inner,
                Rollover::Carry(0),
                Rollover::Inner,
                Rollover::Carry(1),
                Rollover::Inner,
                Rollover::Carry(0),
                Rollover::Inner,
                Rollover::Exhausted,
            ]
        );
        assert_eq!(c.advance(), Rollover::Exhausted);
        assert_eq!(c.offset(), 0);
        assert_eq!(c.coords(), &[0, 0, 0]);
    }

    #[test]
    fn test_state_transitions_and_reset() {
        let s = shape(&[3]);
        let mut c = make_cursor(&s, &[0], None, 0).unwrap();
        assert_eq!(c.state(), CursorState::Ready);
        c.advance();
        assert_eq!(c.state(), CursorState::Advancing);
        c.advance();
        c.advance();
        assert_eq!(c.state(), CursorState::Exhausted);
        c.reset();
        assert_eq!(c.state(), CursorState::Ready);
        assert_eq!(walk(&mut c).len(), 3);
    }

    #[test]
    fn test_bounds_and_inactive_axes() {
        let s = shape(&[5, 4]);
        let mut c = make_cursor(&s, &[0], Some(&[(1, 3), (2, 2)]), 0).unwrap();
        let visited = walk(&mut c);
        assert_eq!(
            visited,
            vec![(vec![1, 2], 11), (vec![2, 2], 12), (vec![3, 2], 13)]
        );
    }

    #[test]
    fn test_base_offset_is_added() {
        let s = shape(&[3]);
        let mut c = make_cursor(&s, &[0], None, 100).unwrap();
        let offsets: Vec<usize> = walk(&mut c).into_iter().map(|(_, o)| o).collect();
        assert_eq!(offsets, vec![100, 101, 102]);
    }

    #[test]
    fn test_compressed_level_counts_as_one() {
        let s = shape(&[2, 3, 2]);
        let sel = AxisSelection::from_levels(&[&[0, 1], &[2]]);
        let mut c = LoopCursor::new(&s, sel, None, 0).unwrap();
        assert_eq!(c.level_count(), 2);
        assert_eq!(c.level_extent(0), 6);
        let rolls: Vec<Rollover> = (0..12).map(|_| c.advance()).collect();
        assert_eq!(rolls[4], Rollover::Inner);
        assert_eq!(rolls[5], Rollover::Carry(0));
        assert_eq!(rolls[11], Rollover::Exhausted);
    }

    #[test]
    fn test_block_run() {
        let s = shape(&[4, 3]);
        let sel = AxisSelection::new(&[1]).with_block(&[0]);
        let mut c = LoopCursor::new(&s, sel, None, 0).unwrap();
        assert_eq!(c.total_steps(), 3);
        let run = c.run();
        assert_eq!(run.offsets().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        c.advance();
        assert_eq!(c.run().offset, 4);
        assert_eq!(c.run().len, 4);
    }

    #[test]
    fn test_block_run_along_outer_axis() {
        let s = shape(&[4, 3]);
        let sel = AxisSelection::new(&[0]).with_block(&[1]);
        let c = LoopCursor::new(&s, sel, None, 0).unwrap();
        assert_eq!(c.run().offsets().collect::<Vec<_>>(), vec![0, 4, 8]);
    }

    #[test]
    fn test_multi_axis_block_must_be_contiguous() {
        let s = shape(&[2, 3, 4]);
        let ok = AxisSelection::new(&[2]).with_block(&[0, 1]);
        let c = LoopCursor::new(&s, ok, None, 0).unwrap();
        assert_eq!(c.run(), Run { offset: 0, len: 6, stride: 1 });

        let gap = AxisSelection::new(&[1]).with_block(&[0, 2]);
        assert!(matches!(
            LoopCursor::new(&s, gap, None, 0),
            Err(LoopError::NonContiguousBlock { .. })
        ));

        let partial = AxisSelection::new(&[2]).with_block(&[0, 1]);
        let bounds = [(0, 0), (0, 2), (0, 3)];
        assert!(matches!(
            LoopCursor::new(&s, partial, Some(&bounds), 0),
            Err(LoopError::NonContiguousBlock { .. })
        ));
    }

    #[test]
    fn test_construction_errors() {
        let s = shape(&[2, 2]);
        assert!(matches!(
            make_cursor(&s, &[2], None, 0),
            Err(LoopError::AxisOutOfRange { axis: 2, rank: 2 })
        ));
        assert!(matches!(
            make_cursor(&s, &[0, 0], None, 0),
            Err(LoopError::DuplicateAxis { axis: 0 })
        ));
        assert!(matches!(
            make_cursor(&s, &[0], Some(&[(0, 2), (0, 1)]), 0),
            Err(LoopError::RangeOutOfBounds { axis: 0, .. })
        ));
    }

    #[test]
    fn test_no_active_axes_is_single_position() {
        let s = shape(&[3, 2]);
        let mut c = make_cursor(&s, &[], Some(&[(2, 2), (1, 1)]), 0).unwrap();
        assert_eq!(c.offset(), 5);
        assert_eq!(c.total_steps(), 1);
        assert_eq!(c.advance(), Rollover::Exhausted);
    }

    #[test]
    fn test_rollover_helpers() {
        assert_eq!(Rollover::Carry(2).carried_level(), Some(2));
        assert_eq!(Rollover::Inner.carried_level(), None);
        assert!(Rollover::Carry(1).wrapped(0));
        assert!(!Rollover::Carry(1).wrapped(2));
        assert!(Rollover::Exhausted.wrapped(5));
    }
}
