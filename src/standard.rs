//! Standard loop setup: from a source array and a few options to a pair of
//! synchronized cursors and a freshly allocated target.
//!
//! Setup resolves the active axes, decides the target's shape and element
//! type, lays out the nesting order, and only then allocates. Any failure
//! leaves nothing allocated.

use tracing::debug;

use crate::alloc::{AllocError, ArrayAllocator, HeapAllocator};
use crate::array::ArrayHandle;
use crate::auxiliary::{complement_axes, dedup_axes, validate_axes};
use crate::axes::{AxisSelection, AxisVec};
use crate::cursor::{LoopCursor, Rollover, Run};
use crate::group::LoopGroup;
use crate::options::{LoopOptions, OutputShapeMode};
use crate::{ElementType, Result, ShapeDescriptor};

/// A source cursor, a target array and its cursor, advancing together.
///
/// The source cursor is the group's primary. Under
/// [`OutputShapeMode::Reduce`] and [`OutputShapeMode::Collapse`] the target
/// cursor walks a view of the target in which the selected axes have extent
/// 1, so it only moves when the primary carries past them.
#[derive(Debug)]
pub struct StandardLoop {
    group: LoopGroup,
    target: ArrayHandle,
    source_shape: ShapeDescriptor,
    target_view: ShapeDescriptor,
    requested_axes: Vec<usize>,
    axes: Vec<usize>,
    mode: OutputShapeMode,
    options: LoopOptions,
    per_axis: bool,
    pass: usize,
    passes: usize,
}

/// Set up a standard loop over `source`, allocating the target on the heap.
///
/// See [`setup_standard_loop_in`].
pub fn setup_standard_loop(
    source: &ArrayHandle,
    explicit_axes: Option<&[usize]>,
    options: LoopOptions,
    output_type: Option<ElementType>,
) -> Result<StandardLoop> {
    setup_standard_loop_in(source, explicit_axes, options, output_type, &mut HeapAllocator)
}

/// Set up a standard loop over `source`, allocating the target with
/// `allocator`.
///
/// Active axes are every axis under `all_axes`, else `explicit_axes`, else
/// the whole array in natural order as a single pass. Under the reduction
/// options the selected axes form the innermost levels of one pass;
/// otherwise each selected axis gets its own pass (see
/// [`StandardLoop::next_pass`]) in which it is innermost.
///
/// # Errors
/// [`crate::LoopError::AmbiguousOutputShape`],
/// [`crate::LoopError::AxisOutOfRange`], [`crate::LoopError::DuplicateAxis`],
/// [`crate::LoopError::NonContiguousBlock`] and
/// [`crate::LoopError::AllocationFailed`]. The allocator is not called unless
/// every other check passed.
pub fn setup_standard_loop_in<A: ArrayAllocator + ?Sized>(
    source: &ArrayHandle,
    explicit_axes: Option<&[usize]>,
    options: LoopOptions,
    output_type: Option<ElementType>,
    allocator: &mut A,
) -> Result<StandardLoop> {
    let result = setup(source.shape(), explicit_axes, options, output_type, allocator);
    if let Err(err) = &result {
        debug!(
            source_dims = ?source.dims(),
            axes = ?explicit_axes,
            error = %err,
            "standard loop setup rejected"
        );
    }
    result
}

fn setup<A: ArrayAllocator + ?Sized>(
    shape: &ShapeDescriptor,
    explicit_axes: Option<&[usize]>,
    options: LoopOptions,
    output_type: Option<ElementType>,
    allocator: &mut A,
) -> Result<StandardLoop> {
    let rank = shape.rank();
    let mode = options.output_shape_mode()?;

    let (requested_axes, whole_array): (Vec<usize>, bool) = match explicit_axes {
        _ if options.all_axes => ((0..rank).collect(), false),
        Some(axes) if !axes.is_empty() => (axes.to_vec(), false),
        _ => ((0..rank).collect(), true),
    };
    validate_axes(&requested_axes, rank, options.unique_axes)?;
    let axes = dedup_axes(&requested_axes);
    let per_axis = mode != OutputShapeMode::Reduce && !whole_array;
    let passes = if per_axis { axes.len() } else { 1 };

    let output_type = options.resolve_element_type(shape.element_type(), output_type);
    let target_shape = match mode {
        OutputShapeMode::Same => shape.clone(),
        OutputShapeMode::Reduce => shape.with_axes_removed(&axes)?,
        OutputShapeMode::Collapse => shape.with_axes_collapsed(&axes)?,
    }
    .with_element_type(output_type);
    let target_view = match mode {
        OutputShapeMode::Same => target_shape.clone(),
        _ => shape
            .with_axes_collapsed(&axes)?
            .with_element_type(output_type),
    };

    let selection = pass_selection(rank, &axes, mode, options, per_axis, 0);
    let source_cursor = LoopCursor::new(shape, selection.clone(), None, 0)?;
    let target_cursor = LoopCursor::new(&target_view, selection, None, 0)?;
    let group = LoopGroup::new(source_cursor, vec![target_cursor])?;

    let target = allocator.allocate(target_shape.dims(), output_type)?;
    if target.dims() != target_shape.dims() || target.element_type() != output_type {
        return Err(AllocError {
            dims: target_shape.dims().to_vec(),
            element_type: output_type,
            reason: format!(
                "allocator returned a {} array of shape {:?}",
                target.element_type(),
                target.dims()
            ),
        }
        .into());
    }

    debug!(
        source_dims = ?shape.dims(),
        axes = ?axes,
        mode = %mode,
        target_dims = ?target_shape.dims(),
        element_type = %output_type,
        passes,
        "standard loop ready"
    );

    Ok(StandardLoop {
        group,
        target,
        source_shape: shape.clone(),
        target_view,
        requested_axes,
        axes,
        mode,
        options,
        per_axis,
        pass: 0,
        passes,
    })
}

/// Nesting levels for pass `pass`.
fn pass_selection(
    rank: usize,
    axes: &[usize],
    mode: OutputShapeMode,
    options: LoopOptions,
    per_axis: bool,
    pass: usize,
) -> AxisSelection {
    let mut levels: Vec<Vec<usize>> = Vec::with_capacity(rank);
    if mode == OutputShapeMode::Reduce {
        if options.compress_all {
            levels.push(axes.to_vec());
        } else {
            levels.extend(axes.iter().map(|&a| vec![a]));
        }
        levels.extend(complement_axes(axes, rank).into_iter().map(|a| vec![a]));
    } else if per_axis {
        let axis = axes[pass];
        levels.push(vec![axis]);
        levels.extend(complement_axes(&[axis], rank).into_iter().map(|a| vec![a]));
    } else {
        levels.extend((0..rank).map(|a| vec![a]));
    }

    let refs: Vec<&[usize]> = levels.iter().map(|l| l.as_slice()).collect();
    if options.each_row {
        AxisSelection::from_levels(&refs[1..]).with_block(refs[0])
    } else {
        AxisSelection::from_levels(&refs)
    }
}

impl StandardLoop {
    /// Advance source and target together. See [`LoopGroup::advance_all`].
    #[inline]
    pub fn advance(&mut self) -> Rollover {
        self.group.advance_all()
    }

    /// Switch to the next per-axis pass and rewind both cursors.
    ///
    /// Returns `false`, leaving the loop untouched, when the current pass is
    /// the last one. Reduction loops and whole-array loops have a single pass.
    pub fn next_pass(&mut self) -> bool {
        if self.pass + 1 >= self.passes {
            return false;
        }
        self.pass += 1;
        let rank = self.source_shape.rank();
        let selection = pass_selection(
            rank,
            &self.axes,
            self.mode,
            self.options,
            self.per_axis,
            self.pass,
        );
        let lower: AxisVec = std::iter::repeat(0).take(rank).collect();
        let upper: AxisVec = self.source_shape.dims().iter().map(|&d| d - 1).collect();
        let view_upper: AxisVec = self.target_view.dims().iter().map(|&d| d - 1).collect();
        let source = LoopCursor::build(
            self.source_shape.clone(),
            selection.clone(),
            lower.clone(),
            upper,
            0,
        );
        let target = LoopCursor::build(self.target_view.clone(), selection, lower, view_upper, 0);
        self.group = LoopGroup::from_compatible(vec![source, target]);
        debug!(pass = self.pass, axis = self.axes[self.pass], "standard loop next pass");
        true
    }

    /// Rewind both cursors to the start of the current pass.
    pub fn rewind(&mut self) {
        self.group.reset_all();
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.group.is_exhausted()
    }

    #[inline]
    pub fn source_cursor(&self) -> &LoopCursor {
        self.group.cursor(0)
    }

    #[inline]
    pub fn target_cursor(&self) -> &LoopCursor {
        self.group.cursor(1)
    }

    #[inline]
    pub fn source_run(&self) -> Run {
        self.group.run(0)
    }

    #[inline]
    pub fn target_run(&self) -> Run {
        self.group.run(1)
    }

    #[inline]
    pub fn group(&self) -> &LoopGroup {
        &self.group
    }

    #[inline]
    pub fn target(&self) -> &ArrayHandle {
        &self.target
    }

    #[inline]
    pub fn target_mut(&mut self) -> &mut ArrayHandle {
        &mut self.target
    }

    pub fn into_target(self) -> ArrayHandle {
        self.target
    }

    /// The source cursor, the target array and the target cursor.
    pub fn into_parts(self) -> (LoopCursor, ArrayHandle, LoopCursor) {
        let mut cursors = self.group.into_cursors().into_iter();
        let (source, target) = match (cursors.next(), cursors.next()) {
            (Some(source), Some(target)) => (source, target),
            _ => unreachable!("a standard loop groups exactly two cursors"),
        };
        (source, self.target, target)
    }

    /// Resolved active axes, repeats dropped.
    #[inline]
    pub fn axes(&self) -> &[usize] {
        &self.axes
    }

    /// Axes as requested, repeats included.
    #[inline]
    pub fn requested_axes(&self) -> &[usize] {
        &self.requested_axes
    }

    /// The axis innermost in the current pass, for per-axis loops.
    pub fn current_axis(&self) -> Option<usize> {
        self.per_axis.then(|| self.axes[self.pass])
    }

    #[inline]
    pub fn pass(&self) -> usize {
        self.pass
    }

    #[inline]
    pub fn pass_count(&self) -> usize {
        self.passes
    }

    #[inline]
    pub fn output_mode(&self) -> OutputShapeMode {
        self.mode
    }

    #[inline]
    pub fn options(&self) -> LoopOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LoopError;

    fn source(dims: &[usize]) -> ArrayHandle {
        ArrayHandle::zeros(dims, ElementType::Int32).unwrap()
    }

    #[test]
    fn test_same_dimensions_whole_array() {
        let src = source(&[3, 2]);
        let mut lp = setup_standard_loop(&src, None, LoopOptions::new().same_dimensions(), None)
            .unwrap();
        assert_eq!(lp.target().dims(), &[3, 2]);
        assert_eq!(lp.pass_count(), 1);
        assert_eq!(lp.current_axis(), None);
        let mut pairs = vec![(lp.source_cursor().offset(), lp.target_cursor().offset())];
        while lp.advance() != Rollover::Exhausted {
            pairs.push((lp.source_cursor().offset(), lp.target_cursor().offset()));
        }
        assert_eq!(pairs, (0..6).map(|i| (i, i)).collect::<Vec<_>>());
    }

    #[test]
    fn test_reduce_target_shape() {
        let src = source(&[2, 3, 4]);
        let lp = setup_standard_loop(&src, Some(&[2, 0]), LoopOptions::new().axes_block(), None)
            .unwrap();
        assert_eq!(lp.target().dims(), &[3]);
        assert_eq!(lp.output_mode(), OutputShapeMode::Reduce);
        let sel = lp.source_cursor().selection();
        assert_eq!(sel.coordinate_axes(), &[2, 0, 1]);
    }

    #[test]
    fn test_reduce_every_axis_gives_single_element() {
        let src = source(&[2, 3]);
        let lp = setup_standard_loop(&src, None, LoopOptions::new().compress_all(), None).unwrap();
        assert_eq!(lp.target().dims(), &[1]);
        assert_eq!(lp.source_cursor().level_count(), 1);
        assert_eq!(lp.source_cursor().level_extent(0), 6);
    }

    #[test]
    fn test_collapse_target_shape() {
        let src = source(&[2, 3, 4]);
        let lp = setup_standard_loop(&src, Some(&[1]), LoopOptions::new().one_dims(), None).unwrap();
        assert_eq!(lp.target().dims(), &[2, 1, 4]);
    }

    #[test]
    fn test_per_axis_passes() {
        let src = source(&[2, 3]);
        let options = LoopOptions::new().all_axes().same_dimensions();
        let mut lp = setup_standard_loop(&src, None, options, None).unwrap();
        assert_eq!(lp.pass_count(), 2);
        assert_eq!(lp.current_axis(), Some(0));
        assert_eq!(lp.source_cursor().selection().coordinate_axes(), &[0, 1]);
        assert!(lp.next_pass());
        assert_eq!(lp.current_axis(), Some(1));
        assert_eq!(lp.source_cursor().selection().coordinate_axes(), &[1, 0]);
        assert_eq!(lp.target_cursor().selection().coordinate_axes(), &[1, 0]);
        assert!(!lp.next_pass());
        assert_eq!(lp.pass(), 1);
    }

    #[test]
    fn test_each_row_blocks_innermost_level() {
        let src = source(&[4, 3]);
        let options = LoopOptions::new().same_dimensions().each_row();
        let lp = setup_standard_loop(&src, Some(&[1]), options, None).unwrap();
        let run = lp.source_run();
        assert_eq!((run.len, run.stride), (3, 4));
        assert_eq!(lp.source_cursor().total_steps(), 4);
    }

    #[test]
    fn test_duplicate_axes() {
        let src = source(&[2, 3]);
        let strict = LoopOptions::new().same_dimensions().unique_axes();
        assert!(matches!(
            setup_standard_loop(&src, Some(&[1, 1]), strict, None),
            Err(LoopError::DuplicateAxis { axis: 1 })
        ));
        let lax = LoopOptions::new().same_dimensions();
        let lp = setup_standard_loop(&src, Some(&[1, 0, 1]), lax, None).unwrap();
        assert_eq!(lp.axes(), &[1, 0]);
        assert_eq!(lp.requested_axes(), &[1, 0, 1]);
        assert_eq!(lp.pass_count(), 2);
    }

    #[test]
    fn test_all_axes_ignores_explicit_axes() {
        let src = source(&[2, 3]);
        let options = LoopOptions::new().all_axes().axes_block();
        let lp = setup_standard_loop(&src, Some(&[7]), options, None).unwrap();
        assert_eq!(lp.axes(), &[0, 1]);
        assert_eq!(lp.target().dims(), &[1]);
    }

    #[test]
    fn test_output_type_resolution() {
        let src = ArrayHandle::zeros(&[2], ElementType::Float32).unwrap();
        let options = LoopOptions::new().same_dimensions().upgrade_type();
        let lp = setup_standard_loop(&src, None, options, Some(ElementType::Int8)).unwrap();
        assert_eq!(lp.target().element_type(), ElementType::Float32);
        let lp = setup_standard_loop(&src, None, options, Some(ElementType::Float64)).unwrap();
        assert_eq!(lp.target().element_type(), ElementType::Float64);
    }

    #[test]
    fn test_into_parts() {
        let src = source(&[5]);
        let lp = setup_standard_loop(&src, None, LoopOptions::new().same_dimensions(), None)
            .unwrap();
        let (s, t, tc) = lp.into_parts();
        assert_eq!(s.total_steps(), 5);
        assert_eq!(tc.total_steps(), 5);
        assert_eq!(t.len(), 5);
    }
}
