//! Generic N-dimensional loop engine over column-major arrays.
//!
//! A single piece of numeric code can walk arrays of any rank, any subset
//! of axes and any of the eight element types with the types in this crate.
//! Dimension 0 varies fastest in memory.
//!
//! # Core Types
//!
//! - [`ShapeDescriptor`]: dimensions plus derived column-major strides
//! - [`AxisSelection`]: which axes a loop walks, in which nesting order
//! - [`LoopCursor`]: stateful odometer over the selected axes, keeping a flat
//!   element offset in sync with per-axis coordinates
//! - [`LoopGroup`]: several cursors advanced in lock-step, with size-1
//!   broadcast levels held stationary
//! - [`ArrayHandle`]: an owned, typed buffer with its shape
//!
//! # Entry Points
//!
//! - [`setup_standard_loop`]: resolve axes, allocate a correctly shaped and
//!   typed target, and pair source and target cursors
//! - [`restrict_to_sub_box`], [`restrict_to_interior`]: walk a sub-box only
//! - [`restrict_to_edge_shell`], [`edge_shells`]: walk the border of an array
//!
//! # Example
//!
//! ```rust
//! use strided_loop::{setup_standard_loop, ArrayHandle, LoopOptions, Rollover};
//!
//! let src = ArrayHandle::from_vec(vec![1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0], &[3, 2]).unwrap();
//! let options = LoopOptions::new().axes_block();
//! let mut lp = setup_standard_loop(&src, Some(&[0]), options, None).unwrap();
//!
//! // Sum along axis 0: the target advances only when axis 0 rolls over.
//! let values = src.as_slice::<f64>().unwrap().to_vec();
//! loop {
//!     let (s, t) = (lp.source_cursor().offset(), lp.target_cursor().offset());
//!     lp.target_mut().as_mut_slice::<f64>().unwrap()[t] += values[s];
//!     if lp.advance() == Rollover::Exhausted {
//!         break;
//!     }
//! }
//! assert_eq!(lp.target().dims(), &[2]);
//! assert_eq!(lp.target().as_slice::<f64>().unwrap(), &[6.0, 15.0]);
//! ```
//!
//! Every shape, axis and option check happens when a cursor, group or
//! standard loop is built. Stepping never fails.

mod alloc;
mod array;
mod auxiliary;
mod axes;
mod cursor;
mod group;
mod options;
mod rearrange;
mod shape;
mod standard;

pub use strided_loop_traits::{byte_size, promote, Element, ElementType};

pub use alloc::{AllocError, ArrayAllocator, HeapAllocator};
pub use array::{ArrayData, ArrayHandle};
pub use auxiliary::{col_major_strides, inverse_permutation};
pub use axes::AxisSelection;
pub use cursor::{make_cursor, CursorState, LoopCursor, Rollover, Run};
pub use group::{pair_cursors, LoopGroup};
pub use options::{LoopOptions, OutputShapeMode};
pub use rearrange::{edge_shells, restrict_to_edge_shell, restrict_to_interior, restrict_to_sub_box};
pub use shape::ShapeDescriptor;
pub use standard::{setup_standard_loop, setup_standard_loop_in, StandardLoop};

/// Inline capacity for per-axis cursor state.
///
/// Arrays of higher rank are still supported; their per-axis state spills
/// to the heap when the cursor is built.
pub const MAX_DIMS: usize = 8;

/// Errors reported while building shapes, cursors, groups or standard loops.
#[derive(Debug, thiserror::Error)]
pub enum LoopError {
    /// Empty dimension list or a zero extent.
    #[error("invalid shape {dims:?}: need at least one dimension and every extent >= 1")]
    InvalidShape { dims: Vec<usize> },

    /// Axis index outside `[0, rank)`.
    #[error("axis {axis} is out of range for a {rank}-dimensional array")]
    AxisOutOfRange { axis: usize, rank: usize },

    /// The same axis appears twice where axes must be unique.
    #[error("axis {axis} appears more than once")]
    DuplicateAxis { axis: usize },

    /// Two cursors intended for one group disagree on a level extent.
    #[error("shape mismatch at loop level {level}: extent {expected} vs {found}")]
    ShapeMismatch {
        level: usize,
        expected: usize,
        found: usize,
    },

    /// The loop options select zero or several output shape policies.
    #[error("loop options do not determine a unique output shape (selected: {selected:?})")]
    AmbiguousOutputShape { selected: Vec<OutputShapeMode> },

    /// The allocator could not provide the target array.
    #[error(transparent)]
    AllocationFailed(#[from] AllocError),

    /// A per-axis list does not have one entry per dimension: `(found, expected)`.
    #[error("rank mismatch: got {0} entries, expected {1}")]
    RankMismatch(usize, usize),

    /// Sub-range bounds outside the available range, or inverted.
    #[error("range [{lo}, {hi}] is out of bounds for axis {axis} of size {size}")]
    RangeOutOfBounds {
        axis: usize,
        lo: usize,
        hi: usize,
        size: usize,
    },

    /// Several block axes that cannot be handed out as one strided run.
    #[error("block axes {axes:?} do not form one contiguous run")]
    NonContiguousBlock { axes: Vec<usize> },

    /// Typed access with a Rust scalar that does not match the buffer.
    #[error("element type mismatch: buffer holds {found}, accessed as {expected}")]
    TypeMismatch {
        expected: ElementType,
        found: ElementType,
    },

    /// A buffer whose length disagrees with the shape's element count.
    #[error("buffer holds {found} elements but the shape needs {expected}")]
    LengthMismatch { expected: usize, found: usize },
}

/// Result type for loop engine operations.
pub type Result<T> = std::result::Result<T, LoopError>;
