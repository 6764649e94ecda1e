//! Configuration for standard loop setup.

use std::fmt;

use crate::{ElementType, LoopError, Result};

/// How the target of a standard loop is shaped relative to its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputShapeMode {
    /// Same dimensions as the source.
    Same,
    /// The selected axes are removed.
    Reduce,
    /// The selected axes are kept with extent 1.
    Collapse,
}

impl fmt::Display for OutputShapeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputShapeMode::Same => "same dimensions",
            OutputShapeMode::Reduce => "reduce selected axes",
            OutputShapeMode::Collapse => "collapse selected axes to one",
        })
    }
}

/// Options for [`crate::setup_standard_loop`].
///
/// Every option is independent and off by default. Exactly one output shape
/// policy must result: `same_dimensions`, a reduction (`axes_block` and/or
/// `compress_all`), or `one_dims`.
///
/// ```rust
/// use strided_loop::{LoopOptions, OutputShapeMode};
///
/// let options = LoopOptions::new().all_axes().same_dimensions();
/// assert_eq!(options.output_shape_mode().unwrap(), OutputShapeMode::Same);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopOptions {
    /// Iterate over every dimension; explicit axes are ignored.
    pub all_axes: bool,
    /// Reject repeated explicit axes instead of dropping the repeats.
    pub unique_axes: bool,
    /// Walk all selected axes together as the innermost levels and remove
    /// them from the target.
    pub axes_block: bool,
    /// The target has the source's dimensions.
    pub same_dimensions: bool,
    /// Hand the innermost level to the caller as one run per step.
    pub each_row: bool,
    /// Raise a requested output type that ranks below the source type.
    pub upgrade_type: bool,
    /// Fuse all selected axes into one level and remove them from the target.
    pub compress_all: bool,
    /// The target keeps the source element type, whatever was requested.
    pub keep_type: bool,
    /// The target keeps the selected axes with extent 1.
    pub one_dims: bool,
}

impl LoopOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all_axes(mut self) -> Self {
        self.all_axes = true;
        self
    }

    pub fn unique_axes(mut self) -> Self {
        self.unique_axes = true;
        self
    }

    pub fn axes_block(mut self) -> Self {
        self.axes_block = true;
        self
    }

    pub fn same_dimensions(mut self) -> Self {
        self.same_dimensions = true;
        self
    }

    pub fn each_row(mut self) -> Self {
        self.each_row = true;
        self
    }

    pub fn upgrade_type(mut self) -> Self {
        self.upgrade_type = true;
        self
    }

    pub fn compress_all(mut self) -> Self {
        self.compress_all = true;
        self
    }

    pub fn keep_type(mut self) -> Self {
        self.keep_type = true;
        self
    }

    pub fn one_dims(mut self) -> Self {
        self.one_dims = true;
        self
    }

    /// Every output shape policy the options ask for.
    pub fn shape_modes(&self) -> Vec<OutputShapeMode> {
        let mut modes = Vec::new();
        if self.same_dimensions {
            modes.push(OutputShapeMode::Same);
        }
        if self.axes_block || self.compress_all {
            modes.push(OutputShapeMode::Reduce);
        }
        if self.one_dims {
            modes.push(OutputShapeMode::Collapse);
        }
        modes
    }

    /// The single output shape policy.
    ///
    /// # Errors
    /// [`LoopError::AmbiguousOutputShape`] if zero or several policies are
    /// selected.
    pub fn output_shape_mode(&self) -> Result<OutputShapeMode> {
        match self.shape_modes().as_slice() {
            [mode] => Ok(*mode),
            selected => Err(LoopError::AmbiguousOutputShape {
                selected: selected.to_vec(),
            }),
        }
    }

    /// Target element type for a `source` array when `requested` was asked
    /// for. `keep_type` wins over `upgrade_type`; nothing is ever narrowed
    /// below the request.
    pub fn resolve_element_type(
        &self,
        source: ElementType,
        requested: Option<ElementType>,
    ) -> ElementType {
        if self.keep_type {
            return source;
        }
        let requested = requested.unwrap_or(source);
        if self.upgrade_type && requested.promotion_rank() < source.promotion_rank() {
            source
        } else {
            requested
        }
    }
}
