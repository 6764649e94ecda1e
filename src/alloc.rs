//! The seam through which standard loop setup obtains its target arrays.

use crate::array::{ArrayData, ArrayHandle};
use crate::{ElementType, ShapeDescriptor};

/// An allocator could not provide the requested array.
#[derive(Debug, Clone, thiserror::Error)]
#[error("failed to allocate {element_type} array of shape {dims:?}: {reason}")]
pub struct AllocError {
    pub dims: Vec<usize>,
    pub element_type: ElementType,
    pub reason: String,
}

/// Provides zero-initialised arrays of a requested shape and element type.
///
/// The loop engine decides *what* to allocate; implementors decide how
/// (heap, arena, pool, ...).
pub trait ArrayAllocator {
    fn allocate(
        &mut self,
        dims: &[usize],
        element_type: ElementType,
    ) -> std::result::Result<ArrayHandle, AllocError>;
}

impl<A: ArrayAllocator + ?Sized> ArrayAllocator for &mut A {
    fn allocate(
        &mut self,
        dims: &[usize],
        element_type: ElementType,
    ) -> std::result::Result<ArrayHandle, AllocError> {
        (**self).allocate(dims, element_type)
    }
}

/// Allocates on the global heap, reporting allocation failure instead of
/// aborting.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapAllocator;

impl ArrayAllocator for HeapAllocator {
    fn allocate(
        &mut self,
        dims: &[usize],
        element_type: ElementType,
    ) -> std::result::Result<ArrayHandle, AllocError> {
        let fail = |reason: String| AllocError {
            dims: dims.to_vec(),
            element_type,
            reason,
        };
        let shape = ShapeDescriptor::new(dims, element_type).map_err(|e| fail(e.to_string()))?;
        let data = ArrayData::try_zeroed(element_type, shape.element_count())
            .map_err(|e| fail(e.to_string()))?;
        Ok(ArrayHandle::from_parts(data, shape))
    }
}
