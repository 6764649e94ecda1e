//! Shape descriptors: dimensions, element type and derived strides.
//!
//! A [`ShapeDescriptor`] never changes after it is built. Operations that
//! change dimensions return a new descriptor whose strides are derived
//! afresh from the new dimensions.

use std::fmt;
use std::sync::Arc;

use crate::auxiliary::{col_major_strides, validate_axes, validate_permutation};
use crate::{ElementType, LoopError, Result};

/// Dimensions, element type and column-major strides of an array buffer.
///
/// Strides are in elements: `strides[0] = 1` and
/// `strides[i] = strides[i - 1] * dims[i - 1]`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ShapeDescriptor {
    dims: Arc<[usize]>,
    strides: Arc<[usize]>,
    element_type: ElementType,
}

impl fmt::Debug for ShapeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeDescriptor")
            .field("dims", &self.dims)
            .field("strides", &self.strides)
            .field("element_type", &self.element_type)
            .finish()
    }
}

impl ShapeDescriptor {
    /// Create a descriptor for `dims`.
    ///
    /// # Errors
    /// [`LoopError::InvalidShape`] if `dims` is empty, any extent is 0, or the
    /// element count overflows `usize`.
    pub fn new(dims: &[usize], element_type: ElementType) -> Result<Self> {
        let count = dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d));
        if dims.is_empty() || dims.contains(&0) || count.is_none() {
            return Err(LoopError::InvalidShape {
                dims: dims.to_vec(),
            });
        }
        Ok(Self::from_valid_dims(dims, element_type))
    }

    fn from_valid_dims(dims: &[usize], element_type: ElementType) -> Self {
        let strides = col_major_strides(dims);
        Self {
            dims: Arc::from(dims),
            strides: Arc::from(strides),
            element_type,
        }
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    #[inline]
    pub fn dim(&self, axis: usize) -> usize {
        self.dims[axis]
    }

    #[inline]
    pub fn stride(&self, axis: usize) -> usize {
        self.strides[axis]
    }

    #[inline]
    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// Product of all dimensions.
    #[inline]
    pub fn element_count(&self) -> usize {
        self.dims.iter().product()
    }

    /// Size of the whole buffer in bytes, or `None` if that overflows `usize`.
    #[inline]
    pub fn byte_len(&self) -> Option<usize> {
        self.element_count()
            .checked_mul(self.element_type.byte_size())
    }

    /// The same dimensions with another element type.
    pub fn with_element_type(&self, element_type: ElementType) -> Self {
        Self {
            dims: self.dims.clone(),
            strides: self.strides.clone(),
            element_type,
        }
    }

    /// Reorder the dimensions: dimension `i` of the result is dimension
    /// `order[i]` of `self`.
    ///
    /// The strides are recomputed for the new order rather than permuted, so
    /// the result describes a dense buffer holding the data in the new axis
    /// order (see [`crate::ArrayHandle::permuted`]).
    pub fn with_axes_permuted(&self, order: &[usize]) -> Result<Self> {
        validate_permutation(order, self.rank())?;
        let dims: Vec<usize> = order.iter().map(|&a| self.dims[a]).collect();
        Ok(Self::from_valid_dims(&dims, self.element_type))
    }

    /// Drop the last `n` dimensions.
    ///
    /// # Errors
    /// [`LoopError::InvalidShape`] if no dimension would remain.
    pub fn with_trailing_axes_dropped(&self, n: usize) -> Result<Self> {
        if n >= self.rank() {
            return Err(LoopError::InvalidShape { dims: vec![] });
        }
        let keep = self.rank() - n;
        Ok(Self::from_valid_dims(&self.dims[..keep], self.element_type))
    }

    /// Remove the listed axes. Removing every axis leaves the shape `[1]`.
    pub fn with_axes_removed(&self, axes: &[usize]) -> Result<Self> {
        validate_axes(axes, self.rank(), false)?;
        let mut dims: Vec<usize> = (0..self.rank())
            .filter(|a| !axes.contains(a))
            .map(|a| self.dims[a])
            .collect();
        if dims.is_empty() {
            dims.push(1);
        }
        Ok(Self::from_valid_dims(&dims, self.element_type))
    }

    /// Keep the rank but give the listed axes extent 1.
    pub fn with_axes_collapsed(&self, axes: &[usize]) -> Result<Self> {
        validate_axes(axes, self.rank(), false)?;
        let mut dims = self.dims.to_vec();
        for &a in axes {
            dims[a] = 1;
        }
        Ok(Self::from_valid_dims(&dims, self.element_type))
    }

    /// Dense shape of the inclusive sub-box `bounds` (one `(lo, hi)` per axis).
    pub fn sub_shape(&self, bounds: &[(usize, usize)]) -> Result<Self> {
        self.check_bounds(bounds)?;
        let dims: Vec<usize> = bounds.iter().map(|&(lo, hi)| hi - lo + 1).collect();
        Ok(Self::from_valid_dims(&dims, self.element_type))
    }

    /// `(0, dims[i] - 1)` for every axis.
    pub fn full_bounds(&self) -> Vec<(usize, usize)> {
        self.dims.iter().map(|&d| (0, d - 1)).collect()
    }

    /// Check that `bounds` has one non-inverted, in-range entry per axis.
    pub(crate) fn check_bounds(&self, bounds: &[(usize, usize)]) -> Result<()> {
        if bounds.len() != self.rank() {
            return Err(LoopError::RankMismatch(bounds.len(), self.rank()));
        }
        for (axis, (&(lo, hi), &size)) in bounds.iter().zip(self.dims.iter()).enumerate() {
            if lo > hi || hi >= size {
                return Err(LoopError::RangeOutOfBounds { axis, lo, hi, size });
            }
        }
        Ok(())
    }

    /// Flat element offset of `coords`.
    ///
    /// # Panics
    /// Panics if `coords` has the wrong length or a coordinate is out of range.
    pub fn offset_of(&self, coords: &[usize]) -> usize {
        assert_eq!(coords.len(), self.rank(), "coordinate rank mismatch");
        coords
            .iter()
            .zip(self.dims.iter().zip(self.strides.iter()))
            .map(|(&c, (&d, &s))| {
                assert!(c < d, "coordinate out of bounds");
                c * s
            })
            .sum()
    }

    /// Coordinates of the flat element offset `offset`.
    pub fn coords_of(&self, mut offset: usize) -> Vec<usize> {
        assert!(offset < self.element_count(), "offset out of bounds");
        self.dims
            .iter()
            .map(|&d| {
                let c = offset % d;
                offset /= d;
                c
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(dims: &[usize]) -> ShapeDescriptor {
        ShapeDescriptor::new(dims, ElementType::Float64).unwrap()
    }

    #[test]
    fn test_new_derives_strides() {
        let s = shape(&[4, 3]);
        assert_eq!(s.strides(), &[1, 4]);
        assert_eq!(s.element_count(), 12);
        assert_eq!(s.byte_len(), Some(96));
    }

    #[test]
    fn test_byte_len_overflow() {
        let s = ShapeDescriptor::new(&[usize::MAX / 8], ElementType::Complex128).unwrap();
        assert_eq!(s.byte_len(), None);
        let narrow = s.with_element_type(ElementType::Int8);
        assert_eq!(narrow.byte_len(), Some(usize::MAX / 8));
    }

    #[test]
    fn test_new_rejects_invalid() {
        assert!(matches!(
            ShapeDescriptor::new(&[], ElementType::Int8),
            Err(LoopError::InvalidShape { .. })
        ));
        assert!(matches!(
            ShapeDescriptor::new(&[3, 0], ElementType::Int8),
            Err(LoopError::InvalidShape { dims }) if dims == vec![3, 0]
        ));
        assert!(ShapeDescriptor::new(&[usize::MAX, 2], ElementType::Int8).is_err());
    }

    #[test]
    fn test_permuted_recomputes_strides() {
        let s = shape(&[2, 3, 5]);
        let p = s.with_axes_permuted(&[2, 0, 1]).unwrap();
        assert_eq!(p.dims(), &[5, 2, 3]);
        // Recomputed, not [6, 1, 2].
        assert_eq!(p.strides(), &[1, 5, 10]);
    }

    #[test]
    fn test_permuted_rejects_bad_order() {
        let s = shape(&[2, 3]);
        assert!(matches!(
            s.with_axes_permuted(&[0]),
            Err(LoopError::RankMismatch(1, 2))
        ));
        assert!(matches!(
            s.with_axes_permuted(&[1, 1]),
            Err(LoopError::DuplicateAxis { axis: 1 })
        ));
        assert!(matches!(
            s.with_axes_permuted(&[0, 2]),
            Err(LoopError::AxisOutOfRange { axis: 2, rank: 2 })
        ));
    }

    #[test]
    fn test_trailing_axes_dropped() {
        let s = shape(&[2, 3, 5]);
        let d = s.with_trailing_axes_dropped(2).unwrap();
        assert_eq!(d.dims(), &[2]);
        assert_eq!(d.strides(), &[1]);
        assert!(s.with_trailing_axes_dropped(3).is_err());
    }

    #[test]
    fn test_axes_removed_and_collapsed() {
        let s = shape(&[2, 3, 5]);
        assert_eq!(s.with_axes_removed(&[1]).unwrap().dims(), &[2, 5]);
        assert_eq!(s.with_axes_removed(&[0, 1, 2]).unwrap().dims(), &[1]);
        let c = s.with_axes_collapsed(&[0, 2]).unwrap();
        assert_eq!(c.dims(), &[1, 3, 1]);
        assert_eq!(c.strides(), &[1, 1, 3]);
    }

    #[test]
    fn test_sub_shape_and_bounds() {
        let s = shape(&[5, 4]);
        assert_eq!(s.sub_shape(&[(1, 3), (0, 0)]).unwrap().dims(), &[3, 1]);
        assert!(matches!(
            s.sub_shape(&[(3, 1), (0, 0)]),
            Err(LoopError::RangeOutOfBounds { axis: 0, lo: 3, hi: 1, size: 5 })
        ));
        assert!(matches!(
            s.sub_shape(&[(0, 4)]),
            Err(LoopError::RankMismatch(1, 2))
        ));
        assert_eq!(s.full_bounds(), vec![(0, 4), (0, 3)]);
    }

    #[test]
    fn test_offset_coords_roundtrip() {
        let s = shape(&[3, 4, 2]);
        for offset in 0..s.element_count() {
            let coords = s.coords_of(offset);
            assert_eq!(s.offset_of(&coords), offset);
        }
        assert_eq!(s.offset_of(&[2, 1, 1]), 2 + 3 + 12);
    }
}
