//! Owned, typed array buffers.
//!
//! [`ArrayHandle`] stands in for the array object that owns a buffer. Cursors
//! only ever see its [`ShapeDescriptor`]; element access goes through the
//! typed slices here.

use std::any::Any;
use std::collections::TryReserveError;

use num_complex::Complex;

use crate::cursor::{LoopCursor, Rollover};
use crate::group::LoopGroup;
use crate::{AxisSelection, Element, ElementType, LoopError, Result, ShapeDescriptor};

/// A contiguous buffer of one of the supported element types.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Complex64(Vec<Complex<f32>>),
    Complex128(Vec<Complex<f64>>),
}

/// Evaluate `$body` with `$v` bound to the inner `Vec` of `$data`.
macro_rules! with_vec {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            ArrayData::Int8($v) => $body,
            ArrayData::Int16($v) => $body,
            ArrayData::Int32($v) => $body,
            ArrayData::Int64($v) => $body,
            ArrayData::Float32($v) => $body,
            ArrayData::Float64($v) => $body,
            ArrayData::Complex64($v) => $body,
            ArrayData::Complex128($v) => $body,
        }
    };
}

fn try_zeroed_vec<T: Element>(len: usize) -> std::result::Result<Vec<T>, TryReserveError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)?;
    v.resize(len, T::zero());
    Ok(v)
}

fn convert_vec<S: Element>(src: &[S], element_type: ElementType) -> ArrayData {
    fn map<S: Element, U: Element>(src: &[S]) -> Vec<U> {
        src.iter().map(|&x| x.convert::<U>()).collect()
    }
    match element_type {
        ElementType::Int8 => ArrayData::Int8(map(src)),
        ElementType::Int16 => ArrayData::Int16(map(src)),
        ElementType::Int32 => ArrayData::Int32(map(src)),
        ElementType::Int64 => ArrayData::Int64(map(src)),
        ElementType::Float32 => ArrayData::Float32(map(src)),
        ElementType::Float64 => ArrayData::Float64(map(src)),
        ElementType::Complex64 => ArrayData::Complex64(map(src)),
        ElementType::Complex128 => ArrayData::Complex128(map(src)),
    }
}

impl ArrayData {
    /// A zero-filled buffer, reporting allocation failure.
    pub fn try_zeroed(
        element_type: ElementType,
        len: usize,
    ) -> std::result::Result<Self, TryReserveError> {
        Ok(match element_type {
            ElementType::Int8 => ArrayData::Int8(try_zeroed_vec(len)?),
            ElementType::Int16 => ArrayData::Int16(try_zeroed_vec(len)?),
            ElementType::Int32 => ArrayData::Int32(try_zeroed_vec(len)?),
            ElementType::Int64 => ArrayData::Int64(try_zeroed_vec(len)?),
            ElementType::Float32 => ArrayData::Float32(try_zeroed_vec(len)?),
            ElementType::Float64 => ArrayData::Float64(try_zeroed_vec(len)?),
            ElementType::Complex64 => ArrayData::Complex64(try_zeroed_vec(len)?),
            ElementType::Complex128 => ArrayData::Complex128(try_zeroed_vec(len)?),
        })
    }

    /// Wrap a typed vector.
    pub fn from_vec<T: Element>(data: Vec<T>) -> Self {
        let mut slot = Some(data);
        let any: &mut dyn Any = &mut slot;
        macro_rules! take {
            ($variant:ident, $ty:ty) => {
                if let Some(v) = any.downcast_mut::<Option<Vec<$ty>>>() {
                    if let Some(v) = v.take() {
                        return ArrayData::$variant(v);
                    }
                }
            };
        }
        take!(Int8, i8);
        take!(Int16, i16);
        take!(Int32, i32);
        take!(Int64, i64);
        take!(Float32, f32);
        take!(Float64, f64);
        take!(Complex64, Complex<f32>);
        take!(Complex128, Complex<f64>);
        // Element is sealed to the eight scalar types above.
        unreachable!("unsupported element type {}", T::ELEMENT_TYPE)
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            ArrayData::Int8(_) => ElementType::Int8,
            ArrayData::Int16(_) => ElementType::Int16,
            ArrayData::Int32(_) => ElementType::Int32,
            ArrayData::Int64(_) => ElementType::Int64,
            ArrayData::Float32(_) => ElementType::Float32,
            ArrayData::Float64(_) => ElementType::Float64,
            ArrayData::Complex64(_) => ElementType::Complex64,
            ArrayData::Complex128(_) => ElementType::Complex128,
        }
    }

    pub fn len(&self) -> usize {
        with_vec!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The buffer as raw bytes, native endianness.
    pub fn as_bytes(&self) -> &[u8] {
        with_vec!(self, v => bytemuck::cast_slice(v.as_slice()))
    }

    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        with_vec!(self, v => (v as &dyn Any).downcast_ref::<Vec<T>>().map(|v| v.as_slice()))
    }

    pub fn as_mut_slice<T: Element>(&mut self) -> Option<&mut [T]> {
        with_vec!(self, v => (v as &mut dyn Any).downcast_mut::<Vec<T>>().map(|v| v.as_mut_slice()))
    }

    /// Convert every element to `element_type`.
    pub fn convert_to(&self, element_type: ElementType) -> ArrayData {
        if self.element_type() == element_type {
            return self.clone();
        }
        with_vec!(self, v => convert_vec(v, element_type))
    }
}

/// An owned array: a typed buffer plus its shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayHandle {
    data: ArrayData,
    shape: ShapeDescriptor,
}

impl ArrayHandle {
    /// Wrap `data` as an array of shape `dims`.
    ///
    /// # Errors
    /// [`LoopError::InvalidShape`] for a bad shape, [`LoopError::LengthMismatch`]
    /// if `data.len()` is not the element count.
    pub fn new(data: ArrayData, dims: &[usize]) -> Result<Self> {
        let shape = ShapeDescriptor::new(dims, data.element_type())?;
        if data.len() != shape.element_count() {
            return Err(LoopError::LengthMismatch {
                expected: shape.element_count(),
                found: data.len(),
            });
        }
        Ok(Self { data, shape })
    }

    pub fn from_vec<T: Element>(data: Vec<T>, dims: &[usize]) -> Result<Self> {
        Self::new(ArrayData::from_vec(data), dims)
    }

    /// Build from parts whose consistency the caller has established.
    pub(crate) fn from_parts(data: ArrayData, shape: ShapeDescriptor) -> Self {
        debug_assert_eq!(data.len(), shape.element_count());
        debug_assert_eq!(data.element_type(), shape.element_type());
        Self { data, shape }
    }

    /// A zero-filled array on the heap.
    pub fn zeros(dims: &[usize], element_type: ElementType) -> Result<Self> {
        let shape = ShapeDescriptor::new(dims, element_type)?;
        let data = ArrayData::try_zeroed(element_type, shape.element_count()).map_err(|e| {
            crate::AllocError {
                dims: dims.to_vec(),
                element_type,
                reason: e.to_string(),
            }
        })?;
        Ok(Self::from_parts(data, shape))
    }

    /// Column-major array whose element at `coords` is `f(coords)`.
    pub fn from_fn<T: Element>(dims: &[usize], mut f: impl FnMut(&[usize]) -> T) -> Result<Self> {
        let shape = ShapeDescriptor::new(dims, T::ELEMENT_TYPE)?;
        let mut cursor = LoopCursor::new(&shape, AxisSelection::all(shape.rank()), None, 0)?;
        let mut data = Vec::with_capacity(shape.element_count());
        loop {
            data.push(f(cursor.coords()));
            if cursor.advance() == Rollover::Exhausted {
                break;
            }
        }
        Ok(Self::from_parts(ArrayData::from_vec(data), shape))
    }

    #[inline]
    pub fn shape(&self) -> &ShapeDescriptor {
        &self.shape
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    #[inline]
    pub fn element_type(&self) -> ElementType {
        self.data.element_type()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut ArrayData {
        &mut self.data
    }

    pub fn into_data(self) -> ArrayData {
        self.data
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_bytes()
    }

    /// The buffer as `&[T]`.
    ///
    /// # Errors
    /// [`LoopError::TypeMismatch`] if `T` is not the buffer's element type.
    pub fn as_slice<T: Element>(&self) -> Result<&[T]> {
        let found = self.element_type();
        self.data.as_slice().ok_or(LoopError::TypeMismatch {
            expected: T::ELEMENT_TYPE,
            found,
        })
    }

    pub fn as_mut_slice<T: Element>(&mut self) -> Result<&mut [T]> {
        let found = self.element_type();
        self.data.as_mut_slice().ok_or(LoopError::TypeMismatch {
            expected: T::ELEMENT_TYPE,
            found,
        })
    }

    /// Element at `coords`.
    ///
    /// # Panics
    /// Panics if `coords` is out of bounds.
    pub fn get<T: Element>(&self, coords: &[usize]) -> Result<T> {
        let offset = self.shape.offset_of(coords);
        Ok(self.as_slice::<T>()?[offset])
    }

    /// Copy converted to `element_type`; a no-op copy if the type matches.
    ///
    /// This is the explicit, caller-requested conversion; loop setup never
    /// narrows a type on its own.
    pub fn convert_to(&self, element_type: ElementType) -> ArrayHandle {
        ArrayHandle {
            data: self.data.convert_to(element_type),
            shape: self.shape.with_element_type(element_type),
        }
    }

    /// Physical copy with dimension `i` of the result taken from dimension
    /// `order[i]` of `self`; its shape is `shape().with_axes_permuted(order)`.
    pub fn permuted(&self, order: &[usize]) -> Result<ArrayHandle> {
        let target_shape = self.shape.with_axes_permuted(order)?;
        let source = LoopCursor::new(&self.shape, AxisSelection::new(order), None, 0)?;
        let target = LoopCursor::new(
            &target_shape,
            AxisSelection::all(target_shape.rank()),
            None,
            0,
        )?;
        let group = LoopGroup::new(source, vec![target])?;
        self.copy_through(group, target_shape)
    }

    /// Dense copy of the inclusive sub-box `bounds`.
    pub fn extract(&self, bounds: &[(usize, usize)]) -> Result<ArrayHandle> {
        let target_shape = self.shape.sub_shape(bounds)?;
        let all = AxisSelection::all(self.shape.rank());
        let source = LoopCursor::new(&self.shape, all.clone(), Some(bounds), 0)?;
        let target = LoopCursor::new(&target_shape, all, None, 0)?;
        let group = LoopGroup::new(source, vec![target])?;
        self.copy_through(group, target_shape)
    }

    /// Copy element `group.offset(0)` of `self` to `group.offset(1)` of a new
    /// array of `target_shape`, for every position of `group`.
    fn copy_through(&self, mut group: LoopGroup, target_shape: ShapeDescriptor) -> Result<ArrayHandle> {
        fn copy<T: Element>(src: &[T], dst: &mut [T], group: &mut LoopGroup) {
            loop {
                dst[group.offset(1)] = src[group.offset(0)];
                if group.advance_all() == Rollover::Exhausted {
                    break;
                }
            }
        }
        let mut out = ArrayHandle::zeros(target_shape.dims(), self.element_type())?;
        match (&self.data, &mut out.data) {
            (ArrayData::Int8(s), ArrayData::Int8(d)) => copy(s, d, &mut group),
            (ArrayData::Int16(s), ArrayData::Int16(d)) => copy(s, d, &mut group),
            (ArrayData::Int32(s), ArrayData::Int32(d)) => copy(s, d, &mut group),
            (ArrayData::Int64(s), ArrayData::Int64(d)) => copy(s, d, &mut group),
            (ArrayData::Float32(s), ArrayData::Float32(d)) => copy(s, d, &mut group),
            (ArrayData::Float64(s), ArrayData::Float64(d)) => copy(s, d, &mut group),
            (ArrayData::Complex64(s), ArrayData::Complex64(d)) => copy(s, d, &mut group),
            (ArrayData::Complex128(s), ArrayData::Complex128(d)) => copy(s, d, &mut group),
            _ => unreachable!("zeros() allocates the source element type"),
        }
        Ok(out)
    }
}
