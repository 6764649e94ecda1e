//! Rust scalar types that back each [`ElementType`].

use crate::element_type::ElementType;
use num_complex::Complex;
use num_traits::{AsPrimitive, Zero};

mod sealed {
    pub trait Sealed {}
}

/// A Rust scalar that can live in an array buffer.
///
/// Sealed: implemented exactly for the eight scalar types behind
/// [`ElementType`].
///
/// Conversions between elements go through the widest common carrier:
/// `i64` between integers, `f64` when a float is involved, and
/// `Complex<f64>` when a complex type is involved. Integer and float casts
/// follow `as` semantics; complex to real keeps the real part.
pub trait Element: sealed::Sealed + Copy + Zero + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    const ELEMENT_TYPE: ElementType;

    fn to_i64(self) -> i64;
    fn to_f64(self) -> f64;
    fn to_c128(self) -> Complex<f64>;
    fn from_i64(value: i64) -> Self;
    fn from_f64(value: f64) -> Self;
    fn from_c128(value: Complex<f64>) -> Self;

    /// Convert to another element type.
    #[inline]
    fn convert<U: Element>(self) -> U {
        let (src, dst) = (Self::ELEMENT_TYPE, U::ELEMENT_TYPE);
        if src.is_complex() || dst.is_complex() {
            U::from_c128(self.to_c128())
        } else if src.is_float() || dst.is_float() {
            U::from_f64(self.to_f64())
        } else {
            U::from_i64(self.to_i64())
        }
    }
}

macro_rules! impl_real_element {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Element for $ty {
                const ELEMENT_TYPE: ElementType = ElementType::$kind;

                #[inline]
                fn to_i64(self) -> i64 {
                    self.as_()
                }
                #[inline]
                fn to_f64(self) -> f64 {
                    self.as_()
                }
                #[inline]
                fn to_c128(self) -> Complex<f64> {
                    Complex::new(self.as_(), 0.0)
                }
                #[inline]
                fn from_i64(value: i64) -> Self {
                    value.as_()
                }
                #[inline]
                fn from_f64(value: f64) -> Self {
                    value.as_()
                }
                #[inline]
                fn from_c128(value: Complex<f64>) -> Self {
                    value.re.as_()
                }
            }
        )*
    };
}

impl_real_element!(
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
);

macro_rules! impl_complex_element {
    ($($part:ty => $kind:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for Complex<$part> {}

            impl Element for Complex<$part> {
                const ELEMENT_TYPE: ElementType = ElementType::$kind;

                #[inline]
                fn to_i64(self) -> i64 {
                    self.re.as_()
                }
                #[inline]
                fn to_f64(self) -> f64 {
                    self.re.as_()
                }
                #[inline]
                fn to_c128(self) -> Complex<f64> {
                    Complex::new(self.re.as_(), self.im.as_())
                }
                #[inline]
                fn from_i64(value: i64) -> Self {
                    Complex::new(value.as_(), 0.0)
                }
                #[inline]
                fn from_f64(value: f64) -> Self {
                    Complex::new(value.as_(), 0.0)
                }
                #[inline]
                fn from_c128(value: Complex<f64>) -> Self {
                    Complex::new(value.re.as_(), value.im.as_())
                }
            }
        )*
    };
}

impl_complex_element!(f32 => Complex64, f64 => Complex128);
