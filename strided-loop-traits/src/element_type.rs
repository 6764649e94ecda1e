//! The closed enumeration of scalar kinds and their promotion order.

use std::fmt;

/// A scalar kind an array buffer can hold.
///
/// The declaration order is the promotion order: every integer kind ranks
/// below `Float32`, which ranks below `Float64`, then the complex kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    /// Complex number with two `f32` parts.
    Complex64,
    /// Complex number with two `f64` parts.
    Complex128,
}

impl ElementType {
    /// Every element type, in ascending promotion rank.
    pub const ALL: [ElementType; 8] = [
        ElementType::Int8,
        ElementType::Int16,
        ElementType::Int32,
        ElementType::Int64,
        ElementType::Float32,
        ElementType::Float64,
        ElementType::Complex64,
        ElementType::Complex128,
    ];

    /// Size of one element in bytes.
    #[inline]
    pub const fn byte_size(self) -> usize {
        match self {
            ElementType::Int8 => 1,
            ElementType::Int16 => 2,
            ElementType::Int32 => 4,
            ElementType::Int64 => 8,
            ElementType::Float32 => 4,
            ElementType::Float64 => 8,
            ElementType::Complex64 => 8,
            ElementType::Complex128 => 16,
        }
    }

    /// Position in the promotion order; higher wins when two types combine.
    #[inline]
    pub const fn promotion_rank(self) -> u8 {
        match self {
            ElementType::Int8 => 0,
            ElementType::Int16 => 1,
            ElementType::Int32 => 2,
            ElementType::Int64 => 3,
            ElementType::Float32 => 4,
            ElementType::Float64 => 5,
            ElementType::Complex64 => 6,
            ElementType::Complex128 => 7,
        }
    }

    /// The type that results from combining `self` with `other`.
    ///
    /// Ranks are distinct, so the result does not depend on argument order.
    #[inline]
    pub const fn promote(self, other: ElementType) -> ElementType {
        if other.promotion_rank() > self.promotion_rank() {
            other
        } else {
            self
        }
    }

    #[inline]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            ElementType::Int8 | ElementType::Int16 | ElementType::Int32 | ElementType::Int64
        )
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, ElementType::Float32 | ElementType::Float64)
    }

    #[inline]
    pub const fn is_complex(self) -> bool {
        matches!(self, ElementType::Complex64 | ElementType::Complex128)
    }

    pub const fn name(self) -> &'static str {
        match self {
            ElementType::Int8 => "int8",
            ElementType::Int16 => "int16",
            ElementType::Int32 => "int32",
            ElementType::Int64 => "int64",
            ElementType::Float32 => "float32",
            ElementType::Float64 => "float64",
            ElementType::Complex64 => "complex64",
            ElementType::Complex128 => "complex128",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Size of one element of `kind` in bytes.
#[inline]
pub const fn byte_size(kind: ElementType) -> usize {
    kind.byte_size()
}

/// The higher-ranked of `a` and `b`.
#[inline]
pub const fn promote(a: ElementType, b: ElementType) -> ElementType {
    a.promote(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_sizes() {
        let sizes: Vec<usize> = ElementType::ALL.iter().map(|t| t.byte_size()).collect();
        assert_eq!(sizes, vec![1, 2, 4, 8, 4, 8, 8, 16]);
    }

    #[test]
    fn test_ranks_are_strictly_increasing() {
        for pair in ElementType::ALL.windows(2) {
            assert!(pair[0].promotion_rank() < pair[1].promotion_rank());
        }
    }

    #[test]
    fn test_promote_picks_higher_rank() {
        assert_eq!(promote(ElementType::Int64, ElementType::Float32), ElementType::Float32);
        assert_eq!(promote(ElementType::Float64, ElementType::Complex64), ElementType::Complex64);
        assert_eq!(promote(ElementType::Int16, ElementType::Int8), ElementType::Int16);
    }

    #[test]
    fn test_promote_commutative_and_idempotent() {
        for &a in &ElementType::ALL {
            assert_eq!(promote(a, a), a);
            for &b in &ElementType::ALL {
                assert_eq!(promote(a, b), promote(b, a));
            }
        }
    }

    #[test]
    fn test_kind_classes() {
        assert!(ElementType::Int32.is_integer());
        assert!(!ElementType::Int32.is_float());
        assert!(ElementType::Float32.is_float());
        assert!(ElementType::Complex128.is_complex());
        assert_eq!(ElementType::Complex64.to_string(), "complex64");
    }
}
