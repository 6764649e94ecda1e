//! Axis selections: which axes a cursor walks and how they nest.

use smallvec::SmallVec;

use crate::auxiliary::validate_axes;
use crate::{Result, MAX_DIMS};

pub(crate) type AxisVec = SmallVec<[usize; MAX_DIMS]>;

/// The active axes of a loop, grouped into nesting levels.
///
/// Levels are listed innermost first. A level usually holds a single axis;
/// a compressed level holds several axes that are carried internally (first
/// listed fastest) and reported to the caller as one level whose extent is
/// the product of theirs.
///
/// Block axes are not stepped at all. Their extent is handed to the caller
/// as one [`crate::Run`] per step, for row-at-a-time algorithms.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AxisSelection {
    order: AxisVec,
    level_ends: AxisVec,
    block: AxisVec,
}

impl AxisSelection {
    /// One level per axis, `axes[0]` innermost.
    pub fn new(axes: &[usize]) -> Self {
        Self {
            order: AxisVec::from_slice(axes),
            level_ends: (1..=axes.len()).collect(),
            block: AxisVec::new(),
        }
    }

    /// Every axis of a rank-`rank` array in natural order, axis 0 innermost.
    pub fn all(rank: usize) -> Self {
        let axes: Vec<usize> = (0..rank).collect();
        Self::new(&axes)
    }

    /// All `axes` fused into one level, `axes[0]` fastest within it.
    pub fn compressed(axes: &[usize]) -> Self {
        Self::from_levels(&[axes])
    }

    /// Explicit levels, innermost first. Empty levels are skipped.
    pub fn from_levels(levels: &[&[usize]]) -> Self {
        let mut order = AxisVec::new();
        let mut level_ends = AxisVec::new();
        for level in levels.iter().filter(|l| !l.is_empty()) {
            order.extend_from_slice(level);
            level_ends.push(order.len());
        }
        Self {
            order,
            level_ends,
            block: AxisVec::new(),
        }
    }

    /// Hand `axes` to the caller as one run per step instead of stepping them.
    pub fn with_block(mut self, axes: &[usize]) -> Self {
        self.block = AxisVec::from_slice(axes);
        self
    }

    /// Number of stepped levels.
    #[inline]
    pub fn level_count(&self) -> usize {
        self.level_ends.len()
    }

    /// Axes of level `level`, fastest first.
    #[inline]
    pub fn level(&self, level: usize) -> &[usize] {
        let start = if level == 0 {
            0
        } else {
            self.level_ends[level - 1]
        };
        &self.order[start..self.level_ends[level]]
    }

    /// Levels, innermost first.
    pub fn levels(&self) -> impl Iterator<Item = &[usize]> + '_ {
        (0..self.level_count()).map(move |l| self.level(l))
    }

    /// Every stepped axis in nesting order, innermost first.
    #[inline]
    pub fn coordinate_axes(&self) -> &[usize] {
        &self.order
    }

    #[inline]
    pub fn block_axes(&self) -> &[usize] {
        &self.block
    }

    /// Whether `axis` is stepped or part of the block.
    pub fn contains(&self, axis: usize) -> bool {
        self.order.contains(&axis) || self.block.contains(&axis)
    }

    pub(crate) fn level_bounds(&self) -> &[usize] {
        &self.level_ends
    }

    /// Check every axis against `rank`; stepped and block axes together
    /// must be unique.
    pub(crate) fn validate(&self, rank: usize) -> Result<()> {
        let all: AxisVec = self.order.iter().chain(self.block.iter()).copied().collect();
        validate_axes(&all, rank, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LoopError;

    #[test]
    fn test_new_has_one_axis_per_level() {
        let sel = AxisSelection::new(&[2, 0]);
        assert_eq!(sel.level_count(), 2);
        assert_eq!(sel.level(0), &[2]);
        assert_eq!(sel.level(1), &[0]);
        assert_eq!(sel.coordinate_axes(), &[2, 0]);
    }

    #[test]
    fn test_compressed_is_single_level() {
        let sel = AxisSelection::compressed(&[0, 1, 2]);
        assert_eq!(sel.level_count(), 1);
        assert_eq!(sel.level(0), &[0, 1, 2]);
    }

    #[test]
    fn test_from_levels_skips_empty() {
        let sel = AxisSelection::from_levels(&[&[1, 2], &[], &[0]]);
        let levels: Vec<&[usize]> = sel.levels().collect();
        assert_eq!(levels, vec![&[1usize, 2][..], &[0][..]]);
    }

    #[test]
    fn test_block_axes() {
        let sel = AxisSelection::new(&[1]).with_block(&[0]);
        assert_eq!(sel.block_axes(), &[0]);
        assert!(sel.contains(0));
        assert!(sel.contains(1));
        assert!(!sel.contains(2));
    }

    #[test]
    fn test_validate() {
        assert!(AxisSelection::all(3).validate(3).is_ok());
        assert!(matches!(
            AxisSelection::new(&[0, 3]).validate(3),
            Err(LoopError::AxisOutOfRange { axis: 3, rank: 3 })
        ));
        assert!(matches!(
            AxisSelection::new(&[1]).with_block(&[1]).validate(3),
            Err(LoopError::DuplicateAxis { axis: 1 })
        ));
    }
}
