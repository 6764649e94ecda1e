//! Lock-step stepping of several cursors.
//!
//! The first cursor of a [`LoopGroup`] is the primary: it decides when each
//! level wraps. Every other member replays the primary's rollover on its own
//! axes, holding levels of extent 1 stationary. Extents are compared once,
//! when the group is built; stepping does no checks.

use tracing::trace;

use crate::cursor::{LoopCursor, Rollover, Run};
use crate::{LoopError, Result};

/// Two or more cursors that always sit at the same logical position.
#[derive(Debug, Clone)]
pub struct LoopGroup {
    cursors: Vec<LoopCursor>,
}

/// Group `primary` with `others`. See [`LoopGroup::new`].
pub fn pair_cursors(primary: LoopCursor, others: Vec<LoopCursor>) -> Result<LoopGroup> {
    LoopGroup::new(primary, others)
}

impl LoopGroup {
    /// Group `primary` with `others` and rewind all of them to Ready.
    ///
    /// Every member must have the primary's number of levels, and each level
    /// (and the block run) must have the primary's extent or extent 1.
    ///
    /// # Errors
    /// [`LoopError::ShapeMismatch`] if the level counts differ, or if an
    /// extent differs and is not 1. A missing level is reported at the first
    /// level one cursor lacks, with the two level counts as the extents; the
    /// block run is reported as level `level_count`.
    pub fn new(primary: LoopCursor, others: Vec<LoopCursor>) -> Result<Self> {
        let levels = primary.level_count();
        for other in &others {
            if other.level_count() != levels {
                return Err(LoopError::ShapeMismatch {
                    level: levels.min(other.level_count()),
                    expected: levels,
                    found: other.level_count(),
                });
            }
            for level in 0..levels {
                check_extent(level, primary.level_extent(level), other.level_extent(level))?;
            }
            check_extent(levels, primary.run().len, other.run().len)?;
        }
        let mut cursors = Vec::with_capacity(others.len() + 1);
        cursors.push(primary);
        cursors.extend(others);
        for cursor in &mut cursors {
            cursor.reset();
        }
        let extents: Vec<usize> = (0..levels).map(|l| cursors[0].level_extent(l)).collect();
        trace!(members = cursors.len(), extents = ?extents, "built loop group");
        Ok(Self { cursors })
    }

    /// Group cursors whose compatibility is already established.
    pub(crate) fn from_compatible(cursors: Vec<LoopCursor>) -> Self {
        debug_assert!(!cursors.is_empty());
        Self { cursors }
    }

    /// Advance the primary and replay its rollover on every other member.
    ///
    /// Returns the primary's rollover.
    #[inline]
    pub fn advance_all(&mut self) -> Rollover {
        let (primary, others) = self.cursors.split_at_mut(1);
        let rollover = primary[0].advance();
        for cursor in others {
            cursor.follow(rollover);
        }
        rollover
    }

    /// Rewind every member to Ready.
    pub fn reset_all(&mut self) {
        for cursor in &mut self.cursors {
            cursor.reset();
        }
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.cursors[0].is_exhausted()
    }

    #[inline]
    pub fn primary(&self) -> &LoopCursor {
        &self.cursors[0]
    }

    /// Member `index`; 0 is the primary.
    #[inline]
    pub fn cursor(&self, index: usize) -> &LoopCursor {
        &self.cursors[index]
    }

    #[inline]
    pub fn cursors(&self) -> &[LoopCursor] {
        &self.cursors
    }

    /// Number of members, primary included.
    #[inline]
    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    /// Current offset of member `index`.
    #[inline]
    pub fn offset(&self, index: usize) -> usize {
        self.cursors[index].offset()
    }

    /// Current block run of member `index`.
    #[inline]
    pub fn run(&self, index: usize) -> Run {
        self.cursors[index].run()
    }

    pub fn into_cursors(self) -> Vec<LoopCursor> {
        self.cursors
    }
}

fn check_extent(level: usize, expected: usize, found: usize) -> Result<()> {
    if found == expected || found == 1 {
        Ok(())
    } else {
        Err(LoopError::ShapeMismatch {
            level,
            expected,
            found,
        })
    }
}
