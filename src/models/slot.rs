//! Positional slot and cell addressing.
//!
//! Cells are addressed by index into the owning grid's configured label
//! lists, never by concatenated label strings. Label-based keys collide
//! when labels contain the delimiter; index tuples with structural
//! equality cannot.

use serde::{Deserialize, Serialize};

/// One teaching period: a (date, period) pair of indices into the grid's
/// configured `dates` and `periods` lists.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Slot {
    /// Index into `GridConfig::dates`.
    pub date: usize,
    /// Index into `GridConfig::periods`.
    pub period: usize,
}

/// Addressable unit of a grid: a slot plus a class-group index.
///
/// Holds at most one `Assignment`. Ordering is canonical grid order
/// (date, then period, then class), which is what subject ordinals are
/// counted in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellKey {
    /// The (date, period) slot.
    pub slot: Slot,
    /// Index into `GridConfig::classes`.
    pub class: usize,
}

impl Slot {
    /// Creates a slot from date and period indices.
    pub fn new(date: usize, period: usize) -> Self {
        Self { date, period }
    }
}

impl CellKey {
    /// Creates a cell key from date, period, and class indices.
    pub fn new(date: usize, period: usize, class: usize) -> Self {
        Self {
            slot: Slot::new(date, period),
            class,
        }
    }

    /// Date index shorthand.
    #[inline]
    pub fn date(&self) -> usize {
        self.slot.date
    }

    /// Period index shorthand.
    #[inline]
    pub fn period(&self) -> usize {
        self.slot.period
    }
}
