//! Timetable domain models.
//!
//! Immutable value types for slots, cells, teachers, grids, and the
//! multi-grid project. These types carry structural validity only;
//! conflict detection lives in [`crate::analysis`] and all mutation goes
//! through the snapshot operations in [`crate::coordinator`].

mod grid;
mod project;
mod slot;
mod teacher;

pub use grid::{Assignment, Grid, GridConfig, GridId};
pub use project::{ExternalCounts, Project};
pub use slot::{CellKey, Slot};
pub use teacher::{NgSlot, Teacher};
