//! Timetable grid scheduling engine.
//!
//! Assigns a subject and a teacher to each cell of a grid indexed by
//! (date, period, class group), diagnoses scheduling problems live, and
//! auto-completes partially filled grids by randomized backtracking.
//! Rendering, input handling, undo history, and persistence transport
//! are external collaborators; this crate is the engine they call.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `Slot`, `CellKey`, `Assignment`,
//!   `Teacher`, `Grid`, `GridConfig`, `Project`
//! - **`analysis`**: Pure diagnostics — cross-grid teacher conflicts,
//!   subject ordinals, daily subject counts, teacher workloads
//! - **`generator`**: Randomized backtracking search producing complete
//!   candidate fillings under hard constraints
//! - **`coordinator`**: Snapshot mutation operations (assign, lock,
//!   clear, roster and grid management, candidate application)
//! - **`validation`**: Document integrity checks and stale-reference
//!   sanitation
//!
//! # Snapshot model
//!
//! A [`models::Project`] is an immutable snapshot: every mutation returns
//! a new project, so history and undo are a caller-side stack of values.
//! The analyzer is pure and recomputed per snapshot; the generator works
//! on a private copy and publishes results only through
//! `Project::apply_candidate`.

pub mod analysis;
pub mod coordinator;
pub mod generator;
pub mod models;
pub mod validation;
