//! Project model: the grids, the shared roster, and external loads.
//!
//! A project is the unit of snapshot mutation: every engine operation
//! takes a project and produces a new one (copy-on-write at project
//! granularity), so callers can keep history as a stack of snapshots.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Grid, GridId, Teacher};

/// Baseline teacher load from commitments outside any grid,
/// keyed date label → teacher name → count.
pub type ExternalCounts = HashMap<String, HashMap<String, u32>>;

/// The whole scheduling document: grids, roster, and external loads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Independent grids, all sharing `teachers`.
    pub grids: Vec<Grid>,
    /// The global teacher roster.
    pub teachers: Vec<Teacher>,
    /// Per-date baseline loads from outside this project.
    #[serde(default)]
    pub external_counts: ExternalCounts,
    /// Next value handed out by `add_grid`; never decreases.
    #[serde(default)]
    pub(crate) next_grid_id: u64,
}

impl Project {
    /// Creates an empty project.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a teacher to the roster (builder form, for setup code).
    pub fn with_teacher(mut self, teacher: Teacher) -> Self {
        self.teachers.push(teacher);
        self
    }

    /// Sets one external load entry (builder form, for setup code).
    pub fn with_external_load(
        mut self,
        date: impl Into<String>,
        teacher: impl Into<String>,
        count: u32,
    ) -> Self {
        self.external_counts
            .entry(date.into())
            .or_default()
            .insert(teacher.into(), count);
        self
    }

    /// Looks up a grid by id.
    pub fn grid(&self, id: GridId) -> Option<&Grid> {
        self.grids.iter().find(|g| g.id == id)
    }

    pub(crate) fn grid_mut(&mut self, id: GridId) -> Option<&mut Grid> {
        self.grids.iter_mut().find(|g| g.id == id)
    }

    /// Looks up a roster teacher by name.
    pub fn teacher(&self, name: &str) -> Option<&Teacher> {
        self.teachers.iter().find(|t| t.name == name)
    }

    /// External baseline load for a (date label, teacher) pair; 0 if unset.
    pub fn external_load(&self, date: &str, teacher: &str) -> u32 {
        self.external_counts
            .get(date)
            .and_then(|per_teacher| per_teacher.get(teacher))
            .copied()
            .unwrap_or(0)
    }
}
