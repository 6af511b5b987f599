//! Grid model: configuration, assignments, and the cell map.
//!
//! A grid is one independently configured timetable (dates × periods ×
//! class groups). Cells start empty; an entry in the cell map is the
//! single `Assignment` a cell may hold.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{CellKey, Slot};

/// Stable grid identity. Survives renames; never reused within a project.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridId(pub u64);

/// The contents of one cell: optional subject, optional teacher, lock flag.
///
/// Absence of both fields with `locked == false` is equivalent to an empty
/// cell; the coordinator removes such entries rather than keeping them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Assigned subject label, if any.
    #[serde(default)]
    pub subject: Option<String>,
    /// Assigned teacher name, if any.
    #[serde(default)]
    pub teacher: Option<String>,
    /// Locked cells are immutable to the generator and to bulk mutation.
    #[serde(default)]
    pub locked: bool,
}

impl Assignment {
    /// Creates a complete assignment (subject and teacher, unlocked).
    pub fn new(subject: impl Into<String>, teacher: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
            teacher: Some(teacher.into()),
            locked: false,
        }
    }

    /// Whether both subject and teacher are set.
    pub fn is_complete(&self) -> bool {
        self.subject.is_some() && self.teacher.is_some()
    }

    /// Whether the entry carries no information at all.
    pub fn is_vacant(&self) -> bool {
        self.subject.is_none() && self.teacher.is_none() && !self.locked
    }
}

/// Grid configuration: ordered label lists plus per-subject quotas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Ordered date labels.
    pub dates: Vec<String>,
    /// Ordered period labels.
    pub periods: Vec<String>,
    /// Ordered class-group labels.
    pub classes: Vec<String>,
    /// Known subjects, in display order.
    pub subjects: Vec<String>,
    /// Target occurrence count per subject, per class group, over the
    /// whole grid. Subjects missing from the map have quota 0.
    #[serde(default)]
    pub subject_counts: HashMap<String, u32>,
}

impl GridConfig {
    /// Creates a configuration from label lists.
    pub fn new(
        dates: Vec<String>,
        periods: Vec<String>,
        classes: Vec<String>,
        subjects: Vec<String>,
    ) -> Self {
        Self {
            dates,
            periods,
            classes,
            subjects,
            subject_counts: HashMap::new(),
        }
    }

    /// Sets the quota for one subject.
    pub fn with_quota(mut self, subject: impl Into<String>, count: u32) -> Self {
        self.subject_counts.insert(subject.into(), count);
        self
    }

    /// Quota for a subject; 0 when the subject has no configured count.
    pub fn quota(&self, subject: &str) -> u32 {
        self.subject_counts.get(subject).copied().unwrap_or(0)
    }

    /// Whether the cell's indices all fall inside the configured lists.
    pub fn contains(&self, cell: &CellKey) -> bool {
        cell.date() < self.dates.len()
            && cell.period() < self.periods.len()
            && cell.class < self.classes.len()
    }

    /// Date label for a slot, if in range.
    pub fn date_label(&self, slot: Slot) -> Option<&str> {
        self.dates.get(slot.date).map(String::as_str)
    }

    /// Period label for a slot, if in range.
    pub fn period_label(&self, slot: Slot) -> Option<&str> {
        self.periods.get(slot.period).map(String::as_str)
    }

    /// Class label for a cell, if in range.
    pub fn class_label(&self, cell: &CellKey) -> Option<&str> {
        self.classes.get(cell.class).map(String::as_str)
    }

    /// All cell keys in canonical order: date, then period, then class.
    pub fn cells_in_canonical_order(&self) -> impl Iterator<Item = CellKey> + '_ {
        (0..self.dates.len()).flat_map(move |d| {
            (0..self.periods.len()).flat_map(move |p| {
                (0..self.classes.len()).map(move |c| CellKey::new(d, p, c))
            })
        })
    }

    /// Cell keys of one class group in canonical (date, period) order.
    pub fn class_cells_in_canonical_order(
        &self,
        class: usize,
    ) -> impl Iterator<Item = CellKey> + '_ {
        (0..self.dates.len()).flat_map(move |d| {
            (0..self.periods.len()).map(move |p| CellKey::new(d, p, class))
        })
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.dates.len() * self.periods.len() * self.classes.len()
    }
}

/// One timetable grid sharing the project's teacher roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    /// Stable identity.
    pub id: GridId,
    /// Display name; renaming does not affect identity.
    pub name: String,
    /// Label lists and quotas.
    pub config: GridConfig,
    /// The cell map. Missing keys are empty cells.
    #[serde(with = "cells_as_entries", default)]
    pub cells: HashMap<CellKey, Assignment>,
}

impl Grid {
    /// Creates an empty grid.
    pub fn new(id: GridId, name: impl Into<String>, config: GridConfig) -> Self {
        Self {
            id,
            name: name.into(),
            config,
            cells: HashMap::new(),
        }
    }

    /// The assignment in a cell, if any.
    pub fn assignment(&self, cell: &CellKey) -> Option<&Assignment> {
        self.cells.get(cell)
    }

    /// Whether the cell is locked.
    pub fn is_locked(&self, cell: &CellKey) -> bool {
        self.cells.get(cell).is_some_and(|a| a.locked)
    }

    /// Cells holding at least a subject or a teacher.
    pub fn filled_cells(&self) -> impl Iterator<Item = (&CellKey, &Assignment)> + '_ {
        self.cells
            .iter()
            .filter(|(_, a)| a.subject.is_some() || a.teacher.is_some())
    }

    /// Inserts or removes an entry, dropping vacant entries.
    pub(crate) fn put(&mut self, cell: CellKey, assignment: Assignment) {
        if assignment.is_vacant() {
            self.cells.remove(&cell);
        } else {
            self.cells.insert(cell, assignment);
        }
    }
}

/// Serializes the cell map as a list of (key, assignment) entries.
///
/// JSON object keys must be strings, so a map keyed by a composite struct
/// cannot serialize directly.
mod cells_as_entries {
    use super::{Assignment, CellKey};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::HashMap;

    pub fn serialize<S: Serializer>(
        cells: &HashMap<CellKey, Assignment>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut entries: Vec<(&CellKey, &Assignment)> = cells.iter().collect();
        entries.sort_by_key(|(k, _)| **k);
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<HashMap<CellKey, Assignment>, D::Error> {
        let entries = Vec::<(CellKey, Assignment)>::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}
