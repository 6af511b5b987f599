//! Snapshot operations over the project.
//!
//! Every operation takes `&Project` and returns a new `Project`; callers
//! keep undo history as a stack of snapshots. Nothing here ever fails
//! destructively: addressing a missing grid, an out-of-range cell, or a
//! locked target returns the snapshot unchanged. Cross-grid effects
//! (teacher removal, renames) are applied here so the roster and every
//! grid stay consistent.

use crate::generator::Candidate;
use crate::models::{CellKey, Grid, GridConfig, GridId, Project, Teacher};

/// Which half of a cell an [`assign`](Project::assign) call edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignField {
    /// The subject label.
    Subject,
    /// The teacher name.
    Teacher,
}

impl Project {
    /// Sets one field of one cell. Returns the snapshot unchanged when
    /// the grid is unknown, the cell is out of range, or the cell is
    /// locked.
    ///
    /// Assigning a subject resets the cell's teacher: the previous
    /// teacher was chosen for the previous subject. Assigning `None`
    /// clears the field; an entry left empty and unlocked is removed.
    pub fn assign(
        &self,
        grid_id: GridId,
        cell: CellKey,
        field: AssignField,
        value: Option<&str>,
    ) -> Project {
        let mut next = self.clone();
        let Some(grid) = next.grid_mut(grid_id) else {
            return next;
        };
        if !grid.config.contains(&cell) || grid.is_locked(&cell) {
            return next;
        }

        let mut entry = grid.assignment(&cell).cloned().unwrap_or_default();
        match field {
            AssignField::Subject => {
                entry.subject = value.map(str::to_string);
                entry.teacher = None;
            }
            AssignField::Teacher => {
                entry.teacher = value.map(str::to_string);
            }
        }
        grid.put(cell, entry);
        next
    }

    /// Flips the lock flag of a cell. Locking an empty cell creates a
    /// locked empty entry, which keeps the generator away from it.
    pub fn toggle_lock(&self, grid_id: GridId, cell: CellKey) -> Project {
        let mut next = self.clone();
        let Some(grid) = next.grid_mut(grid_id) else {
            return next;
        };
        if !grid.config.contains(&cell) {
            return next;
        }

        let mut entry = grid.assignment(&cell).cloned().unwrap_or_default();
        entry.locked = !entry.locked;
        grid.put(cell, entry);
        next
    }

    /// Empties a cell. No-op when the cell is locked.
    pub fn clear_cell(&self, grid_id: GridId, cell: CellKey) -> Project {
        let mut next = self.clone();
        let Some(grid) = next.grid_mut(grid_id) else {
            return next;
        };
        if grid.is_locked(&cell) {
            return next;
        }
        grid.cells.remove(&cell);
        next
    }

    /// Commits a generated candidate by replacing the grid's cell map.
    pub fn apply_candidate(&self, grid_id: GridId, candidate: &Candidate) -> Project {
        let mut next = self.clone();
        if let Some(grid) = next.grid_mut(grid_id) {
            grid.cells = candidate.cells.clone();
        }
        next
    }

    /// Adds a teacher to the roster. Names are the roster key, so a
    /// duplicate name returns the snapshot unchanged.
    pub fn add_teacher(&self, teacher: Teacher) -> Project {
        let mut next = self.clone();
        if next.teacher(&teacher.name).is_none() {
            next.teachers.push(teacher);
        }
        next
    }

    /// Replaces the teacher named `name`. A rename cascades into every
    /// referencing cell so cell references never go stale.
    pub fn edit_teacher(&self, name: &str, replacement: Teacher) -> Project {
        let mut next = self.clone();
        let Some(index) = next.teachers.iter().position(|t| t.name == name) else {
            return next;
        };
        let new_name = replacement.name.clone();
        next.teachers[index] = replacement;
        if new_name != name {
            for grid in &mut next.grids {
                for assignment in grid.cells.values_mut() {
                    if assignment.teacher.as_deref() == Some(name) {
                        assignment.teacher = Some(new_name.clone());
                    }
                }
            }
        }
        next
    }

    /// Removes a teacher, clearing the teacher field (and only the
    /// teacher field) of every cell that referenced them, in every grid.
    pub fn remove_teacher(&self, name: &str) -> Project {
        let mut next = self.clone();
        next.teachers.retain(|t| t.name != name);
        for grid in &mut next.grids {
            for assignment in grid.cells.values_mut() {
                if assignment.teacher.as_deref() == Some(name) {
                    assignment.teacher = None;
                }
            }
            // The cascade may leave vacant entries behind.
            grid.cells.retain(|_, a| !a.is_vacant());
        }
        next
    }

    /// Adds an empty grid and returns its id.
    pub fn add_grid(&self, name: impl Into<String>, config: GridConfig) -> (Project, GridId) {
        let mut next = self.clone();
        let id = GridId(next.next_grid_id);
        next.next_grid_id += 1;
        next.grids.push(Grid::new(id, name, config));
        (next, id)
    }

    /// Removes a grid. Other grids and the roster are untouched.
    pub fn remove_grid(&self, grid_id: GridId) -> Project {
        let mut next = self.clone();
        next.grids.retain(|g| g.id != grid_id);
        next
    }

    /// Renames a grid without changing its identity or schedule.
    pub fn rename_grid(&self, grid_id: GridId, name: impl Into<String>) -> Project {
        let mut next = self.clone();
        if let Some(grid) = next.grid_mut(grid_id) {
            grid.name = name.into();
        }
        next
    }
}
