//! Conflict and metrics analysis.
//!
//! Derives every live diagnostic from a project snapshot: cross-grid
//! teacher conflicts, per-day subject counts, chronological subject
//! ordinals, and per-date teacher workloads. Pure and deterministic;
//! recomputed from scratch on every call, so callers re-run it after each
//! mutation and never hold incremental state.
//!
//! # Algorithm
//!
//! Two passes. The first walks every grid's cells once, tallying
//! (date, period, teacher) occupancy and (date, teacher) daily load —
//! O(total cells). The second walks only the active grid in canonical
//! order (configured date order, then period order) to number subject
//! occurrences per class and count same-day repeats.

use std::collections::{HashMap, HashSet};

use crate::models::{CellKey, Grid, GridId, Project};

/// A teacher appearing in more than one cell at one labelled slot,
/// counted across every grid in the project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConflictKey {
    /// Date label.
    pub date: String,
    /// Period label.
    pub period: String,
    /// Teacher name.
    pub teacher: String,
}

impl ConflictKey {
    /// Creates a conflict key from labels.
    pub fn new(
        date: impl Into<String>,
        period: impl Into<String>,
        teacher: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            period: period.into(),
            teacher: teacher.into(),
        }
    }
}

/// Everything the analyzer derives from one snapshot.
///
/// Conflicts and loads span the whole project; `error_cells`,
/// `daily_subject_count`, and `subject_ordinal` describe the active grid
/// only.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    /// Double-booked (date, period, teacher) triples across all grids.
    pub conflicts: HashSet<ConflictKey>,
    /// Active-grid cells whose teacher is conflicted at that slot.
    pub error_cells: HashSet<CellKey>,
    /// (class index, date index, subject) → occurrences that day,
    /// within the active grid. Values above 1 flag the daily-uniqueness
    /// rule; the assign operation itself is never rejected for it.
    pub daily_subject_count: HashMap<(usize, usize, String), u32>,
    /// 1-based chronological occurrence number of each cell's subject for
    /// its class, in canonical order. An ordinal above the subject's
    /// quota flags overflow.
    pub subject_ordinal: HashMap<CellKey, u32>,
    /// (date label, teacher name) → external baseline plus committed
    /// cells across all grids.
    pub teacher_daily_load: HashMap<(String, String), u32>,
}

impl Analysis {
    /// Whether a teacher is double-booked at a labelled slot.
    pub fn is_conflicted(&self, date: &str, period: &str, teacher: &str) -> bool {
        self.conflicts
            .contains(&ConflictKey::new(date, period, teacher))
    }

    /// Daily load for a (date label, teacher) pair; 0 when unseen.
    pub fn daily_load(&self, date: &str, teacher: &str) -> u32 {
        self.teacher_daily_load
            .get(&(date.to_string(), teacher.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Active-grid cells whose subject ordinal exceeds its quota.
    ///
    /// Overflow is a visible warning, not a blocked state; this is the
    /// query the interaction surface highlights from.
    pub fn overflow_cells(&self, grid: &Grid) -> Vec<CellKey> {
        let mut cells: Vec<CellKey> = self
            .subject_ordinal
            .iter()
            .filter(|&(cell, &ordinal)| {
                grid.assignment(cell)
                    .and_then(|a| a.subject.as_deref())
                    .is_some_and(|subject| ordinal > grid.config.quota(subject))
            })
            .map(|(cell, _)| *cell)
            .collect();
        cells.sort();
        cells
    }

    /// (date, teacher, load) entries at or above a workload threshold.
    ///
    /// Backs the non-blocking workload warning for manual edits; the
    /// generator applies its own hard cap separately.
    pub fn loads_at_least(&self, min: u32) -> Vec<(String, String, u32)> {
        let mut loads: Vec<(String, String, u32)> = self
            .teacher_daily_load
            .iter()
            .filter(|&(_, &load)| load >= min)
            .map(|((date, teacher), &load)| (date.clone(), teacher.clone(), load))
            .collect();
        loads.sort();
        loads
    }
}

/// Analyzes a project snapshot against one active grid.
///
/// An unknown `grid_id` still yields the cross-grid outputs (conflicts,
/// daily loads); the active-grid outputs stay empty.
pub fn analyze(project: &Project, grid_id: GridId) -> Analysis {
    let mut analysis = Analysis::default();

    // Pass 1: slot occupancy and daily load across every grid.
    let mut slot_tally: HashMap<(String, String, String), u32> = HashMap::new();
    let mut day_tally: HashMap<(String, String), u32> = HashMap::new();

    for grid in &project.grids {
        for (cell, assignment) in &grid.cells {
            let Some(teacher) = assignment.teacher.as_deref() else {
                continue;
            };
            let (Some(date), Some(period)) = (
                grid.config.date_label(cell.slot),
                grid.config.period_label(cell.slot),
            ) else {
                // Stale out-of-range cell; not this pass's problem.
                continue;
            };
            *slot_tally
                .entry((date.to_string(), period.to_string(), teacher.to_string()))
                .or_insert(0) += 1;
            *day_tally
                .entry((date.to_string(), teacher.to_string()))
                .or_insert(0) += 1;
        }
    }

    for ((date, period, teacher), count) in slot_tally {
        if count > 1 {
            analysis
                .conflicts
                .insert(ConflictKey::new(date, period, teacher));
        }
    }

    // Daily load = external baseline + committed cells; keys from either
    // source appear in the output.
    analysis.teacher_daily_load = day_tally;
    for (date, per_teacher) in &project.external_counts {
        for (teacher, &baseline) in per_teacher {
            *analysis
                .teacher_daily_load
                .entry((date.clone(), teacher.clone()))
                .or_insert(0) += baseline;
        }
    }

    // Pass 2: active-grid ordinals, daily counts, and error cells.
    let Some(grid) = project.grid(grid_id) else {
        return analysis;
    };

    for class in 0..grid.config.classes.len() {
        let mut seen: HashMap<String, u32> = HashMap::new();
        for cell in grid.config.class_cells_in_canonical_order(class) {
            let Some(subject) = grid
                .assignment(&cell)
                .and_then(|a| a.subject.as_deref())
            else {
                continue;
            };
            let ordinal = seen.entry(subject.to_string()).or_insert(0);
            *ordinal += 1;
            analysis.subject_ordinal.insert(cell, *ordinal);
            *analysis
                .daily_subject_count
                .entry((class, cell.date(), subject.to_string()))
                .or_insert(0) += 1;
        }
    }

    for (cell, assignment) in &grid.cells {
        let Some(teacher) = assignment.teacher.as_deref() else {
            continue;
        };
        let (Some(date), Some(period)) = (
            grid.config.date_label(cell.slot),
            grid.config.period_label(cell.slot),
        ) else {
            continue;
        };
        if analysis.is_conflicted(date, period, teacher) {
            analysis.error_cells.insert(*cell);
        }
    }

    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Assignment, Grid, GridConfig, Project, Teacher};

    fn config() -> GridConfig {
        GridConfig::new(
            vec!["D1".into(), "D2".into()],
            vec!["P1".into(), "P2".into()],
            vec!["C1".into(), "C2".into()],
            vec!["Math".into(), "English".into()],
        )
        .with_quota("Math", 2)
        .with_quota("English", 1)
    }

    fn project_with_grid() -> Project {
        let mut project = Project::new()
            .with_teacher(Teacher::new("Alice").with_subject("Math"))
            .with_teacher(Teacher::new("Bob").with_subject("English"));
        project.grids.push(Grid::new(GridId(1), "winter", config()));
        project
    }

    fn put(project: &mut Project, grid: usize, cell: CellKey, subject: &str, teacher: &str) {
        project.grids[grid].put(cell, Assignment::new(subject, teacher));
    }

    #[test]
    fn test_no_double_occupancy_means_no_conflicts() {
        let mut project = project_with_grid();
        put(&mut project, 0, CellKey::new(0, 0, 0), "Math", "Alice");
        put(&mut project, 0, CellKey::new(0, 0, 1), "English", "Bob");
        put(&mut project, 0, CellKey::new(0, 1, 0), "English", "Bob");

        let analysis = analyze(&project, GridId(1));
        assert!(analysis.conflicts.is_empty());
        assert!(analysis.error_cells.is_empty());
    }

    #[test]
    fn test_same_slot_two_classes_is_a_conflict() {
        let mut project = project_with_grid();
        put(&mut project, 0, CellKey::new(0, 0, 0), "Math", "Alice");
        put(&mut project, 0, CellKey::new(0, 0, 1), "Math", "Alice");

        let analysis = analyze(&project, GridId(1));
        assert!(analysis.is_conflicted("D1", "P1", "Alice"));
        assert!(!analysis.is_conflicted("D1", "P2", "Alice"));
        assert_eq!(analysis.error_cells.len(), 2);
        assert!(analysis.error_cells.contains(&CellKey::new(0, 0, 0)));
        assert!(analysis.error_cells.contains(&CellKey::new(0, 0, 1)));
    }

    #[test]
    fn test_conflicts_span_grids() {
        let mut project = project_with_grid();
        project.grids.push(Grid::new(GridId(2), "evening", config()));
        put(&mut project, 0, CellKey::new(0, 0, 0), "Math", "Alice");
        put(&mut project, 1, CellKey::new(0, 0, 0), "Math", "Alice");

        // Both grids see the conflict, each flagging its own cell.
        for id in [GridId(1), GridId(2)] {
            let analysis = analyze(&project, id);
            assert!(analysis.is_conflicted("D1", "P1", "Alice"));
            assert!(analysis.error_cells.contains(&CellKey::new(0, 0, 0)));
        }
    }

    #[test]
    fn test_disjoint_date_labels_cannot_conflict() {
        let mut project = project_with_grid();
        let other = GridConfig::new(
            vec!["D9".into()],
            vec!["P1".into()],
            vec!["C1".into()],
            vec!["Math".into()],
        );
        project.grids.push(Grid::new(GridId(2), "spring", other));
        put(&mut project, 0, CellKey::new(0, 0, 0), "Math", "Alice");
        put(&mut project, 1, CellKey::new(0, 0, 0), "Math", "Alice");

        let analysis = analyze(&project, GridId(1));
        assert!(analysis.conflicts.is_empty());
    }

    #[test]
    fn test_daily_subject_count_flags_same_day_repeat() {
        let mut project = project_with_grid();
        put(&mut project, 0, CellKey::new(0, 0, 0), "Math", "Alice");
        put(&mut project, 0, CellKey::new(0, 1, 0), "Math", "Alice");

        let analysis = analyze(&project, GridId(1));
        assert_eq!(
            analysis.daily_subject_count[&(0, 0, "Math".to_string())],
            2
        );
    }

    #[test]
    fn test_subject_ordinal_follows_canonical_order_not_edit_order() {
        let mut project = project_with_grid();
        // Edit the later slot first; ordinals must still be chronological.
        put(&mut project, 0, CellKey::new(1, 1, 0), "Math", "Alice");
        put(&mut project, 0, CellKey::new(0, 0, 0), "Math", "Alice");

        let analysis = analyze(&project, GridId(1));
        assert_eq!(analysis.subject_ordinal[&CellKey::new(0, 0, 0)], 1);
        assert_eq!(analysis.subject_ordinal[&CellKey::new(1, 1, 0)], 2);
    }

    #[test]
    fn test_ordinal_overflow_is_flagged_not_blocked() {
        let mut project = project_with_grid();
        // English quota is 1; a second English cell overflows.
        put(&mut project, 0, CellKey::new(0, 0, 0), "English", "Bob");
        put(&mut project, 0, CellKey::new(1, 0, 0), "English", "Bob");

        let analysis = analyze(&project, GridId(1));
        assert_eq!(analysis.subject_ordinal[&CellKey::new(1, 0, 0)], 2);
        let grid = project.grid(GridId(1)).unwrap();
        assert_eq!(analysis.overflow_cells(grid), vec![CellKey::new(1, 0, 0)]);
    }

    #[test]
    fn test_daily_load_sums_external_and_all_grids() {
        let mut project = project_with_grid().with_external_load("D1", "Alice", 2);
        project.grids.push(Grid::new(GridId(2), "evening", config()));
        put(&mut project, 0, CellKey::new(0, 0, 0), "Math", "Alice");
        put(&mut project, 1, CellKey::new(0, 1, 0), "Math", "Alice");

        let analysis = analyze(&project, GridId(1));
        assert_eq!(analysis.daily_load("D1", "Alice"), 4);
        assert_eq!(analysis.daily_load("D2", "Alice"), 0);
        assert_eq!(
            analysis.loads_at_least(4),
            vec![("D1".to_string(), "Alice".to_string(), 4)]
        );
    }

    #[test]
    fn test_unknown_grid_keeps_cross_grid_outputs() {
        let mut project = project_with_grid();
        put(&mut project, 0, CellKey::new(0, 0, 0), "Math", "Alice");
        put(&mut project, 0, CellKey::new(0, 0, 1), "Math", "Alice");

        let analysis = analyze(&project, GridId(99));
        assert!(analysis.is_conflicted("D1", "P1", "Alice"));
        assert!(analysis.error_cells.is_empty());
        assert!(analysis.subject_ordinal.is_empty());
    }

    #[test]
    fn test_subject_without_teacher_still_gets_ordinal() {
        let mut project = project_with_grid();
        project.grids[0].put(
            CellKey::new(0, 0, 0),
            Assignment {
                subject: Some("Math".into()),
                teacher: None,
                locked: false,
            },
        );

        let analysis = analyze(&project, GridId(1));
        assert_eq!(analysis.subject_ordinal[&CellKey::new(0, 0, 0)], 1);
        assert!(analysis.teacher_daily_load.is_empty());
    }
}
