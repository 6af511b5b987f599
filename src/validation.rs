//! Structural integrity checks and stale-reference sanitation.
//!
//! Checks a project document before the engine relies on it. Detects:
//! - Duplicate teacher names and grid ids
//! - Cells referencing teachers missing from the roster
//! - Cells outside their grid's configured dimensions
//! - Quotas for subjects a grid does not list
//! - NG restrictions naming classes or slot labels no grid has
//!
//! Stale references never fail the project: [`sanitize`] drops them so
//! they act as "no restriction", which is how the engine treats them at
//! runtime anyway.

use std::collections::HashSet;

use crate::models::Project;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two roster teachers share a name.
    DuplicateTeacherName,
    /// Two grids share an id.
    DuplicateGridId,
    /// A cell names a teacher missing from the roster.
    UnknownTeacherReference,
    /// A cell key falls outside the grid's configured dimensions.
    CellOutOfRange,
    /// A quota entry names a subject the grid does not list.
    UnknownSubjectQuota,
    /// An NG-slot's labels match no grid's date/period lists.
    StaleNgSlot,
    /// An NG-class names a class no grid has.
    StaleNgClass,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a project document.
///
/// All issues are collected and reported together; nothing fails fast.
/// Stale NG references are reported here but tolerated everywhere else —
/// use [`sanitize`] to drop them.
pub fn validate_project(project: &Project) -> ValidationResult {
    let mut errors = Vec::new();

    let mut teacher_names = HashSet::new();
    for t in &project.teachers {
        if !teacher_names.insert(t.name.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateTeacherName,
                format!("Duplicate teacher name: {}", t.name),
            ));
        }
    }

    let mut grid_ids = HashSet::new();
    for grid in &project.grids {
        if !grid_ids.insert(grid.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateGridId,
                format!("Duplicate grid id: {:?}", grid.id),
            ));
        }

        for subject in grid.config.subject_counts.keys() {
            if !grid.config.subjects.iter().any(|s| s == subject) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownSubjectQuota,
                    format!(
                        "Grid '{}' has a quota for unlisted subject '{subject}'",
                        grid.name
                    ),
                ));
            }
        }

        for (cell, assignment) in &grid.cells {
            if !grid.config.contains(cell) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::CellOutOfRange,
                    format!(
                        "Grid '{}' has a cell outside its dimensions: {cell:?}",
                        grid.name
                    ),
                ));
            }
            if let Some(teacher) = assignment.teacher.as_deref() {
                if !teacher_names.contains(teacher) {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::UnknownTeacherReference,
                        format!(
                            "Grid '{}' cell {cell:?} references unknown teacher '{teacher}'",
                            grid.name
                        ),
                    ));
                }
            }
        }
    }

    let known_classes: HashSet<&str> = project
        .grids
        .iter()
        .flat_map(|g| g.config.classes.iter().map(String::as_str))
        .collect();
    let known_dates: HashSet<&str> = project
        .grids
        .iter()
        .flat_map(|g| g.config.dates.iter().map(String::as_str))
        .collect();
    let known_periods: HashSet<&str> = project
        .grids
        .iter()
        .flat_map(|g| g.config.periods.iter().map(String::as_str))
        .collect();

    for t in &project.teachers {
        for ng in &t.ng_slots {
            if !known_dates.contains(ng.date.as_str())
                || !known_periods.contains(ng.period.as_str())
            {
                errors.push(ValidationError::new(
                    ValidationErrorKind::StaleNgSlot,
                    format!(
                        "Teacher '{}' blocks unknown slot ({}, {})",
                        t.name, ng.date, ng.period
                    ),
                ));
            }
        }
        for class in &t.ng_classes {
            if !known_classes.contains(class.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::StaleNgClass,
                    format!("Teacher '{}' blocks unknown class '{class}'", t.name),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Drops stale references so they act as "no restriction".
///
/// Removes NG-classes naming classes no grid has, NG-slots whose labels
/// no grid configures, and cells outside their grid's dimensions (typical
/// after a date or class list is shortened). Never fails.
pub fn sanitize(project: &Project) -> Project {
    let mut next = project.clone();

    let known_classes: HashSet<String> = next
        .grids
        .iter()
        .flat_map(|g| g.config.classes.iter().cloned())
        .collect();
    let known_dates: HashSet<String> = next
        .grids
        .iter()
        .flat_map(|g| g.config.dates.iter().cloned())
        .collect();
    let known_periods: HashSet<String> = next
        .grids
        .iter()
        .flat_map(|g| g.config.periods.iter().cloned())
        .collect();

    for t in &mut next.teachers {
        t.ng_slots
            .retain(|ng| known_dates.contains(&ng.date) && known_periods.contains(&ng.period));
        t.ng_classes.retain(|c| known_classes.contains(c));
    }

    for grid in &mut next.grids {
        let config = grid.config.clone();
        grid.cells.retain(|cell, _| config.contains(cell));
    }

    next
}
