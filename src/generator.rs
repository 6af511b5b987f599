//! Constraint-based timetable generation.
//!
//! Fills the empty cells of one grid by randomized depth-first
//! backtracking. Every returned candidate is complete and satisfies all
//! hard constraints:
//!
//! 1. Every targeted cell receives both a subject and a teacher.
//! 2. A class group never has the same subject twice on one date.
//! 3. Per-class subject occurrences never exceed the configured quota.
//! 4. The teacher takes the subject and has neither the slot in their
//!    NG-slots nor the class in their NG-classes.
//! 5. A teacher holds at most one cell per labelled slot, checked against
//!    tentative placements and committed cells of every grid.
//! 6. The teacher's load for the date (external baseline + committed
//!    cells + tentative placements) stays strictly below the daily cap.
//!
//! Cell visitation order is shuffled per invocation; subjects are tried
//! by largest remaining quota deficit (ties random); eligible teachers in
//! random order. Undo is restore-on-return: the search owns a private
//! working copy and reverts every counter before backtracking, so shared
//! project state is never touched.

use std::cmp::Reverse;
use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{debug, trace};

use crate::models::{Assignment, CellKey, GridConfig, GridId, Project, Teacher};

/// Why a generation run produced no candidates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    /// The addressed grid does not exist.
    #[error("grid {0:?} does not exist in this project")]
    UnknownGrid(GridId),
    /// The whole search space was explored and no complete filling
    /// satisfies the constraints. Relaxing constraints may help.
    #[error("no complete filling satisfies the constraints")]
    Infeasible,
    /// The iteration budget ran out before any candidate was found and
    /// before the search space was exhausted. A larger budget may help.
    #[error("iteration budget of {budget} exhausted before any candidate was found")]
    BudgetExceeded {
        /// The budget that was exhausted.
        budget: u64,
    },
}

/// Tuning knobs for one generation run.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Stop after collecting this many candidates.
    pub max_candidates: usize,
    /// Hard cap on recursive search invocations; guarantees termination
    /// without external cancellation.
    pub iteration_budget: u64,
    /// Exclusive upper bound on a teacher's total load per date.
    pub daily_cap: u32,
    /// Fixed seed for reproducible output; `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            max_candidates: 3,
            iteration_budget: 5_000_000,
            daily_cap: 4,
            seed: None,
        }
    }
}

impl GenerateConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the candidate count to collect.
    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    /// Sets the iteration budget.
    pub fn with_iteration_budget(mut self, iteration_budget: u64) -> Self {
        self.iteration_budget = iteration_budget;
        self
    }

    /// Sets the daily workload cap.
    pub fn with_daily_cap(mut self, daily_cap: u32) -> Self {
        self.daily_cap = daily_cap;
        self
    }

    /// Fixes the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// One fully-filled grid proposal.
///
/// Carries the complete cell map; fixed and locked cells pass through
/// unchanged. Committed to the project only via
/// [`Project::apply_candidate`](crate::models::Project::apply_candidate).
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// The complete cell map for the grid.
    pub cells: HashMap<CellKey, Assignment>,
}

/// Generates up to `config.max_candidates` complete fillings of the
/// grid's empty cells.
///
/// Targets are the unlocked cells missing a subject or a teacher; a
/// half-filled cell is regenerated wholesale. Locked cells are never
/// touched, complete cells are kept as fixed context.
///
/// Returns `Ok` with 1..=max candidates, or an error explaining why none
/// were found (infeasible vs. budget exhausted — distinct so callers can
/// suggest relaxing constraints vs. retrying with a larger budget).
pub fn generate(
    project: &Project,
    grid_id: GridId,
    config: &GenerateConfig,
) -> Result<Vec<Candidate>, GenerateError> {
    let grid = project
        .grid(grid_id)
        .ok_or(GenerateError::UnknownGrid(grid_id))?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    // Targets: unlocked, incomplete, in canonical order before shuffling.
    let mut targets: Vec<Target> = grid
        .config
        .cells_in_canonical_order()
        .filter(|cell| {
            let assignment = grid.assignment(cell);
            !assignment.is_some_and(|a| a.locked)
                && !assignment.is_some_and(Assignment::is_complete)
        })
        .map(|cell| Target {
            cell,
            date: grid.config.dates[cell.date()].clone(),
            period: grid.config.periods[cell.period()].clone(),
            class: grid.config.classes[cell.class].clone(),
        })
        .collect();
    targets.shuffle(&mut rng);

    // Working copy without target entries: a half-filled target is
    // rebuilt from scratch, so its old fields must not count anywhere.
    let mut cells = grid.cells.clone();
    for target in &targets {
        cells.remove(&target.cell);
    }

    // Per-class quota usage from the fixed cells of the active grid.
    let mut quota_used: Vec<HashMap<String, u32>> =
        vec![HashMap::new(); grid.config.classes.len()];
    for (cell, assignment) in &cells {
        if let Some(subject) = assignment.subject.as_deref() {
            if let Some(per_class) = quota_used.get_mut(cell.class) {
                *per_class.entry(subject.to_string()).or_insert(0) += 1;
            }
        }
    }

    // Label-keyed occupancy and daily load across the whole project:
    // committed cells of every grid (minus this grid's targets, already
    // removed from the working copy) plus the external baseline.
    let mut slot_busy: HashMap<(String, String, String), u32> = HashMap::new();
    let mut day_load: HashMap<(String, String), u32> = HashMap::new();
    for (date, per_teacher) in &project.external_counts {
        for (teacher, &baseline) in per_teacher {
            day_load.insert((date.clone(), teacher.clone()), baseline);
        }
    }
    for g in &project.grids {
        let committed = if g.id == grid_id { &cells } else { &g.cells };
        for (cell, assignment) in committed {
            let Some(teacher) = assignment.teacher.as_deref() else {
                continue;
            };
            let (Some(date), Some(period)) = (
                g.config.date_label(cell.slot),
                g.config.period_label(cell.slot),
            ) else {
                continue;
            };
            *slot_busy
                .entry((date.to_string(), period.to_string(), teacher.to_string()))
                .or_insert(0) += 1;
            *day_load
                .entry((date.to_string(), teacher.to_string()))
                .or_insert(0) += 1;
        }
    }

    debug!(
        targets = targets.len(),
        budget = config.iteration_budget,
        max_candidates = config.max_candidates,
        "starting timetable search"
    );

    let mut search = Search {
        config: &grid.config,
        teachers: &project.teachers,
        targets,
        cells,
        quota_used,
        slot_busy,
        day_load,
        daily_cap: config.daily_cap,
        budget: config.iteration_budget,
        iterations: 0,
        budget_hit: false,
        want: config.max_candidates,
        found: Vec::new(),
        rng,
    };
    search.solve(0);

    debug!(
        iterations = search.iterations,
        found = search.found.len(),
        budget_hit = search.budget_hit,
        "timetable search finished"
    );

    if search.found.is_empty() {
        if search.budget_hit {
            Err(GenerateError::BudgetExceeded {
                budget: config.iteration_budget,
            })
        } else {
            Err(GenerateError::Infeasible)
        }
    } else {
        Ok(search
            .found
            .into_iter()
            .map(|cells| Candidate { cells })
            .collect())
    }
}

/// A cell to fill, with its labels pre-resolved.
struct Target {
    cell: CellKey,
    date: String,
    period: String,
    class: String,
}

/// Search state private to one `generate` invocation.
struct Search<'a> {
    config: &'a GridConfig,
    teachers: &'a [Teacher],
    targets: Vec<Target>,
    cells: HashMap<CellKey, Assignment>,
    quota_used: Vec<HashMap<String, u32>>,
    slot_busy: HashMap<(String, String, String), u32>,
    day_load: HashMap<(String, String), u32>,
    daily_cap: u32,
    budget: u64,
    iterations: u64,
    budget_hit: bool,
    want: usize,
    found: Vec<HashMap<CellKey, Assignment>>,
    rng: StdRng,
}

impl Search<'_> {
    fn done(&self) -> bool {
        self.budget_hit || self.found.len() >= self.want
    }

    fn solve(&mut self, index: usize) {
        self.iterations += 1;
        if self.iterations > self.budget {
            self.budget_hit = true;
            return;
        }
        if index >= self.targets.len() {
            trace!(candidate = self.found.len() + 1, "complete filling found");
            self.found.push(self.cells.clone());
            return;
        }

        let cell = self.targets[index].cell;
        for subject in self.ordered_subjects(cell.class) {
            let used = self.quota_used[cell.class]
                .get(&subject)
                .copied()
                .unwrap_or(0);
            if used >= self.config.quota(&subject) {
                continue;
            }
            if self.subject_taken_that_day(&cell, &subject) {
                continue;
            }

            for teacher in self.eligible_teachers(index, &subject) {
                self.place(index, &subject, &teacher);
                self.solve(index + 1);
                self.unplace(index, &subject, &teacher);
                if self.done() {
                    return;
                }
            }
        }
    }

    /// Subjects by largest remaining quota deficit for the class, ties in
    /// random order (shuffle first, then a stable sort).
    fn ordered_subjects(&mut self, class: usize) -> Vec<String> {
        let mut subjects = self.config.subjects.clone();
        subjects.shuffle(&mut self.rng);
        subjects.sort_by_key(|s| {
            let used = self.quota_used[class].get(s).copied().unwrap_or(0);
            Reverse(self.config.quota(s) as i64 - used as i64)
        });
        subjects
    }

    /// Whether the class already holds the subject in any period of the
    /// cell's date, among fixed cells and tentative placements.
    fn subject_taken_that_day(&self, cell: &CellKey, subject: &str) -> bool {
        (0..self.config.periods.len()).any(|p| {
            self.cells
                .get(&CellKey::new(cell.date(), p, cell.class))
                .and_then(|a| a.subject.as_deref())
                .is_some_and(|s| s == subject)
        })
    }

    /// Teacher names passing the availability, occupancy, and workload
    /// filters for one target, in random order.
    fn eligible_teachers(&mut self, index: usize, subject: &str) -> Vec<String> {
        let target = &self.targets[index];
        let mut names: Vec<String> = self
            .teachers
            .iter()
            .filter(|t| {
                t.teaches(subject)
                    && !t.blocks_slot(&target.date, &target.period)
                    && !t.blocks_class(&target.class)
                    && !self.slot_occupied(&target.date, &target.period, &t.name)
                    && self.load_of(&target.date, &t.name) + 1 < self.daily_cap
            })
            .map(|t| t.name.clone())
            .collect();
        names.shuffle(&mut self.rng);
        names
    }

    fn slot_occupied(&self, date: &str, period: &str, teacher: &str) -> bool {
        self.slot_busy
            .get(&(date.to_string(), period.to_string(), teacher.to_string()))
            .is_some_and(|&n| n > 0)
    }

    fn load_of(&self, date: &str, teacher: &str) -> u32 {
        self.day_load
            .get(&(date.to_string(), teacher.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn place(&mut self, index: usize, subject: &str, teacher: &str) {
        let target = &self.targets[index];
        self.cells
            .insert(target.cell, Assignment::new(subject, teacher));
        *self.quota_used[target.cell.class]
            .entry(subject.to_string())
            .or_insert(0) += 1;
        *self
            .slot_busy
            .entry((target.date.clone(), target.period.clone(), teacher.to_string()))
            .or_insert(0) += 1;
        *self
            .day_load
            .entry((target.date.clone(), teacher.to_string()))
            .or_insert(0) += 1;
    }

    fn unplace(&mut self, index: usize, subject: &str, teacher: &str) {
        let target = &self.targets[index];
        self.cells.remove(&target.cell);
        if let Some(n) = self.quota_used[target.cell.class].get_mut(subject) {
            *n -= 1;
        }
        if let Some(n) = self.slot_busy.get_mut(&(
            target.date.clone(),
            target.period.clone(),
            teacher.to_string(),
        )) {
            *n -= 1;
        }
        if let Some(n) = self
            .day_load
            .get_mut(&(target.date.clone(), teacher.to_string()))
        {
            *n -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::models::{Grid, GridConfig, Project, Teacher};

    fn two_period_project() -> Project {
        let config = GridConfig::new(
            vec!["D1".into()],
            vec!["P1".into(), "P2".into()],
            vec!["C1".into()],
            vec!["Math".into(), "English".into()],
        )
        .with_quota("Math", 1)
        .with_quota("English", 1);

        let mut project = Project::new()
            .with_teacher(Teacher::new("Alice").with_subject("Math"))
            .with_teacher(Teacher::new("Bob").with_subject("English"));
        project.grids.push(Grid::new(GridId(1), "winter", config));
        project
    }

    fn subject_teacher(candidate: &Candidate, cell: CellKey) -> (String, String) {
        let a = &candidate.cells[&cell];
        (
            a.subject.clone().unwrap(),
            a.teacher.clone().unwrap(),
        )
    }

    #[test]
    fn test_fills_both_cells_meeting_quotas_exactly() {
        let project = two_period_project();
        let config = GenerateConfig::new().with_max_candidates(1).with_seed(42);

        let candidates = generate(&project, GridId(1), &config).unwrap();
        assert_eq!(candidates.len(), 1);

        let first = subject_teacher(&candidates[0], CellKey::new(0, 0, 0));
        let second = subject_teacher(&candidates[0], CellKey::new(0, 1, 0));
        let mut pair = vec![first, second];
        pair.sort();
        assert_eq!(
            pair,
            vec![
                ("English".to_string(), "Bob".to_string()),
                ("Math".to_string(), "Alice".to_string()),
            ]
        );
    }

    #[test]
    fn test_ng_slot_forces_the_only_arrangement() {
        let mut project = two_period_project();
        project.teachers[0] = Teacher::new("Alice")
            .with_subject("Math")
            .with_ng_slot("D1", "P1");

        // Only feasible layout: English/Bob at P1, Math/Alice at P2.
        for seed in 0..20 {
            let config = GenerateConfig::new().with_max_candidates(1).with_seed(seed);
            let candidates = generate(&project, GridId(1), &config).unwrap();
            assert_eq!(
                subject_teacher(&candidates[0], CellKey::new(0, 0, 0)),
                ("English".to_string(), "Bob".to_string())
            );
            assert_eq!(
                subject_teacher(&candidates[0], CellKey::new(0, 1, 0)),
                ("Math".to_string(), "Alice".to_string())
            );
        }
    }

    #[test]
    fn test_ng_class_blocks_a_teacher() {
        let mut project = two_period_project();
        project.teachers[0] = Teacher::new("Alice")
            .with_subject("Math")
            .with_ng_class("C1");

        // No one else teaches Math, so C1's Math cell cannot be filled.
        let config = GenerateConfig::new().with_seed(1);
        assert_eq!(
            generate(&project, GridId(1), &config),
            Err(GenerateError::Infeasible)
        );
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        let project = {
            let mut p = two_period_project();
            // More room for variation: second class, more teachers.
            p.grids[0].config.classes.push("C2".into());
            p.teachers.push(Teacher::new("Carol").with_subject("Math"));
            p.teachers.push(Teacher::new("Dave").with_subject("English"));
            p
        };

        let config = GenerateConfig::new().with_seed(7);
        let first = generate(&project, GridId(1), &config).unwrap();
        let second = generate(&project, GridId(1), &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_locked_cells_pass_through_untouched() {
        let mut project = two_period_project();
        let locked = Assignment {
            subject: Some("Math".into()),
            teacher: None,
            locked: true,
        };
        project.grids[0].put(CellKey::new(0, 0, 0), locked.clone());

        let config = GenerateConfig::new().with_max_candidates(1).with_seed(3);
        let candidates = generate(&project, GridId(1), &config).unwrap();
        // The locked half-filled cell is not a target and is not repaired.
        assert_eq!(candidates[0].cells[&CellKey::new(0, 0, 0)], locked);
        assert!(candidates[0].cells[&CellKey::new(0, 1, 0)].is_complete());
    }

    #[test]
    fn test_respects_cross_grid_occupancy() {
        let mut project = two_period_project();
        // Alice already committed at D1/P1 and D1/P2 in another grid.
        let other_config = GridConfig::new(
            vec!["D1".into()],
            vec!["P1".into(), "P2".into()],
            vec!["X1".into()],
            vec!["Math".into()],
        )
        .with_quota("Math", 2);
        let mut other = Grid::new(GridId(2), "evening", other_config);
        other.put(CellKey::new(0, 0, 0), Assignment::new("Math", "Alice"));
        other.put(CellKey::new(0, 1, 0), Assignment::new("Math", "Alice"));
        project.grids.push(other);

        // Alice is the only Math teacher and is busy both periods.
        let config = GenerateConfig::new().with_seed(5);
        assert_eq!(
            generate(&project, GridId(1), &config),
            Err(GenerateError::Infeasible)
        );
    }

    #[test]
    fn test_daily_cap_counts_external_baseline() {
        // Cap 2 means a teacher's day may not reach 2; Alice starts at 1.
        let project = two_period_project().with_external_load("D1", "Alice", 1);
        let config = GenerateConfig::new().with_daily_cap(2).with_seed(9);
        assert_eq!(
            generate(&project, GridId(1), &config),
            Err(GenerateError::Infeasible)
        );

        // A roomier cap admits the same problem.
        let config = GenerateConfig::new().with_daily_cap(3).with_seed(9);
        assert!(generate(&project, GridId(1), &config).is_ok());
    }

    #[test]
    fn test_budget_exhaustion_is_distinct_from_infeasibility() {
        let project = two_period_project();
        let config = GenerateConfig::new().with_iteration_budget(0).with_seed(0);
        assert_eq!(
            generate(&project, GridId(1), &config),
            Err(GenerateError::BudgetExceeded { budget: 0 })
        );
    }

    #[test]
    fn test_unknown_grid() {
        let project = two_period_project();
        let config = GenerateConfig::new();
        assert_eq!(
            generate(&project, GridId(42), &config),
            Err(GenerateError::UnknownGrid(GridId(42)))
        );
    }

    #[test]
    fn test_candidates_satisfy_every_hard_constraint() {
        // Two classes, two dates, several teachers; ask for 3 candidates
        // and check each one against the analyzer and the quotas.
        let config = GridConfig::new(
            vec!["D1".into(), "D2".into()],
            vec!["P1".into(), "P2".into()],
            vec!["C1".into(), "C2".into()],
            vec!["Math".into(), "English".into()],
        )
        .with_quota("Math", 2)
        .with_quota("English", 2);

        let mut project = Project::new()
            .with_teacher(Teacher::new("Alice").with_subject("Math"))
            .with_teacher(Teacher::new("Carol").with_subject("Math"))
            .with_teacher(Teacher::new("Bob").with_subject("English"))
            .with_teacher(Teacher::new("Dave").with_subject("English"));
        project.grids.push(Grid::new(GridId(1), "winter", config));

        let gen_config = GenerateConfig::new().with_max_candidates(3).with_seed(11);
        let candidates = generate(&project, GridId(1), &gen_config).unwrap();
        assert!(!candidates.is_empty());
        assert!(candidates.len() <= 3);

        for candidate in &candidates {
            let applied = project.apply_candidate(GridId(1), candidate);
            let grid = applied.grid(GridId(1)).unwrap();

            // Complete fill.
            for cell in grid.config.cells_in_canonical_order() {
                assert!(grid.assignment(&cell).is_some_and(Assignment::is_complete));
            }

            let analysis = analyze(&applied, GridId(1));
            assert!(analysis.conflicts.is_empty());
            // No same-day repeats, no quota overflow.
            assert!(analysis.daily_subject_count.values().all(|&n| n == 1));
            assert!(analysis.overflow_cells(grid).is_empty());
            // Subject/teacher compatibility.
            for (_, assignment) in grid.filled_cells() {
                let subject = assignment.subject.as_deref().unwrap();
                let teacher = applied.teacher(assignment.teacher.as_deref().unwrap());
                assert!(teacher.is_some_and(|t| t.teaches(subject)));
            }
        }
    }

    #[test]
    fn test_half_filled_cells_are_regenerated_wholesale() {
        let mut project = two_period_project();
        // Subject set, no teacher: still a target, and its tentative
        // subject must not pin the search.
        project.grids[0].put(
            CellKey::new(0, 0, 0),
            Assignment {
                subject: Some("English".into()),
                teacher: None,
                locked: false,
            },
        );

        let config = GenerateConfig::new().with_max_candidates(1).with_seed(2);
        let candidates = generate(&project, GridId(1), &config).unwrap();
        for cell in [CellKey::new(0, 0, 0), CellKey::new(0, 1, 0)] {
            assert!(candidates[0].cells[&cell].is_complete());
        }
    }

    #[test]
    fn test_already_complete_grid_yields_its_own_filling() {
        let mut project = two_period_project();
        project.grids[0].put(CellKey::new(0, 0, 0), Assignment::new("Math", "Alice"));
        project.grids[0].put(CellKey::new(0, 1, 0), Assignment::new("English", "Bob"));

        let config = GenerateConfig::new().with_max_candidates(1).with_seed(0);
        let candidates = generate(&project, GridId(1), &config).unwrap();
        assert_eq!(candidates[0].cells, project.grids[0].cells);
    }
}
