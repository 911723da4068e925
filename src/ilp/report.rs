//! ASCII schedule grid for the reference solution, laid out the same way as
//! [`crate::environment::ExecutionEnvironment::print_timeline`] (one column
//! per tick) so a policy's timeline and the ILP's optimum can be compared by
//! eye — but one row per *operator*, not per slot, since the ILP has no
//! per-slot variable to report against (slots are modeled as an
//! interchangeable capacity pool, see `DESIGN.md`).

use crate::config::{IDLE_MARKER, TIMELINE_COLUMN_WIDTH};
use crate::ilp::solve::ReferenceSolution;
use crate::model::SchedulingProblem;

/// Render one row per operator, one column per tick, cell = the id of
/// whichever task of that operator is running (blank if several tasks of
/// the same operator overlap, since the reference solution has no notion
/// of a specific slot).
pub fn report_grid(problem: &SchedulingProblem, solution: &ReferenceSolution) -> String {
    let mut out = String::new();
    for op in &problem.operators {
        out.push_str(&format!("{:>10} | ", op.name));
        for t in 0..problem.time_limit {
            let running: Vec<&str> = solution
                .tasks
                .iter()
                .filter(|s| op.tasks.iter().any(|task| task.id == s.task_id))
                .filter(|s| s.start <= t && t <= s.finish)
                .map(|s| s.task_id.as_str())
                .collect();
            let cell = match running.as_slice() {
                [] => IDLE_MARKER,
                [one] => one,
                _ => "*",
            };
            out.push_str(&format!("{cell:<width$}", width = TIMELINE_COLUMN_WIDTH));
        }
        out.push('\n');
    }
    out.push_str(&format!("makespan: {}\n", solution.makespan));
    out
}
