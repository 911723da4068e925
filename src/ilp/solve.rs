//! Invokes the pure-Rust `microlp` backend on the model from
//! [`super::builder`] and turns its solution back into task start/finish
//! ticks.

use good_lp::{Solution, SolverModel};

use crate::error::SolverError;
use crate::ilp::builder::{self, IlpModel};
use crate::model::SchedulingProblem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSchedule {
    pub task_id: String,
    pub start: u64,
    pub finish: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSolution {
    pub makespan: u64,
    pub tasks: Vec<TaskSchedule>,
}

/// Solve the reference ILP for `problem`, returning the optimal makespan
/// and a start/finish tick for every task.
pub fn solve(problem: &SchedulingProblem) -> Result<ReferenceSolution, SolverError> {
    let IlpModel {
        vars,
        xs,
        makespan,
        objective,
        constraints,
        ..
    } = builder::build(problem);

    let mut model = vars.minimise(objective).using(good_lp::microlp);
    for constraint in constraints {
        model = model.with(constraint);
    }

    let solution = model.solve().map_err(map_resolution_error)?;

    let mut tasks = Vec::new();
    for op in &problem.operators {
        for task in &op.tasks {
            let start = (0..problem.time_limit)
                .find(|t| solution.value(xs[&(task.id.clone(), *t)]) > 0.5)
                .unwrap_or(0);
            let finish = start + task.duration as u64 - 1;
            tasks.push(TaskSchedule {
                task_id: task.id.clone(),
                start,
                finish,
            });
        }
    }

    let reported_makespan = solution.value(makespan).round() as u64;
    Ok(ReferenceSolution {
        makespan: reported_makespan,
        tasks,
    })
}

fn map_resolution_error(err: good_lp::ResolutionError) -> SolverError {
    match err {
        good_lp::ResolutionError::Infeasible => SolverError::Infeasible,
        good_lp::ResolutionError::Unbounded => SolverError::Unbounded,
        other => SolverError::Backend(other.to_string()),
    }
}
