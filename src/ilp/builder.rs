//! Builds the mixed-integer program that mirrors the simulator's own
//! constraints, so [`crate::ilp::solve`]'s result is a valid lower bound on
//! any policy's makespan rather than an independent heuristic.
//!
//! Unlike the per-slot table in the original source, slots here are
//! modeled as an interchangeable resource pool (capacity `S`), since
//! nothing in the problem model distinguishes one slot from another — only
//! how many are occupied at a tick matters. This collapses the original's
//! `schedule[(i,j,t)]` table into a single `x[(i,t)]` per task per tick,
//! without changing the feasible region.

use std::collections::HashMap;

use good_lp::{variable, Expression, ProblemVariables, Variable};

use crate::model::SchedulingProblem;

/// Decision variables and the textual constraint ledger used for
/// [`crate::ilp::IlpModel::to_lp_string`].
pub struct IlpModel {
    pub vars: ProblemVariables,
    /// `xs[(task_id, t)]`: 1 if the task starts at tick `t`.
    pub xs: HashMap<(String, u64), Variable>,
    /// `x[(task_id, t)]`: 1 if the task occupies a slot during tick `t`.
    pub x: HashMap<(String, u64), Variable>,
    /// `buf[(operator_idx, t)]`: operator `operator_idx`'s output buffer
    /// level entering tick `t`. Only built for non-terminal operators.
    pub buf: HashMap<(usize, u64), Variable>,
    /// Makespan variable: an upper bound on every task's finish tick.
    pub makespan: Variable,
    pub objective: Expression,
    pub constraints: Vec<good_lp::Constraint>,
    lp_lines: Vec<String>,
}

impl IlpModel {
    /// A plain-text dump of the model built alongside the real
    /// constraints, in lieu of a vendor-specific LP-format writer.
    pub fn to_lp_string(&self) -> String {
        let mut out = String::from("minimize\n  makespan\nsubject to\n");
        for line in &self.lp_lines {
            out.push_str("  ");
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("end\n");
        out
    }
}

/// Build the full model for `problem`. Every constraint named in
/// spec.md §4.3 is present, including the buffer recurrence the original
/// source had commented out.
pub fn build(problem: &SchedulingProblem) -> IlpModel {
    let mut vars = ProblemVariables::new();
    let mut xs = HashMap::new();
    let mut x = HashMap::new();
    let mut buf = HashMap::new();
    let mut lp_lines = Vec::new();
    let mut constraints = Vec::new();

    let t_max = problem.time_limit;
    let all_tasks: Vec<_> = problem
        .operators
        .iter()
        .flat_map(|op| op.tasks.iter())
        .collect();

    for task in &all_tasks {
        for t in 0..t_max {
            xs.insert((task.id.clone(), t), vars.add(variable().binary()));
            x.insert((task.id.clone(), t), vars.add(variable().binary()));
        }
    }
    for k in 0..problem.num_operators().saturating_sub(1) {
        for t in 0..t_max {
            buf.insert(
                (k, t),
                vars.add(variable().integer().min(0.0).max(problem.buffer_size_limit as f64)),
            );
        }
    }
    let makespan = vars.add(variable().min(0.0));

    // Each task starts exactly once.
    for task in &all_tasks {
        let expr: Expression = (0..t_max).map(|t| xs[&(task.id.clone(), t)]).sum();
        constraints.push(good_lp::constraint!(expr == 1.0));
        lp_lines.push(format!("start_once[{}]: {} = 1", task.id, describe_sum(&task.id, t_max, "xs")));
    }

    // Occupation at tick t iff the task started within the preceding
    // `duration` ticks: x[i,t] == sum of xs[i, t'] for t' in the window.
    for task in &all_tasks {
        for t in 0..t_max {
            let window_start = t.saturating_sub(task.duration as u64 - 1);
            let window: Expression = (window_start..=t)
                .filter_map(|ts| xs.get(&(task.id.clone(), ts)))
                .copied()
                .sum();
            let occ = x[&(task.id.clone(), t)];
            constraints.push(good_lp::constraint!(occ - window == 0.0));
            lp_lines.push(format!("occupation[{},{}]: x - window(xs) = 0", task.id, t));
        }
    }

    // Slot capacity: total CPUs in use at any tick never exceeds S.
    for t in 0..t_max {
        let usage: Expression = all_tasks
            .iter()
            .map(|task| x[&(task.id.clone(), t)] * task.num_cpus as f64)
            .sum();
        constraints.push(good_lp::constraint!(usage <= problem.num_execution_slots as f64));
        lp_lines.push(format!("capacity[{t}]: sum(num_cpus * x) <= {}", problem.num_execution_slots));
    }

    // Buffer recurrence (restored — the original commented this out).
    //
    // `buf[k,t]` is the buffer level a task at operator k+1 sees when it is
    // admitted at tick t — i.e. the value *after* this tick's retirements
    // land, matching the simulator's retire-before-admit ordering. A task
    // that starts at `s` and runs `d` ticks frees its output at tick `s+d`,
    // so: buf[k,0] = finishing(k,0), and for t >= 1,
    // buf[k,t] = buf[k,t-1] - admitted(k+1,t-1) + finishing(k,t).
    for k in 0..problem.num_operators().saturating_sub(1) {
        let producer = &problem.operators[k];
        let consumer = &problem.operators[k + 1];
        let finishing_at = |t: u64| -> Expression {
            producer
                .tasks
                .iter()
                .filter_map(|task| {
                    let start = t.checked_sub(task.duration as u64)?;
                    xs.get(&(task.id.clone(), start)).map(|&v| v * task.output_size as f64)
                })
                .sum()
        };
        let admitted_at = |t: u64| -> Expression {
            consumer
                .tasks
                .iter()
                .map(|task| xs[&(task.id.clone(), t)] * task.input_size as f64)
                .sum()
        };

        let b0 = buf[&(k, 0)];
        constraints.push(good_lp::constraint!(b0 - finishing_at(0) == 0.0));
        lp_lines.push(format!("buffer_init[{k}]"));

        for t in 1..t_max {
            let now = buf[&(k, t)];
            let prev = buf[&(k, t - 1)];
            constraints.push(good_lp::constraint!(
                now - prev + admitted_at(t - 1) - finishing_at(t) == 0.0
            ));
            lp_lines.push(format!("buffer_recurrence[{k},{t}]"));
        }

        // A tick's admissions can never draw more than that tick's
        // already-landed buffer — the recurrence alone would let an
        // admission borrow against output that only lands next tick.
        for t in 0..t_max {
            let now = buf[&(k, t)];
            constraints.push(good_lp::constraint!(admitted_at(t) - now <= 0.0));
            lp_lines.push(format!("buffer_available[{k},{t}]"));
        }
    }

    // Makespan bound: L >= finish tick of every task.
    for task in &all_tasks {
        let start: Expression = (0..t_max)
            .map(|t| xs[&(task.id.clone(), t)] * t as f64)
            .sum();
        let finish = start + (task.duration as f64 - 1.0);
        constraints.push(good_lp::constraint!(makespan - finish >= 0.0));
        lp_lines.push(format!("makespan_bound[{}]", task.id));
    }

    IlpModel {
        vars,
        xs,
        x,
        buf,
        makespan,
        objective: makespan.into(),
        constraints,
        lp_lines,
    }
}

fn describe_sum(task_id: &str, t_max: u64, prefix: &str) -> String {
    (0..t_max)
        .map(|t| format!("{prefix}_{task_id}_{t}"))
        .collect::<Vec<_>>()
        .join(" + ")
}
