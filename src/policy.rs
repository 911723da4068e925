//! # Scheduling policies
//!
//! A [`SchedulingPolicy`] looks at a read-only [`EnvironmentSnapshot`] and
//! proposes zero or more [`Admission`]s for the current tick. It never
//! mutates anything — [`crate::environment::ExecutionEnvironment::tick`]
//! re-validates and applies each admission itself, so a policy that
//! proposes something infeasible just has that admission dropped.
//!
//! Four policies are provided, differing in which operator's pending tasks
//! they scan first and how far ahead they look before admitting a task that
//! produces output:
//!
//! - [`Greedy`] admits whatever fits, scanning the most upstream operator
//!   with pending work first — it does not consult buffers at all, so it
//!   keeps feeding producers even once downstream buffers are full.
//! - [`GreedyWithBuffer`] same upstream-first scan, plus it refuses to admit
//!   a task whose output would overflow its own output buffer.
//! - [`GreedyAndAnticipating`] flips the scan to most-downstream-first, so
//!   pipeline work already runnable drains before new input is pulled in,
//!   and also reserves buffer headroom for output already in flight
//!   upstream.
//! - [`RatesEqualizing`] orders operators by how full their output buffer
//!   currently is, favoring whichever stage is most starved.

use crate::environment::EnvironmentSnapshot;
use crate::model::{SchedulingProblem, TaskSpec};

/// A policy's proposal to start a specific pending task on a specific idle
/// slot at the current tick. `slot` only needs to name one idle slot the
/// policy observed — if the task needs more than one CPU, the environment
/// fills in additional idle slots itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub task_id: String,
    pub slot: usize,
}

/// Implemented by every admission-control strategy. Stateless by
/// convention: all decision state lives in the `snapshot` passed in, so a
/// `Box<dyn SchedulingPolicy>` can be swapped freely between runs.
pub trait SchedulingPolicy: Send {
    fn propose(&self, snapshot: &EnvironmentSnapshot, problem: &SchedulingProblem) -> Vec<Admission>;
    fn name(&self) -> &'static str;
}

/// Shared bookkeeping while scanning candidate tasks within a single
/// `propose` call: slots and buffers mutate locally as admissions are
/// tentatively chosen, so the same slot or buffer row is never proposed
/// twice for the same tick.
struct Ledger {
    idle: Vec<usize>,
    buffers: Vec<u64>,
}

impl Ledger {
    fn new(snapshot: &EnvironmentSnapshot) -> Self {
        Self {
            idle: snapshot.idle_slots().collect(),
            buffers: snapshot.buffers.clone(),
        }
    }

    fn upstream(&self, task: &TaskSpec) -> u64 {
        if task.operator_idx == 0 {
            u64::MAX
        } else {
            self.buffers[task.operator_idx - 1]
        }
    }

    /// Reserve slots and debit the upstream buffer for `task`, returning
    /// the admission if there was enough of both.
    fn try_take(&mut self, task: &TaskSpec) -> Option<Admission> {
        let need = task.num_cpus as usize;
        if self.idle.len() < need {
            return None;
        }
        if self.upstream(task) < task.input_size {
            return None;
        }
        let slot = self.idle[0];
        self.idle.drain(0..need);
        if task.operator_idx > 0 {
            self.buffers[task.operator_idx - 1] -= task.input_size;
        }
        Some(Admission {
            task_id: task.id.clone(),
            slot,
        })
    }
}

fn pending_downstream_first<'a>(
    snapshot: &'a EnvironmentSnapshot,
    problem: &'a SchedulingProblem,
) -> impl Iterator<Item = &'a TaskSpec> {
    problem
        .tasks_downstream_first()
        .into_iter()
        .filter(move |t| snapshot.is_pending(&t.id))
}

/// The first pending task of the most upstream operator that still has
/// pending tasks, then the next such task, and so on — natural operator
/// order, the opposite scan direction of [`pending_downstream_first`].
fn pending_upstream_first<'a>(
    snapshot: &'a EnvironmentSnapshot,
    problem: &'a SchedulingProblem,
) -> impl Iterator<Item = &'a TaskSpec> {
    problem
        .operators
        .iter()
        .flat_map(|op| op.tasks.iter())
        .filter(move |t| snapshot.is_pending(&t.id))
}

// ---------------------------------------------------------------------------
// Greedy
// ---------------------------------------------------------------------------

/// Admit any pending task that fits, scanning the most upstream operator
/// with pending work first. Never consults buffers — the baseline that
/// floods the pipeline with producers and starves once a downstream buffer
/// fills up.
pub struct Greedy;

impl SchedulingPolicy for Greedy {
    fn propose(&self, snapshot: &EnvironmentSnapshot, problem: &SchedulingProblem) -> Vec<Admission> {
        let mut ledger = Ledger::new(snapshot);
        let mut admissions = Vec::new();
        for task in pending_upstream_first(snapshot, problem) {
            if ledger.idle.is_empty() {
                break;
            }
            if let Some(admission) = ledger.try_take(task) {
                admissions.push(admission);
            }
        }
        admissions
    }

    fn name(&self) -> &'static str {
        "greedy"
    }
}

// ---------------------------------------------------------------------------
// GreedyWithBuffer
// ---------------------------------------------------------------------------

/// [`Greedy`]'s upstream-first scan, plus a task is only admitted if its own
/// output would not overflow `buffer_size_limit` once it finishes.
pub struct GreedyWithBuffer;

impl SchedulingPolicy for GreedyWithBuffer {
    fn propose(&self, snapshot: &EnvironmentSnapshot, problem: &SchedulingProblem) -> Vec<Admission> {
        let mut ledger = Ledger::new(snapshot);
        let mut admissions = Vec::new();
        for task in pending_upstream_first(snapshot, problem) {
            if ledger.idle.is_empty() {
                break;
            }
            if task.output_size > 0 {
                let projected = ledger.buffers[task.operator_idx] + task.output_size;
                if projected > problem.buffer_size_limit {
                    continue;
                }
            }
            if let Some(admission) = ledger.try_take(task) {
                ledger.buffers[task.operator_idx] += task.output_size;
                admissions.push(admission);
            }
        }
        admissions
    }

    fn name(&self) -> &'static str {
        "greedy_with_buffer"
    }
}

// ---------------------------------------------------------------------------
// GreedyAndAnticipating
// ---------------------------------------------------------------------------

/// [`GreedyWithBuffer`], plus the projected buffer check also counts output
/// still in flight from tasks that are already running at or upstream of
/// the candidate's operator — output that hasn't landed yet but will
/// before anything downstream could drain it.
pub struct GreedyAndAnticipating;

impl GreedyAndAnticipating {
    fn in_flight_output(snapshot: &EnvironmentSnapshot, problem: &SchedulingProblem, operator_idx: usize) -> u64 {
        problem
            .operator(operator_idx)
            .map(|op| {
                op.tasks
                    .iter()
                    .filter(|t| matches!(snapshot.task_states.get(&t.id), Some(crate::environment::TaskState::Running)))
                    .map(|t| t.output_size)
                    .sum()
            })
            .unwrap_or(0)
    }
}

impl SchedulingPolicy for GreedyAndAnticipating {
    fn propose(&self, snapshot: &EnvironmentSnapshot, problem: &SchedulingProblem) -> Vec<Admission> {
        let mut ledger = Ledger::new(snapshot);
        let mut admissions = Vec::new();
        for task in pending_downstream_first(snapshot, problem) {
            if ledger.idle.is_empty() {
                break;
            }
            if task.output_size > 0 {
                let in_flight = Self::in_flight_output(snapshot, problem, task.operator_idx);
                let projected = ledger.buffers[task.operator_idx] + in_flight + task.output_size;
                if projected > problem.buffer_size_limit {
                    continue;
                }
            }
            if let Some(admission) = ledger.try_take(task) {
                ledger.buffers[task.operator_idx] += task.output_size;
                admissions.push(admission);
            }
        }
        admissions
    }

    fn name(&self) -> &'static str {
        "greedy_and_anticipating"
    }
}

// ---------------------------------------------------------------------------
// RatesEqualizing
// ---------------------------------------------------------------------------

/// Orders operators by how full their output buffer currently is (as a
/// fraction of `buffer_size_limit`) and admits from the most-starved stage
/// first, so no single buffer in the chain races ahead of the others. The
/// last stage has no output buffer and is always considered most-starved,
/// since draining it frees capacity upstream.
pub struct RatesEqualizing;

impl SchedulingPolicy for RatesEqualizing {
    fn propose(&self, snapshot: &EnvironmentSnapshot, problem: &SchedulingProblem) -> Vec<Admission> {
        let mut ledger = Ledger::new(snapshot);
        let last = problem.num_operators() - 1;

        let mut order: Vec<usize> = (0..problem.num_operators()).collect();
        order.sort_by(|&a, &b| {
            let fill = |op: usize| -> f64 {
                if op == last {
                    -1.0
                } else if problem.buffer_size_limit == 0 {
                    0.0
                } else {
                    snapshot.buffer(op) as f64 / problem.buffer_size_limit as f64
                }
            };
            fill(a).partial_cmp(&fill(b)).unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut admissions = Vec::new();
        for op in order {
            if ledger.idle.is_empty() {
                break;
            }
            let Some(operator) = problem.operator(op) else { continue };
            for task in &operator.tasks {
                if ledger.idle.is_empty() {
                    break;
                }
                if !snapshot.is_pending(&task.id) {
                    continue;
                }
                if task.output_size > 0 {
                    let projected = ledger.buffers[task.operator_idx] + task.output_size;
                    if projected > problem.buffer_size_limit {
                        continue;
                    }
                }
                if let Some(admission) = ledger.try_take(task) {
                    ledger.buffers[task.operator_idx] += task.output_size;
                    admissions.push(admission);
                }
            }
        }
        admissions
    }

    fn name(&self) -> &'static str {
        "rates_equalizing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::ExecutionEnvironment;
    use crate::problems::test_problem;

    fn run_to_completion(policy: Box<dyn SchedulingPolicy>) -> ExecutionEnvironment {
        let problem = test_problem();
        let time_limit = problem.time_limit;
        let mut env = ExecutionEnvironment::new(problem, policy);
        for _ in 0..time_limit {
            env.tick().unwrap();
        }
        env
    }

    #[test]
    fn greedy_does_not_finish_test_problem() {
        // Greedy never consults buffers, so on test_problem (S=4, B=4) it
        // floods producers until the buffer is saturated and consumers
        // starve for input — not every task finishes by time_limit.
        let env = run_to_completion(Box::new(Greedy));
        assert!(!env.check_all_tasks_finished());
    }

    #[test]
    fn greedy_with_buffer_finishes_test_problem() {
        let env = run_to_completion(Box::new(GreedyWithBuffer));
        assert!(env.check_all_tasks_finished());
    }

    #[test]
    fn greedy_and_anticipating_finishes_test_problem() {
        let env = run_to_completion(Box::new(GreedyAndAnticipating));
        assert!(env.check_all_tasks_finished());
    }

    #[test]
    fn rates_equalizing_finishes_test_problem() {
        let env = run_to_completion(Box::new(RatesEqualizing));
        assert!(env.check_all_tasks_finished());
    }

    #[test]
    fn greedy_with_buffer_never_overflows_buffer() {
        let problem = test_problem();
        let limit = problem.buffer_size_limit;
        let time_limit = problem.time_limit;
        let mut env = ExecutionEnvironment::new(problem, Box::new(GreedyWithBuffer));
        for _ in 0..time_limit {
            env.tick().unwrap();
            let snap = env.snapshot();
            for &b in &snap.buffers {
                assert!(b <= limit);
            }
        }
    }
}
