//! # Execution environment
//!
//! The simulation state machine: owns the slot table, per-operator buffer
//! counters, per-task status, and the append-only event timeline. Advances
//! one tick at a time via [`ExecutionEnvironment::tick`], in the fixed
//! four-phase order from spec.md §4.1: retire → poll policy → apply
//! admissions → record.
//!
//! Policies never see this struct directly — they receive an
//! [`EnvironmentSnapshot`], a plain owned value, so there is no way for a
//! policy to mutate environment state except through the admissions it
//! returns.

use std::collections::HashMap;

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::config::{IDLE_MARKER, TIMELINE_COLUMN_WIDTH};
use crate::error::SimulationError;
use crate::model::{SchedulingProblem, TaskSpec};
use crate::policy::{Admission, SchedulingPolicy};

// ---------------------------------------------------------------------------
// Task runtime status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    Pending,
    Running,
    Finished,
}

#[derive(Debug, Clone)]
enum TaskStatus {
    Pending,
    Running { start: u64, finish: u64, slots: Vec<usize> },
    Finished,
}

impl TaskStatus {
    fn state(&self) -> TaskState {
        match self {
            TaskStatus::Pending => TaskState::Pending,
            TaskStatus::Running { .. } => TaskState::Running,
            TaskStatus::Finished => TaskState::Finished,
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Read-only, owned view of the environment handed to a policy's
/// `propose`. Never a borrow into live environment state — see spec.md §9
/// "snapshot immutability".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    pub tick: u64,
    /// One entry per slot; `Some(task_id)` if occupied, `None` if idle.
    pub slots: Vec<Option<String>>,
    /// `buffers[k]` = rows resident in operator k's output buffer.
    pub buffers: Vec<u64>,
    pub task_states: HashMap<String, TaskState>,
}

impl EnvironmentSnapshot {
    pub fn is_idle(&self, slot: usize) -> bool {
        self.slots.get(slot).map(|s| s.is_none()).unwrap_or(false)
    }

    pub fn idle_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, occupant)| occupant.is_none())
            .map(|(i, _)| i)
    }

    pub fn buffer(&self, operator_idx: usize) -> u64 {
        self.buffers.get(operator_idx).copied().unwrap_or(0)
    }

    pub fn is_pending(&self, task_id: &str) -> bool {
        matches!(self.task_states.get(task_id), Some(TaskState::Pending))
    }

    /// Rows available upstream of `operator_idx`. The source stage (0) has
    /// no upstream buffer and is treated as unbounded, matching spec.md §3
    /// "`buf[-1]` is implicitly ∞ for the source stage".
    pub fn upstream_available(&self, operator_idx: usize) -> u64 {
        if operator_idx == 0 {
            u64::MAX
        } else {
            self.buffer(operator_idx - 1)
        }
    }
}

// ---------------------------------------------------------------------------
// ExecutionEnvironment
// ---------------------------------------------------------------------------

/// The simulation state machine. Construct once from a problem and a
/// policy, then drive it forward with repeated calls to [`Self::tick`].
pub struct ExecutionEnvironment {
    problem: SchedulingProblem,
    policy: Box<dyn SchedulingPolicy>,
    task_specs: Vec<TaskSpec>,
    task_index: HashMap<String, usize>,
    status: Vec<TaskStatus>,
    slots: Vec<Option<usize>>,
    buffers: Vec<u64>,
    tick_now: u64,
    timeline: Vec<Vec<Option<String>>>,
}

impl ExecutionEnvironment {
    pub fn new(problem: SchedulingProblem, policy: Box<dyn SchedulingPolicy>) -> Self {
        let task_specs: Vec<TaskSpec> = problem
            .operators
            .iter()
            .flat_map(|op| op.tasks.iter().cloned())
            .collect();
        let task_index = task_specs
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();
        let status = task_specs.iter().map(|_| TaskStatus::Pending).collect();
        let num_operators = problem.num_operators();
        let num_slots = problem.num_execution_slots as usize;

        Self {
            task_specs,
            task_index,
            status,
            slots: vec![None; num_slots],
            buffers: vec![0; num_operators],
            tick_now: 0,
            timeline: Vec::new(),
            problem,
            policy,
        }
    }

    pub fn problem(&self) -> &SchedulingProblem {
        &self.problem
    }

    pub fn tick_now(&self) -> u64 {
        self.tick_now
    }

    /// Advance the simulation by exactly one tick.
    ///
    /// Order is fixed (spec.md §4.1): retire finishing tasks, poll the
    /// policy for admissions, apply each feasible admission in priority
    /// order, then record the tick in the timeline.
    pub fn tick(&mut self) -> Result<(), SimulationError> {
        if self.tick_now >= self.problem.time_limit {
            return Err(SimulationError::PastTimeLimit {
                tick: self.tick_now,
                time_limit: self.problem.time_limit,
            });
        }

        self.retire();

        let snapshot = self.snapshot();
        let admissions = self.policy.propose(&snapshot, &self.problem);
        trace!("tick {}: policy proposed {} admissions", self.tick_now, admissions.len());
        for admission in admissions {
            self.try_apply(admission);
        }

        self.record();
        self.tick_now += 1;
        Ok(())
    }

    /// Retire every task whose finish tick is `tick_now`, freeing its
    /// slots and crediting its output to its operator's buffer. Multiple
    /// same-tick retirements are processed most-downstream-operator first,
    /// then ascending task id, so timelines are deterministic across runs
    /// (spec.md §4.1 step 1).
    ///
    /// Crediting is clamped at `buffer_size_limit`: invariant 3 (`0 ≤
    /// buf[k] ≤ B`) must hold unconditionally, including under `Greedy`,
    /// which admits producers without ever consulting buffer occupancy. The
    /// environment is the only place left to enforce the cap in that case,
    /// so rows a buffer has no room for are dropped rather than recorded.
    fn retire(&mut self) {
        let mut finishing: Vec<usize> = self
            .status
            .iter()
            .enumerate()
            .filter_map(|(i, s)| match s {
                TaskStatus::Running { finish, .. } if *finish == self.tick_now => Some(i),
                _ => None,
            })
            .collect();

        finishing.sort_by(|&a, &b| {
            let op_a = self.task_specs[a].operator_idx;
            let op_b = self.task_specs[b].operator_idx;
            op_b.cmp(&op_a).then_with(|| self.task_specs[a].id.cmp(&self.task_specs[b].id))
        });

        for idx in finishing {
            let spec = self.task_specs[idx].clone();
            if let TaskStatus::Running { slots, .. } = &self.status[idx] {
                for &s in slots {
                    self.slots[s] = None;
                }
            }
            let limit = self.problem.buffer_size_limit;
            let credited = self.buffers[spec.operator_idx].saturating_add(spec.output_size);
            let dropped = credited.saturating_sub(limit);
            self.buffers[spec.operator_idx] = credited.min(limit);
            self.status[idx] = TaskStatus::Finished;
            if dropped > 0 {
                warn!(
                    "tick {}: task {} finished, buf[{}] had no room for {} of {} output rows (limit {})",
                    self.tick_now, spec.id, spec.operator_idx, dropped, spec.output_size, limit
                );
            }
            debug!(
                "tick {}: task {} finished, buf[{}] += {} -> {}",
                self.tick_now, spec.id, spec.operator_idx, spec.output_size, self.buffers[spec.operator_idx]
            );
        }
    }

    /// Attempt to apply one policy-proposed admission. Verifies every
    /// precondition from spec.md §4.1 step 3; on any failure the admission
    /// is silently skipped — the environment never propagates an
    /// infeasible-admission error, per spec.md §7.
    fn try_apply(&mut self, admission: Admission) {
        let Some(&idx) = self.task_index.get(&admission.task_id) else {
            return;
        };
        if !matches!(self.status[idx], TaskStatus::Pending) {
            return;
        }
        if !self.slots.get(admission.slot).map(|s| s.is_none()).unwrap_or(false) {
            return;
        }

        let spec = self.task_specs[idx].clone();
        let needed = spec.num_cpus as usize;
        let Some(chosen_slots) = self.idle_slots_from(admission.slot, needed) else {
            return;
        };

        if spec.operator_idx > 0 {
            let upstream = spec.operator_idx - 1;
            if self.buffers[upstream] < spec.input_size {
                return;
            }
            self.buffers[upstream] -= spec.input_size;
        }

        for &s in &chosen_slots {
            self.slots[s] = Some(idx);
        }
        let finish = self.tick_now + spec.duration as u64;
        self.status[idx] = TaskStatus::Running {
            start: self.tick_now,
            finish,
            slots: chosen_slots,
        };
        debug!(
            "tick {}: admitted task {} into slot(s) {:?}, finishes at {}",
            self.tick_now,
            spec.id,
            &self.status[idx],
            finish
        );
    }

    /// Collect `count` idle slots, starting the scan at `start` and
    /// wrapping around. Returns `None` if fewer than `count` are idle —
    /// the caller treats this as an infeasible admission.
    fn idle_slots_from(&self, start: usize, count: usize) -> Option<Vec<usize>> {
        if count == 0 || count > self.slots.len() {
            return None;
        }
        let n = self.slots.len();
        let mut chosen = Vec::with_capacity(count);
        for offset in 0..n {
            let s = (start + offset) % n;
            if self.slots[s].is_none() {
                chosen.push(s);
                if chosen.len() == count {
                    return Some(chosen);
                }
            }
        }
        None
    }

    fn record(&mut self) {
        let row: Vec<Option<String>> = self
            .slots
            .iter()
            .map(|occupant| occupant.map(|idx| self.task_specs[idx].id.clone()))
            .collect();
        self.timeline.push(row);
    }

    /// A read-only, owned view of the current (post-retire) state.
    pub fn snapshot(&self) -> EnvironmentSnapshot {
        let slots = self
            .slots
            .iter()
            .map(|occupant| occupant.map(|idx| self.task_specs[idx].id.clone()))
            .collect();
        let task_states = self
            .task_specs
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), self.status[i].state()))
            .collect();
        EnvironmentSnapshot {
            tick: self.tick_now,
            slots,
            buffers: self.buffers.clone(),
            task_states,
        }
    }

    pub fn check_all_tasks_finished(&self) -> bool {
        self.status.iter().all(|s| matches!(s, TaskStatus::Finished))
    }

    /// Render the per-slot, per-tick grid: one row per slot, one column
    /// per recorded tick. Deterministic for a given (problem, policy).
    pub fn print_timeline(&self) -> String {
        let num_slots = self.slots.len();
        let num_ticks = self.timeline.len();
        let mut out = String::new();
        for slot in 0..num_slots {
            out.push_str(&format!("slot {slot:>2} | "));
            for tick in 0..num_ticks {
                let cell = self.timeline[tick][slot].as_deref().unwrap_or(IDLE_MARKER);
                out.push_str(&format!("{cell:<width$}", width = TIMELINE_COLUMN_WIDTH));
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Greedy;
    use crate::problems::{make_producer_consumer_problem, test_problem};

    #[test]
    fn scenario_a_single_producer_consumer() {
        // 1 producer (dur1, out1), 1 consumer (dur2, in1), S=1, B=1, T=4.
        let problem = make_producer_consumer_problem("scenario_a", 1, 1, 1, 2, 1, 1, 1, 4, 1).unwrap();
        let mut env = ExecutionEnvironment::new(problem, Box::new(Greedy));
        for _ in 0..4 {
            env.tick().unwrap();
        }
        assert!(env.check_all_tasks_finished());
    }

    #[test]
    fn tick_past_time_limit_errors() {
        let problem = test_problem();
        let time_limit = problem.time_limit;
        let mut env = ExecutionEnvironment::new(problem, Box::new(Greedy));
        for _ in 0..time_limit {
            env.tick().unwrap();
        }
        let err = env.tick().unwrap_err();
        assert_eq!(
            err,
            SimulationError::PastTimeLimit {
                tick: time_limit,
                time_limit
            }
        );
    }

    #[test]
    fn slots_never_double_booked() {
        let problem = test_problem();
        let mut env = ExecutionEnvironment::new(problem, Box::new(Greedy));
        for _ in 0..env.problem.time_limit {
            env.tick().unwrap();
            let snap = env.snapshot();
            let occupied: Vec<&String> = snap.slots.iter().flatten().collect();
            let mut seen = std::collections::HashSet::new();
            for id in occupied {
                assert!(seen.insert(id), "task {id} appears twice in the same tick's slots");
            }
        }
    }

    #[test]
    fn buffers_stay_within_limit() {
        let problem = test_problem();
        let limit = problem.buffer_size_limit;
        let mut env = ExecutionEnvironment::new(problem, Box::new(Greedy));
        for _ in 0..env.problem.time_limit {
            env.tick().unwrap();
            for &b in &env.buffers {
                assert!(b <= limit);
            }
        }
    }
}
