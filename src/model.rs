//! # Problem model
//!
//! Immutable description of a multi-stage pipeline: tasks grouped into
//! totally-ordered operators, plus the global slot/buffer/time limits the
//! simulator and the ILP solver both operate under.
//!
//! ## Shape
//!
//! ```text
//! SchedulingProblem
//!   ├─ operators: Vec<OperatorSpec>     (ordered, operator_idx 0..N)
//!   │    └─ tasks: Vec<TaskSpec>        (owned by the operator)
//!   ├─ num_execution_slots: u32         (S)
//!   ├─ buffer_size_limit: u64           (B)
//!   └─ time_limit: u64                  (T)
//! ```
//!
//! Stage `k`'s output buffer is stage `k+1`'s input buffer. The first stage
//! has `input_size == 0` on every task; the last stage has `output_size ==
//! 0` on every task. These two constraints plus operator-index contiguity
//! are enforced once, at construction, so nothing downstream has to
//! re-validate them.

use crate::error::ProblemError;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TaskSpec
// ---------------------------------------------------------------------------

/// An immutable descriptor of one unit of work.
///
/// Conventionally `id` is `"<operator_name><k>"` (e.g. `"P3"`), but the
/// simulator never parses the id — it is an opaque, stable handle used for
/// lookups and for the externally-visible timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub id: String,
    pub operator_idx: usize,
    pub duration: u32,
    pub input_size: u64,
    pub output_size: u64,
    pub num_cpus: u32,
}

// ---------------------------------------------------------------------------
// OperatorSpec
// ---------------------------------------------------------------------------

/// Ordered stage metadata plus the tasks it owns.
///
/// All tasks within one operator share `duration`, `input_size`,
/// `output_size` and `num_cpus` — this mirrors the `ray_data_eval` source,
/// where an operator is a homogeneous batch of `num_tasks` identical tasks
/// named `"{name}{i}"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorSpec {
    pub name: String,
    pub operator_idx: usize,
    pub duration: u32,
    pub input_size: u64,
    pub output_size: u64,
    pub num_cpus: u32,
    pub tasks: Vec<TaskSpec>,
}

impl OperatorSpec {
    /// Build an operator with `num_tasks` identically-configured tasks,
    /// named `"{name}0"`..`"{name}{num_tasks-1}"`.
    pub fn new(
        name: impl Into<String>,
        operator_idx: usize,
        num_tasks: usize,
        duration: u32,
        input_size: u64,
        output_size: u64,
        num_cpus: u32,
    ) -> Result<Self, ProblemError> {
        let name = name.into();
        if num_tasks == 0 {
            return Err(ProblemError::EmptyOperator { index: operator_idx });
        }
        if duration == 0 {
            return Err(ProblemError::NonPositiveDuration {
                index: operator_idx,
                duration: 0,
            });
        }
        if num_cpus == 0 {
            return Err(ProblemError::NonPositiveCpus {
                index: operator_idx,
                num_cpus: 0,
            });
        }

        let tasks = (0..num_tasks)
            .map(|i| TaskSpec {
                id: format!("{name}{i}"),
                operator_idx,
                duration,
                input_size,
                output_size,
                num_cpus,
            })
            .collect();

        Ok(Self {
            name,
            operator_idx,
            duration,
            input_size,
            output_size,
            num_cpus,
            tasks,
        })
    }

    pub fn num_tasks(&self) -> usize {
        self.tasks.len()
    }
}

// ---------------------------------------------------------------------------
// SchedulingProblem
// ---------------------------------------------------------------------------

/// The full problem: an ordered chain of operators plus global resource
/// limits. Immutable once constructed.
///
/// Supersedes the two near-identical problem-model shapes found in the
/// original source: this carries the richer `name` field and derives
/// `num_operators()` / `num_total_tasks()` rather than storing them
/// redundantly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingProblem {
    pub name: String,
    pub operators: Vec<OperatorSpec>,
    pub num_execution_slots: u32,
    pub buffer_size_limit: u64,
    pub time_limit: u64,
}

impl SchedulingProblem {
    /// Validate and construct a problem. Enforces every invariant from
    /// spec.md §7 "Invalid problem": positive counts, in-range operator
    /// indices, zero input on the first stage, zero output on the last
    /// stage, and no task requesting more CPUs than exist.
    pub fn new(
        name: impl Into<String>,
        operators: Vec<OperatorSpec>,
        num_execution_slots: u32,
        buffer_size_limit: u64,
        time_limit: u64,
    ) -> Result<Self, ProblemError> {
        if operators.is_empty() {
            return Err(ProblemError::NoOperators);
        }
        if num_execution_slots == 0 {
            return Err(ProblemError::NonPositiveSlots);
        }
        if time_limit == 0 {
            return Err(ProblemError::NonPositiveTimeLimit);
        }
        if buffer_size_limit == 0 {
            return Err(ProblemError::NonPositiveBufferLimit);
        }

        let num_operators = operators.len();
        for (k, op) in operators.iter().enumerate() {
            if op.operator_idx != k {
                return Err(ProblemError::OperatorIndexOutOfRange {
                    given: op.operator_idx,
                    num_operators,
                });
            }
            if op.tasks.is_empty() {
                return Err(ProblemError::EmptyOperator { index: k });
            }
            if k == 0 && op.input_size != 0 {
                return Err(ProblemError::FirstStageHasInput {
                    index: k,
                    input_size: op.input_size,
                });
            }
            if k == num_operators - 1 && op.output_size != 0 {
                return Err(ProblemError::LastStageHasOutput {
                    index: k,
                    output_size: op.output_size,
                });
            }
            for task in &op.tasks {
                if task.num_cpus > num_execution_slots {
                    return Err(ProblemError::CpusExceedSlots {
                        task_id: task.id.clone(),
                        num_cpus: task.num_cpus,
                        num_execution_slots,
                    });
                }
            }
        }

        Ok(Self {
            name: name.into(),
            operators,
            num_execution_slots,
            buffer_size_limit,
            time_limit,
        })
    }

    pub fn num_operators(&self) -> usize {
        self.operators.len()
    }

    pub fn num_total_tasks(&self) -> usize {
        self.operators.iter().map(|op| op.num_tasks()).sum()
    }

    /// Flat task list, downstream operators first — biases policies that
    /// scan tasks in list order toward draining the pipeline, per the
    /// original source's `_get_tasks` (`reversed(operators)`).
    pub fn tasks_downstream_first(&self) -> Vec<&TaskSpec> {
        self.operators
            .iter()
            .rev()
            .flat_map(|op| op.tasks.iter())
            .collect()
    }

    pub fn task(&self, id: &str) -> Option<&TaskSpec> {
        self.operators
            .iter()
            .flat_map(|op| op.tasks.iter())
            .find(|t| t.id == id)
    }

    pub fn operator(&self, idx: usize) -> Option<&OperatorSpec> {
        self.operators.get(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_stage() -> SchedulingProblem {
        SchedulingProblem::new(
            "t",
            vec![
                OperatorSpec::new("P", 0, 2, 1, 0, 1, 1).unwrap(),
                OperatorSpec::new("C", 1, 2, 2, 1, 0, 1).unwrap(),
            ],
            2,
            4,
            10,
        )
        .unwrap()
    }

    #[test]
    fn derived_counts() {
        let p = two_stage();
        assert_eq!(p.num_operators(), 2);
        assert_eq!(p.num_total_tasks(), 4);
    }

    #[test]
    fn downstream_first_order() {
        let p = two_stage();
        let ids: Vec<&str> = p.tasks_downstream_first().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["C0", "C1", "P0", "P1"]);
    }

    #[test]
    fn rejects_first_stage_with_input() {
        let err = SchedulingProblem::new(
            "bad",
            vec![OperatorSpec::new("P", 0, 1, 1, 5, 1, 1).unwrap()],
            1,
            1,
            1,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ProblemError::FirstStageHasInput {
                index: 0,
                input_size: 5
            }
        );
    }

    #[test]
    fn rejects_cpus_exceeding_slots() {
        let err = SchedulingProblem::new(
            "bad",
            vec![OperatorSpec::new("P", 0, 1, 1, 0, 0, 4).unwrap()],
            2,
            1,
            1,
        )
        .unwrap_err();
        assert!(matches!(err, ProblemError::CpusExceedSlots { .. }));
    }

    #[test]
    fn rejects_empty_operator_list() {
        let err = SchedulingProblem::new("bad", vec![], 1, 1, 1).unwrap_err();
        assert_eq!(err, ProblemError::NoOperators);
    }

    #[test]
    fn rejects_zero_buffer_limit() {
        let err = SchedulingProblem::new(
            "bad",
            vec![OperatorSpec::new("P", 0, 1, 1, 0, 0, 1).unwrap()],
            1,
            0,
            1,
        )
        .unwrap_err();
        assert_eq!(err, ProblemError::NonPositiveBufferLimit);
    }
}
