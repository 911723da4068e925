//! # Fixture problems
//!
//! The named `SchedulingProblem` constructors the original `ray_data_eval`
//! source ships for its own tests: a plain two-stage producer/consumer
//! pipeline, a four-stage fan-in/fan-out pipeline, and a few scaled
//! variants. Kept here (rather than only inside `tests/`) because the demo
//! binary and the property tests both need concrete problems to run
//! against.

use crate::error::ProblemError;
use crate::model::{OperatorSpec, SchedulingProblem};

/// General two-stage producer/consumer factory backing
/// [`producer_consumer_problem`]; also used by property tests to generate
/// random-but-valid problems.
#[allow(clippy::too_many_arguments)]
pub fn make_producer_consumer_problem(
    name: impl Into<String>,
    num_producers: usize,
    num_consumers: usize,
    producer_time: u32,
    consumer_time: u32,
    producer_output_size: u64,
    consumer_input_size: u64,
    num_execution_slots: u32,
    time_limit: u64,
    buffer_size_limit: u64,
) -> Result<SchedulingProblem, ProblemError> {
    SchedulingProblem::new(
        name,
        vec![
            OperatorSpec::new("P", 0, num_producers, producer_time, 0, producer_output_size, 1)?,
            OperatorSpec::new("C", 1, num_consumers, consumer_time, consumer_input_size, 0, 1)?,
        ],
        num_execution_slots,
        buffer_size_limit,
        time_limit,
    )
}

/// 8 producers (dur 1, out 1) feeding 8 consumers (dur 2, in 1).
/// S=4, B=4, T=12. Used by scenario C / D-adjacent tests.
pub fn test_problem() -> SchedulingProblem {
    make_producer_consumer_problem("test_problem", 8, 8, 1, 1, 1, 1, 4, 12, 4).expect("fixture is valid")
}

/// A×8 (dur1,out1) → B×8 (dur2,in1,out2) → C×4 (dur1,in4,out10) → D×2
/// (dur2,in20). S=4, B=100, T=15.
pub fn multi_stage_problem() -> SchedulingProblem {
    SchedulingProblem::new(
        "multi_stage_problem",
        vec![
            OperatorSpec::new("A", 0, 8, 1, 0, 1, 1).unwrap(),
            OperatorSpec::new("B", 1, 8, 2, 1, 2, 1).unwrap(),
            OperatorSpec::new("C", 2, 4, 1, 4, 10, 1).unwrap(),
            OperatorSpec::new("D", 3, 2, 2, 20, 0, 1).unwrap(),
        ],
        4,
        100,
        15,
    )
    .expect("fixture is valid")
}

/// 10 producers (dur1,out1) feeding 10 consumers (dur2,in1). S=3, B=20, T=15.
pub fn producer_consumer_problem() -> SchedulingProblem {
    make_producer_consumer_problem("producer_consumer_problem", 10, 10, 1, 1, 1, 1, 3, 15, 20)
        .expect("fixture is valid")
}

/// A×50 → B×50 → C×25, a scaled-up version of `multi_stage_problem`'s
/// first three stages. S=3, B=5000, T=300.
pub fn long_problem() -> SchedulingProblem {
    SchedulingProblem::new(
        "long_problem",
        vec![
            OperatorSpec::new("A", 0, 50, 1, 0, 1, 1).unwrap(),
            OperatorSpec::new("B", 1, 50, 2, 1, 2, 1).unwrap(),
            OperatorSpec::new("C", 2, 25, 1, 4, 0, 1).unwrap(),
        ],
        3,
        5000,
        300,
    )
    .expect("fixture is valid")
}

/// P×5 (dur1,out1) → C×5 (dur2,in1,out1) → T×5 (dur2,in1). S=4, B=4, T=12.
///
/// The three-stage producer/consumer/trainer pipeline the distilled spec
/// dropped; restored from the original source because it is the only
/// fixture whose *middle* stage both consumes and produces rows.
pub fn training_problem() -> SchedulingProblem {
    SchedulingProblem::new(
        "training_problem",
        vec![
            OperatorSpec::new("P", 0, 5, 1, 0, 1, 1).unwrap(),
            OperatorSpec::new("C", 1, 5, 2, 1, 1, 1).unwrap(),
            OperatorSpec::new("T", 2, 5, 2, 1, 0, 1).unwrap(),
        ],
        4,
        4,
        12,
    )
    .expect("fixture is valid")
}

/// All fixtures except `training_problem`, mirroring the original source's
/// `problems = [test_problem, multi_stage_problem, producer_consumer_problem, long_problem]`.
pub fn all_problems() -> Vec<SchedulingProblem> {
    vec![
        test_problem(),
        multi_stage_problem(),
        producer_consumer_problem(),
        long_problem(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_construct_without_panicking() {
        let _ = test_problem();
        let _ = multi_stage_problem();
        let _ = producer_consumer_problem();
        let _ = long_problem();
        let _ = training_problem();
    }

    #[test]
    fn test_problem_shape() {
        let p = test_problem();
        assert_eq!(p.num_total_tasks(), 16);
        assert_eq!(p.num_execution_slots, 4);
        assert_eq!(p.buffer_size_limit, 4);
        assert_eq!(p.time_limit, 12);
    }

    #[test]
    fn multi_stage_shape() {
        let p = multi_stage_problem();
        assert_eq!(p.num_operators(), 4);
        assert_eq!(p.num_total_tasks(), 22);
    }
}
