//! Invariant 7: no policy's simulated makespan beats the ILP reference
//! optimum. Run only against small fixtures — MIP solve time does not
//! scale the way the simulator does.

use simpipe::environment::ExecutionEnvironment;
use simpipe::ilp;
use simpipe::model::SchedulingProblem;
use simpipe::policy::{Greedy, GreedyAndAnticipating, GreedyWithBuffer, RatesEqualizing, SchedulingPolicy};
use simpipe::problems::make_producer_consumer_problem;

/// The last tick at which any slot was occupied, in the same
/// last-occupied-tick convention the ILP builder uses for its makespan
/// variable.
fn observed_makespan(problem: SchedulingProblem, policy: Box<dyn SchedulingPolicy>) -> u64 {
    let time_limit = problem.time_limit;
    let mut env = ExecutionEnvironment::new(problem, policy);
    let mut last_active = 0u64;
    for tick in 0..time_limit {
        env.tick().unwrap();
        let snapshot = env.snapshot();
        if snapshot.slots.iter().any(|s| s.is_some()) {
            last_active = tick;
        }
    }
    last_active
}

fn small_problem() -> SchedulingProblem {
    make_producer_consumer_problem("small", 2, 2, 1, 1, 1, 1, 1, 10, 2).expect("fixture is valid")
}

#[test]
fn ilp_optimum_never_exceeds_any_policy_makespan() {
    let reference = ilp::solve(&small_problem()).expect("small problem is feasible");

    let policies: Vec<Box<dyn SchedulingPolicy>> = vec![
        Box::new(Greedy),
        Box::new(GreedyWithBuffer),
        Box::new(GreedyAndAnticipating),
        Box::new(RatesEqualizing),
    ];
    for policy in policies {
        let observed = observed_makespan(small_problem(), policy);
        assert!(
            reference.makespan <= observed,
            "ILP makespan {} exceeded a policy's observed makespan {}",
            reference.makespan,
            observed
        );
    }
}
