//! Demo binary: run a named fixture problem through a named policy and
//! print the resulting timeline, optionally alongside the ILP reference
//! schedule.
//!
//! Outside the library's public contract — argument parsing and logger
//! initialization live here, never in `simpipe` itself, so a library
//! consumer is free to choose its own CLI and its own subscriber.

use clap::{Parser, ValueEnum};
use simpipe::{
    environment::ExecutionEnvironment,
    ilp,
    model::SchedulingProblem,
    policy::{Greedy, GreedyAndAnticipating, GreedyWithBuffer, RatesEqualizing, SchedulingPolicy},
    problems,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProblemName {
    Test,
    MultiStage,
    ProducerConsumer,
    Long,
    Training,
}

impl ProblemName {
    fn build(self) -> SchedulingProblem {
        match self {
            ProblemName::Test => problems::test_problem(),
            ProblemName::MultiStage => problems::multi_stage_problem(),
            ProblemName::ProducerConsumer => problems::producer_consumer_problem(),
            ProblemName::Long => problems::long_problem(),
            ProblemName::Training => problems::training_problem(),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyName {
    Greedy,
    GreedyWithBuffer,
    GreedyAndAnticipating,
    RatesEqualizing,
}

impl PolicyName {
    fn build(self) -> Box<dyn SchedulingPolicy> {
        match self {
            PolicyName::Greedy => Box::new(Greedy),
            PolicyName::GreedyWithBuffer => Box::new(GreedyWithBuffer),
            PolicyName::GreedyAndAnticipating => Box::new(GreedyAndAnticipating),
            PolicyName::RatesEqualizing => Box::new(RatesEqualizing),
        }
    }
}

/// Run a pipeline-scheduling fixture through a policy and print its timeline.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Fixture problem to simulate.
    #[arg(long, value_enum, default_value = "test")]
    problem: ProblemName,

    /// Scheduling policy to drive admissions.
    #[arg(long, value_enum, default_value = "greedy")]
    policy: PolicyName,

    /// Also solve and print the ILP reference schedule for comparison.
    #[arg(long)]
    ilp: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let problem = args.problem.build();
    let policy = args.policy.build();
    let time_limit = problem.time_limit;

    log::info!("running {} with {} policy", problem.name, args.policy_name());

    let mut env = ExecutionEnvironment::new(problem.clone(), policy);
    for _ in 0..time_limit {
        env.tick().expect("tick within time_limit");
    }

    println!("{}", env.print_timeline());
    println!("all tasks finished: {}", env.check_all_tasks_finished());

    if args.ilp {
        match ilp::solve(&problem) {
            Ok(solution) => {
                println!("\nILP reference schedule:");
                println!("{}", ilp::report_grid(&problem, &solution));
            }
            Err(err) => eprintln!("ILP solve failed: {err}"),
        }
    }
}

impl Args {
    fn policy_name(&self) -> &'static str {
        match self.policy {
            PolicyName::Greedy => "greedy",
            PolicyName::GreedyWithBuffer => "greedy_with_buffer",
            PolicyName::GreedyAndAnticipating => "greedy_and_anticipating",
            PolicyName::RatesEqualizing => "rates_equalizing",
        }
    }
}
