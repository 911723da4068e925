//! # simpipe — discrete-event pipeline scheduling
//!
//! A tick-driven simulator for scheduling tasks from a multi-stage data
//! pipeline onto a fixed pool of execution slots, plus a mixed-integer
//! reference solver that proves how good a given policy's schedule is.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │               Fixture problems (problems.rs)               │
//! ├───────────────────────────────────────────────────────────┤
//! │              Problem model (model.rs)                      │
//! │   SchedulingProblem · OperatorSpec · TaskSpec               │
//! ├──────────────────────┬──────────────────────────────────────┤
//! │ Execution environment │      Scheduling policies            │
//! │ (environment.rs)      │      (policy.rs)                    │
//! │  ─ tick()              │  ─ Greedy                          │
//! │  ─ snapshot()          │  ─ GreedyWithBuffer                │
//! │  ─ print_timeline()    │  ─ GreedyAndAnticipating           │
//! │                        │  ─ RatesEqualizing                 │
//! ├──────────────────────┴──────────────────────────────────────┤
//! │                 Reference ILP solver (ilp/)                 │
//! │     builder.rs · solve.rs · report.rs                       │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Simulation model
//!
//! A pipeline is a chain of operators, each a homogeneous batch of tasks.
//! Operator `k`'s finished tasks accumulate in a buffer that operator
//! `k+1`'s tasks draw from; the first operator has no upstream buffer
//! (treated as unbounded), the last has no downstream buffer (its output
//! is discarded). `S` execution slots are shared across the whole
//! pipeline; a task with `num_cpus > 1` reserves that many slots for its
//! whole duration.
//!
//! Each tick of [`environment::ExecutionEnvironment::tick`] runs in a
//! fixed order: retire tasks finishing this tick (crediting their output),
//! poll the active [`policy::SchedulingPolicy`] for admissions, apply each
//! admission that is still feasible, then record the tick. A policy never
//! touches environment state directly — it receives an owned
//! [`environment::EnvironmentSnapshot`] and returns a list of proposed
//! [`policy::Admission`]s.
//!
//! [`ilp::solve`] builds and solves a mixed-integer program with the same
//! slot-capacity and buffer-recurrence constraints the simulator enforces,
//! giving a lower bound any policy's simulated makespan can be checked
//! against.

pub mod config;
pub mod environment;
pub mod error;
pub mod ilp;
pub mod model;
pub mod policy;
pub mod problems;

pub use environment::{EnvironmentSnapshot, ExecutionEnvironment};
pub use error::{ProblemError, SimulationError, SolverError};
pub use model::{OperatorSpec, SchedulingProblem, TaskSpec};
pub use policy::{Admission, Greedy, GreedyAndAnticipating, GreedyWithBuffer, RatesEqualizing, SchedulingPolicy};
