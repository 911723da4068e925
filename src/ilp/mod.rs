//! # Reference ILP solver
//!
//! A mixed-integer program mirroring the simulator's own constraints
//! (slot capacity, buffer recurrence, contiguous task occupancy), solved
//! with [`good_lp`]'s pure-Rust `microlp` backend. Its optimal makespan is
//! a lower bound any [`crate::policy::SchedulingPolicy`]'s simulated
//! makespan can be checked against (spec.md §8, invariant 7).
//!
//! No corpus example uses an ILP solver; `good_lp` was introduced for this
//! module specifically because it is pure Rust and needs no system solver
//! library, see `DESIGN.md`.

mod builder;
mod report;
mod solve;

pub use builder::IlpModel;
pub use report::report_grid;
pub use solve::{solve, ReferenceSolution, TaskSchedule};
