//! Tuning knobs and display constants.
//!
//! Mirrors the donor crate's `config.rs`: a small set of named constants
//! rather than a file-driven configuration layer. Loading a pipeline
//! definition from disk is an explicit non-goal (spec.md §1), so there is
//! nothing here to parse — just the handful of values the simulator and
//! reporting code need to agree on.

/// Marker printed in a timeline cell for an idle slot-tick.
pub const IDLE_MARKER: &str = ".";

/// Column width used by [`crate::environment::ExecutionEnvironment::print_timeline`]
/// and the ILP grid reporter, so the two renderings line up visually.
pub const TIMELINE_COLUMN_WIDTH: usize = 4;
