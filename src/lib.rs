//! # ptfgen
//!
//! Builds aircraft performance tables (speed, climb/descent rate, fuel flow
//! per altitude band and weight condition) by repeatedly driving an external
//! flight-dynamics trim solver. The crate's core is a feasibility-boundary
//! bisection over trimmed flight conditions plus a checkpointed sweep that
//! aggregates the results into a fixed tabular report.

pub mod config;
pub mod dataset;
#[cfg(feature = "jsbsim")]
pub mod ffi;
pub mod oracle;
pub mod problem;
pub mod report;
pub mod solver;


pub use dataset::{Condition, FlightLevel, PerformanceDataset, PropertySnapshot};
pub use oracle::{Oracle, OracleError};
pub use problem::{TrimOutcome, TrimProblem, TrimSolution, WarmStart};
pub use solver::{BinarySearch, BinarySolution, Direction, SolverError};
