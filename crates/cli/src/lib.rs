//! Command-line front end for the seating planner.
//!
//! Each invocation opens the JSON store, applies one command to the
//! classroom, publishes the resulting events and saves the store again.

pub mod args;
pub mod config;
pub mod run;
pub mod session;

pub use run::run;
