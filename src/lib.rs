//! Fixture-driven golden-file harness for transaction utility binaries.
//!
//! A JSON fixture lists cases; each one runs the binary under test with the
//! given arguments and optional stdin file, and its stdout is checked against
//! a golden file that is rewritten whenever it differs.

pub mod config;
pub mod error;
pub mod exec;
pub mod fixture;
pub mod golden;
pub mod runner;

pub use config::{HexNewlines, RunConfig};
pub use error::CaseError;
pub use fixture::{load_fixture, TestCase};
pub use golden::{verify_output, Verdict};
pub use runner::{run, run_case, CaseOutcome, RunSummary};
