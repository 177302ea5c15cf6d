use anyhow::Result;
use std::fs;

use crate::config::RunConfig;
use crate::error::CaseError;
use crate::exec::run_child;
use crate::fixture::{load_fixture, TestCase};
use crate::golden::{verify_output, Verdict};

/// Outcome of one case that did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaseOutcome {
    /// Ran with no golden file to check.
    Unchecked,
    Golden(Verdict),
}

/// Tally of a whole run. Purely informational: it never affects the exit code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub matched: usize,
    pub updated: usize,
    pub stale: usize,
    pub unchecked: usize,
    pub failed: usize,
    pub expected_failures: usize,
    pub skipped: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: CaseOutcome) {
        match outcome {
            CaseOutcome::Unchecked => self.unchecked += 1,
            CaseOutcome::Golden(Verdict::Matched) => self.matched += 1,
            CaseOutcome::Golden(Verdict::Updated) => self.updated += 1,
            CaseOutcome::Golden(Verdict::Stale) => self.stale += 1,
        }
    }
}

/// Execute one case and check its golden file, if any.
pub fn run_case(config: &RunConfig, case: &TestCase) -> Result<CaseOutcome, CaseError> {
    let stdin_data = match case.input_file() {
        Some(name) => {
            let path = config.data_file(name);
            Some(fs::read(&path).map_err(|source| CaseError::ReadInput { path, source })?)
        }
        None => None,
    };

    let stdout = run_child(
        &config.executable,
        &case.args,
        stdin_data.as_deref(),
        config.timeout,
    )?;

    match case.output_file() {
        Some(name) => {
            let verdict = verify_output(
                &config.data_file(name),
                &stdout,
                config.hex_newlines,
                config.update_golden,
            )?;
            Ok(CaseOutcome::Golden(verdict))
        }
        None => Ok(CaseOutcome::Unchecked),
    }
}

/// Load the fixture and run every case in order.
///
/// The only error returned is a fixture that cannot be read or decoded.
/// Case failures are logged and counted, and the loop always runs to the end.
pub fn run(config: &RunConfig) -> Result<RunSummary> {
    let cases = load_fixture(&config.data_dir, &config.fixture_name)?;
    tracing::info!(
        "Running {} cases against {}",
        cases.len(),
        config.executable.display()
    );

    let mut summary = RunSummary::default();
    for case in &cases {
        if let Some(filter) = &config.filter {
            if !case.description.contains(filter.as_str()) {
                summary.skipped += 1;
                continue;
            }
        }
        summary.total += 1;
        tracing::debug!("[TEST] {} ({})", case.description, case.exec);

        match run_case(config, case) {
            Ok(outcome) => summary.record(outcome),
            Err(_) if case.expected_to_fail() => summary.expected_failures += 1,
            Err(err) => {
                summary.failed += 1;
                tracing::error!("Failure on test: {}. Error: {}", case.description, err);
                tracing::error!("Args {}", case.args_line());
            }
        }
    }

    tracing::info!(
        "{} cases run: {} matched, {} updated, {} stale, {} unchecked, {} failed, {} expected failures, {} skipped",
        summary.total,
        summary.matched,
        summary.updated,
        summary.stale,
        summary.unchecked,
        summary.failed,
        summary.expected_failures,
        summary.skipped
    );
    Ok(summary)
}
