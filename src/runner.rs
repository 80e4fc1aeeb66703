//! Catalog runs: execute a set of fixtures, validate each response, and
//! summarize the results.
//!
//! Fixtures share no mutable state, so they are dispatched concurrently up to
//! a caller-chosen limit. Completion order is irrelevant: every report is
//! keyed by its fixture identifier, and the summary lists reports in the
//! order the fixtures were given.
//!
//! An infrastructure fault (`UnknownEndpoint`, `Transport`) aborts only the
//! fixture it happened in. It is recorded as an abort, never as a contract
//! failure, and the run continues.

use std::error::Error;
use std::fmt;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::{Fixture, FixtureGroup};
use crate::error::ContractError;
use crate::executor::RequestExecutor;
use crate::validator::{Verdict, validate_fixture};

/// Default number of fixtures in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Category of an aborted fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortKind {
    /// The fixture named an unregistered endpoint.
    UnknownEndpoint,
    /// The per-request timeout elapsed.
    Timeout,
    /// Any other transport failure.
    Transport,
    /// Invalid configuration surfaced while building the request.
    Config,
}

/// Why a fixture produced no verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Abort {
    /// Failure category.
    pub kind: AbortKind,
    /// Rendered error, including its source chain.
    pub message: String,
}

impl From<&ContractError> for Abort {
    fn from(err: &ContractError) -> Self {
        let kind = match err {
            ContractError::UnknownEndpoint { .. } => AbortKind::UnknownEndpoint,
            ContractError::Transport(_) if err.is_timeout() => AbortKind::Timeout,
            ContractError::Transport(_) => AbortKind::Transport,
            ContractError::Config { .. } => AbortKind::Config,
        };
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Abort { kind, message }
    }
}

/// What happened to one fixture.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum FixtureOutcome {
    /// A response was received and judged.
    Checked(Verdict),
    /// No response could be obtained.
    Aborted(Abort),
}

/// Result of one fixture, attributable regardless of completion order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixtureReport {
    /// Identifier of the originating fixture.
    pub fixture_id: String,
    /// Group of the originating fixture.
    pub group: FixtureGroup,
    /// Verdict or abort.
    pub outcome: FixtureOutcome,
}

impl FixtureReport {
    /// `true` if the fixture produced a passing verdict.
    pub fn passed(&self) -> bool {
        matches!(&self.outcome, FixtureOutcome::Checked(v) if v.is_pass())
    }
}

/// Run-level summary.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Number of fixtures run.
    pub total: usize,
    /// Fixtures with a passing verdict.
    pub passed: usize,
    /// Fixtures with a failing verdict (contract violations).
    pub failed: usize,
    /// Fixtures aborted by infrastructure faults.
    pub aborted: usize,
    /// One report per fixture, in input order.
    pub reports: Vec<FixtureReport>,
}

impl RunSummary {
    /// Builds the summary counts from `reports`.
    pub fn from_reports(reports: Vec<FixtureReport>) -> Self {
        let passed = reports.iter().filter(|r| r.passed()).count();
        let aborted = reports
            .iter()
            .filter(|r| matches!(r.outcome, FixtureOutcome::Aborted(_)))
            .count();
        RunSummary {
            total: reports.len(),
            passed,
            failed: reports.len() - passed - aborted,
            aborted,
            reports,
        }
    }

    /// `true` when every fixture passed.
    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }

    /// Looks up the report for `fixture_id`.
    pub fn report(&self, fixture_id: &str) -> Option<&FixtureReport> {
        self.reports.iter().find(|r| r.fixture_id == fixture_id)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for report in &self.reports {
            match &report.outcome {
                FixtureOutcome::Checked(verdict @ Verdict::Pass { .. }) => {
                    writeln!(f, "PASS  {}  {verdict}", report.fixture_id)?
                }
                FixtureOutcome::Checked(verdict) => {
                    writeln!(f, "FAIL  {}  {verdict}", report.fixture_id)?
                }
                FixtureOutcome::Aborted(abort) => writeln!(
                    f,
                    "ABORT {}  {:?}: {}",
                    report.fixture_id, abort.kind, abort.message
                )?,
            }
        }
        write!(
            f,
            "{} fixtures: {} passed, {} failed, {} aborted",
            self.total, self.passed, self.failed, self.aborted
        )
    }
}

/// Executes and validates a single fixture.
pub async fn run_fixture(executor: &RequestExecutor, fixture: &Fixture) -> FixtureReport {
    let outcome = match executor.execute(fixture).await {
        Ok(response) => {
            let verdict = validate_fixture(fixture, &response);
            match &verdict {
                Verdict::Pass { candidate, .. } => {
                    info!(fixture = %fixture.id, candidate = candidate + 1, "fixture passed")
                }
                Verdict::Fail(violation) => {
                    warn!(fixture = %fixture.id, status = response.status, "fixture failed: {violation}")
                }
            }
            FixtureOutcome::Checked(verdict)
        }
        Err(err) => {
            let abort = Abort::from(&err);
            warn!(fixture = %fixture.id, error = %abort.message, "fixture aborted");
            FixtureOutcome::Aborted(abort)
        }
    };
    FixtureReport {
        fixture_id: fixture.id.clone(),
        group: fixture.group,
        outcome,
    }
}

/// Runs `fixtures` with at most `concurrency` requests in flight and returns
/// the summary. A `concurrency` of zero is treated as one.
pub async fn run_fixtures(
    executor: &RequestExecutor,
    fixtures: &[Fixture],
    concurrency: usize,
) -> RunSummary {
    let mut indexed: Vec<(usize, FixtureReport)> = stream::iter(fixtures.iter().enumerate())
        .map(|(i, fixture)| async move { (i, run_fixture(executor, fixture).await) })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;
    indexed.sort_by_key(|(i, _)| *i);

    let summary = RunSummary::from_reports(indexed.into_iter().map(|(_, r)| r).collect());
    info!(
        total = summary.total,
        passed = summary.passed,
        failed = summary.failed,
        aborted = summary.aborted,
        "catalog run finished"
    );
    summary
}
