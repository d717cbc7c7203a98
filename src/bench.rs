//! Runs a whole [`Suite`] through an engine and aggregates node counts and
//! search times into a report.
//!
//! The report is streamed to the sink as positions complete:
//!
//! ```text
//! Test 001/100 -- nodes=145064; time=0.262s; nps=554 knps
//! ...
//! ========================================================================
//! Total nodes=27403157; time=38.77s
//! Avg. nodes=274032; avg. time=0.39s; nps=707 knps
//! ```
//!
//! The field names and their order are relied upon by scripts that parse the
//! output.

use std::io::{self, Write};

use clap::ValueEnum;
use tracing::{error, warn};

use crate::error::Error;
use crate::session::{self, knps, AnalysisResult};
use crate::suite::Suite;
use crate::uci::Client;

const SEPARATOR: &str =
    "========================================================================";

/// What to do when a position can not be analyzed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum FailurePolicy {
    /// Stop the run and report the positions completed so far.
    #[default]
    Abort,
    /// Record the failure and continue with the next position, as long as
    /// the engine is still usable.
    Skip,
}

/// A position that could not be analyzed.
#[derive(Debug)]
pub struct Failure {
    /// Zero-based index of the position in the suite.
    pub index: usize,
    /// Why the position could not be analyzed.
    pub error: Error,
}

/// Totals and per-position results of a benchmark run.
#[derive(Debug, Default)]
pub struct BenchmarkReport {
    /// Number of positions in the suite, including those never analyzed.
    suite_len: usize,
    results: Vec<AnalysisResult>,
    failures: Vec<Failure>,
    nodes_total: u64,
    time_total: f64,
    aborted: bool,
}

impl BenchmarkReport {
    /// Creates an empty report for a suite of `suite_len` positions.
    #[must_use]
    pub fn new(suite_len: usize) -> Self {
        Self {
            suite_len,
            ..Self::default()
        }
    }

    /// Folds a completed analysis into the totals. The node total saturates
    /// instead of overflowing on absurd engine reports.
    pub fn record(&mut self, result: AnalysisResult) {
        self.nodes_total = self.nodes_total.saturating_add(result.nodes);
        self.time_total += result.time;
        self.results.push(result);
    }

    /// Remembers a position that failed.
    pub fn record_failure(&mut self, failure: Failure) {
        self.failures.push(failure);
    }

    /// Number of completed analyses.
    #[must_use]
    pub fn count(&self) -> usize {
        self.results.len()
    }

    /// Exact sum of the node counts of completed analyses.
    #[must_use]
    pub const fn nodes_total(&self) -> u64 {
        self.nodes_total
    }

    /// Sum of the search times of completed analyses, in seconds.
    #[must_use]
    pub const fn time_total(&self) -> f64 {
        self.time_total
    }

    /// Completed analyses in suite order.
    #[must_use]
    pub fn results(&self) -> &[AnalysisResult] {
        &self.results
    }

    /// Positions that could not be analyzed, in suite order.
    #[must_use]
    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    /// Whether the run stopped before reaching the end of the suite.
    #[must_use]
    pub const fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Whether every position of the suite was analyzed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.aborted && self.failures.is_empty()
    }

    /// Average node count, `None` until something completed.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn average_nodes(&self) -> Option<f64> {
        (self.count() > 0).then(|| self.nodes_total as f64 / self.count() as f64)
    }

    /// Average search time in seconds, `None` until something completed.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn average_time(&self) -> Option<f64> {
        (self.count() > 0).then(|| self.time_total / self.count() as f64)
    }

    /// Overall speed in thousands of nodes per second: total nodes over total
    /// time, not the mean of per-position speeds.
    #[must_use]
    pub fn average_knps(&self) -> Option<f64> {
        (self.count() > 0 && self.time_total > 0.0)
            .then(|| knps(self.nodes_total, self.time_total))
    }

    /// `Test <i>/<N>` prefix with `i` padded to the width of `N`.
    fn test_label(&self, index: usize) -> String {
        let width = self.suite_len.to_string().len();
        format!("Test {:0width$}/{}", index + 1, self.suite_len)
    }

    /// Report line of a completed analysis.
    #[must_use]
    pub fn result_line(&self, result: &AnalysisResult) -> String {
        format!(
            "{} -- nodes={}; time={}s; nps={:.0} knps",
            self.test_label(result.index),
            result.nodes,
            seconds(result.time),
            result.knps()
        )
    }

    /// Report line of a failed analysis.
    #[must_use]
    pub fn failure_line(&self, failure: &Failure) -> String {
        format!("{} -- failed: {}", self.test_label(failure.index), failure.error)
    }

    /// Writes the totals and averages.
    ///
    /// # Errors
    ///
    /// Fails if the sink can not be written to.
    pub fn write_summary(&self, sink: &mut impl Write) -> io::Result<()> {
        writeln!(sink, "{SEPARATOR}")?;
        writeln!(
            sink,
            "Total nodes={}; time={:.2}s",
            self.nodes_total, self.time_total
        )?;
        if !self.failures.is_empty() {
            writeln!(sink, "Failed positions={}", self.failures.len())?;
        }
        match (self.average_nodes(), self.average_time(), self.average_knps()) {
            (Some(nodes), Some(time), Some(knps)) => writeln!(
                sink,
                "Avg. nodes={nodes:.0}; avg. time={time:.2}s; nps={knps:.0} knps"
            ),
            _ => writeln!(sink, "No positions completed"),
        }
    }
}

/// Shortest representation of `time` that still reads as a fraction, e.g.
/// `1.0` rather than `1`.
fn seconds(time: f64) -> String {
    let text = time.to_string();
    if text.contains('.') || !time.is_finite() {
        text
    } else {
        format!("{text}.0")
    }
}

/// Drives a suite through an engine and streams the report to `sink`.
pub struct Benchmark<S: Write> {
    sink: S,
    policy: FailurePolicy,
}

impl<S: Write> Benchmark<S> {
    /// Creates a benchmark writing its report to `sink`.
    pub const fn new(sink: S, policy: FailurePolicy) -> Self {
        Self { sink, policy }
    }

    /// Analyzes every position of `suite` in order, writing a line per
    /// position and the summary at the end.
    ///
    /// Engine failures do not make this function fail. Depending on the
    /// [`FailurePolicy`] they either end the run or are recorded in the
    /// report. Launch failures and cancellation always end the run, and so
    /// does any failure after which the engine is no longer running.
    ///
    /// # Errors
    ///
    /// Fails only if the sink can not be written to.
    pub fn run<W: Write>(
        &mut self,
        client: &mut Client<W>,
        suite: &Suite,
    ) -> io::Result<BenchmarkReport> {
        let mut report = BenchmarkReport::new(suite.len());

        for (index, position) in suite.iter().enumerate() {
            match session::analyze(client, index, position) {
                Ok(result) => {
                    writeln!(self.sink, "{}", report.result_line(&result))?;
                    report.record(result);
                },
                Err(error) => {
                    let failure = Failure { index, error };
                    let stop = self.policy == FailurePolicy::Abort
                        || failure.error.is_fatal()
                        || !client.is_running();
                    if stop {
                        error!("aborting: {}", report.failure_line(&failure));
                        report.record_failure(failure);
                        report.aborted = true;
                        break;
                    }
                    warn!("skipping: {}", report.failure_line(&failure));
                    writeln!(self.sink, "{}", report.failure_line(&failure))?;
                    report.record_failure(failure);
                },
            }
        }

        report.write_summary(&mut self.sink)?;
        self.sink.flush()?;
        Ok(report)
    }

    /// Gives the sink back, e.g. to inspect what was written.
    pub fn into_sink(self) -> S {
        self.sink
    }
}
