//! Benchmarks a UCI engine on a fixed suite of positions.
//!
//! ```text
//! uci-bench /usr/bin/stockfish --depth 12
//! ```

use std::io;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::Level;
use uci_bench::bench::{Benchmark, BenchmarkReport, FailurePolicy};
use uci_bench::suite::{Suite, DEFAULT_DEPTH};
use uci_bench::uci::{CancelToken, Client, ClientOptions, TimeUnit};

#[derive(Parser, Debug)]
#[command(
    version = uci_bench::build::PKG_VERSION,
    long_version = uci_bench::build::CLAP_LONG_VERSION,
    about = "Measures nodes, time and nodes per second of a UCI chess engine"
)]
struct Cli {
    /// Path to the engine executable.
    engine: PathBuf,

    /// Extra argument passed to the engine (can be repeated).
    #[arg(long = "engine-arg", value_name = "ARG", allow_hyphen_values = true)]
    engine_args: Vec<String>,

    /// Search depth for every position.
    #[arg(long, default_value_t = DEFAULT_DEPTH, value_parser = clap::value_parser!(u32).range(1..))]
    depth: u32,

    /// File with one FEN per line to use instead of the built-in suite.
    #[arg(long)]
    suite: Option<PathBuf>,

    /// Only analyze the first N positions of the suite.
    #[arg(long, value_name = "N")]
    limit: Option<NonZeroUsize>,

    /// Maximum time to wait for `bestmove` after `go`.
    #[arg(long, default_value_t = 120_000)]
    search_timeout_ms: u64,

    /// Maximum time to wait for the engine to complete the handshake.
    #[arg(long, default_value_t = 10_000)]
    handshake_timeout_ms: u64,

    /// Time the engine gets to exit after `quit` before it is killed.
    #[arg(long, default_value_t = 500)]
    quit_grace_ms: u64,

    /// What to do when a position can not be analyzed.
    #[arg(long, value_enum, default_value_t = FailurePolicy::Abort)]
    on_failure: FailurePolicy,

    /// Unit of the `time` field the engine reports in `info` lines.
    #[arg(long, value_enum, default_value_t = TimeUnit::Milliseconds)]
    time_unit: TimeUnit,

    /// Verbosity of the diagnostics printed to stderr.
    #[arg(long, default_value_t = Level::WARN)]
    log_level: Level,
}

impl Cli {
    fn client_options(&self, cancel: CancelToken) -> ClientOptions {
        ClientOptions {
            args: self.engine_args.clone(),
            handshake_timeout: Duration::from_millis(self.handshake_timeout_ms),
            search_timeout: Duration::from_millis(self.search_timeout_ms),
            quit_grace: Duration::from_millis(self.quit_grace_ms),
            time_unit: self.time_unit,
            cancel,
            ..ClientOptions::default()
        }
    }

    fn suite(&self) -> anyhow::Result<Suite> {
        let suite = match &self.suite {
            Some(path) => Suite::from_file(path, self.depth)?,
            None => Suite::builtin(self.depth)?,
        };
        Ok(match self.limit {
            Some(limit) => suite.truncated(limit.get()),
            None => suite,
        })
    }
}

fn run(cli: &Cli) -> anyhow::Result<BenchmarkReport> {
    let suite = cli.suite()?;
    let cancel = CancelToken::default();
    let handler = cancel.clone();
    ctrlc::set_handler(move || handler.cancel())?;
    let mut client = Client::start(&cli.engine, cli.client_options(cancel))?;
    let mut benchmark = Benchmark::new(io::stdout().lock(), cli.on_failure);
    let report = benchmark.run(&mut client, &suite)?;
    client.quit();
    Ok(report)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(io::stderr)
        .init();
    if cli.log_level >= Level::INFO {
        uci_bench::print_tool_info();
    }

    match run(&cli) {
        Ok(report) => {
            if report.is_aborted() {
                if let Some(failure) = report.failures().last() {
                    eprintln!(
                        "Error: benchmark aborted at position {}: {}",
                        failure.index + 1,
                        failure.error
                    );
                }
            }
            if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}
