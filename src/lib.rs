//! Benchmarks chess engines speaking the [Universal Chess Interface] (UCI):
//! runs a fixed suite of positions to a fixed depth and reports nodes, time
//! and nodes per second for each position and for the whole suite.
//!
//! The pieces, from the bottom up:
//!
//! - [`suite`]: positions to analyze.
//! - [`uci`]: engine process management and the protocol itself.
//! - [`session`]: analysis of a single position.
//! - [`bench`]: the whole run and its report.
//!
//! ```no_run
//! use uci_bench::bench::{Benchmark, FailurePolicy};
//! use uci_bench::suite::{Suite, DEFAULT_DEPTH};
//! use uci_bench::uci::{Client, ClientOptions};
//!
//! let suite = Suite::builtin(DEFAULT_DEPTH)?;
//! let mut client = Client::start("/usr/bin/stockfish", ClientOptions::default())?;
//! let mut benchmark = Benchmark::new(std::io::stdout(), FailurePolicy::Abort);
//! let report = benchmark.run(&mut client, &suite)?;
//! assert!(report.is_success());
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! [Universal Chess Interface]: https://www.chessprogramming.org/UCI

// Rustc lints.
#![warn(
    absolute_paths_not_starting_with_crate,
    keyword_idents,
    macro_use_extern_crate,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_extern_crates,
    unused_import_braces,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]
// Rustdoc lints.
#![warn(
    rustdoc::private_doc_tests,
    rustdoc::missing_crate_level_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::invalid_codeblock_attributes,
    rustdoc::invalid_html_tags,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::bare_urls
)]

pub mod bench;
pub mod error;
pub mod session;
pub mod suite;
pub mod uci;

pub use error::{Error, Result};
use shadow_rs::shadow;

shadow!(build);

/// Returns the full version that can be used to identify how the tool was
/// built in the first place.
#[must_use]
pub fn version() -> String {
    format!(
        "{} (commit {}, branch {})",
        build::PKG_VERSION,
        build::SHORT_COMMIT,
        build::BRANCH
    )
}

/// Prints the tool version and build type. Goes to stderr to keep stdout
/// reserved for the report.
pub fn print_tool_info() {
    eprintln!("uci-bench {}", version());
    if shadow_rs::is_debug() {
        eprintln!("Warning: debug build");
    }
}
