//! Scripted UCI engine with deterministic output, used to test the benchmark
//! without a real engine.
//!
//! Every `go` reports `nodes + (n - 1) * nodes-step` nodes for the n-th
//! search and the `time` given on the command line verbatim. Misbehavior
//! (hanging, crashing, never completing the handshake) can be requested for
//! specific searches.

use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(about = "Deterministic UCI engine for tests")]
struct Args {
    /// Name reported in `id name`.
    #[arg(long, default_value = "Mock")]
    name: String,

    /// Nodes reported by the first search.
    #[arg(long, default_value_t = 500_000)]
    nodes: u64,

    /// Added to the node count for every following search.
    #[arg(long, default_value_t = 0)]
    nodes_step: u64,

    /// Value of the `time` field, printed as is.
    #[arg(long, default_value = "500")]
    time: String,

    /// Do not report `time` at all.
    #[arg(long)]
    no_time: bool,

    /// Move reported in `bestmove`.
    #[arg(long, default_value = "e2e4")]
    bestmove: String,

    /// Interleave search output with lines the client has to skip.
    #[arg(long)]
    noise: bool,

    /// Sleep before answering every `go`.
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,

    /// Never answer `uci` with `uciok`.
    #[arg(long)]
    no_uciok: bool,

    /// Stop responding to anything, `quit` included, at the n-th `go`.
    #[arg(long, value_name = "N")]
    hang_at: Option<u32>,

    /// Do not finish the n-th search until `stop` is received.
    #[arg(long, value_name = "N")]
    stall_at: Option<u32>,

    /// Exit without answering the n-th `go`.
    #[arg(long, value_name = "N")]
    crash_at: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let stdin = io::stdin();
    let mut out = io::stdout().lock();
    let mut searches: u32 = 0;
    let mut hung = false;
    let mut stalled = false;

    for line in stdin.lock().lines() {
        let line = line?;
        if hung {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            ["uci"] => {
                writeln!(out, "id name {}", args.name)?;
                writeln!(out, "id author uci-bench")?;
                writeln!(out, "option name Hash type spin default 16 min 1 max 1024")?;
                if !args.no_uciok {
                    writeln!(out, "uciok")?;
                }
            },
            ["isready"] => writeln!(out, "readyok")?,
            ["go", rest @ ..] => {
                searches += 1;
                if args.crash_at == Some(searches) {
                    std::process::exit(3);
                }
                if args.hang_at == Some(searches) {
                    hung = true;
                    continue;
                }
                if args.stall_at == Some(searches) {
                    stalled = true;
                    continue;
                }
                let depth = match rest {
                    ["depth", depth, ..] => depth.parse().unwrap_or(1),
                    _ => 1,
                };
                thread::sleep(Duration::from_millis(args.delay_ms));
                search(&mut out, &args, searches, depth)?;
            },
            ["stop"] if stalled => {
                stalled = false;
                writeln!(out, "bestmove {}", args.bestmove)?;
            },
            ["quit"] => break,
            _ => {},
        }
        out.flush()?;
    }
    Ok(())
}

fn search(out: &mut impl Write, args: &Args, search: u32, depth: u32) -> io::Result<()> {
    let nodes = args.nodes + u64::from(search - 1) * args.nodes_step;
    if args.noise {
        writeln!(out, "info string hello")?;
        writeln!(out, "this is not UCI")?;
        writeln!(out, "info depth {depth} nodes")?;
    }
    if args.no_time {
        writeln!(out, "info depth {depth} nodes {nodes}")?;
    } else {
        writeln!(out, "info depth {depth} nodes {nodes} time {}", args.time)?;
    }
    if args.noise {
        writeln!(out, "info currmove e2e4 currmovenumber 1")?;
    }
    writeln!(out, "bestmove {}", args.bestmove)
}
