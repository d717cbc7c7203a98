//! Client side of the [Universal Chess Interface] text protocol: commands sent
//! to the engine and the responses read back from it.
//!
//! Parsing is deliberately forgiving. Engines extend the protocol in various
//! ways, so anything that is not understood becomes [`Response::Unknown`] and
//! malformed values inside `info` lines are dropped field by field.
//!
//! [Universal Chess Interface]: https://www.chessprogramming.org/UCI

use std::fmt;

/// Commands the benchmark sends to the engine.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Uci,
    IsReady,
    NewGame,
    SetPosition { fen: &'a str },
    Go { depth: u32 },
    Stop,
    Quit,
}

impl fmt::Display for Command<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uci => write!(f, "uci"),
            Self::IsReady => write!(f, "isready"),
            Self::NewGame => write!(f, "ucinewgame"),
            Self::SetPosition { fen } => write!(f, "position fen {fen}"),
            Self::Go { depth } => write!(f, "go depth {depth}"),
            Self::Stop => write!(f, "stop"),
            Self::Quit => write!(f, "quit"),
        }
    }
}

/// Evaluation reported by the engine from the side to move's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    /// Centipawns.
    Centipawns(i32),
    /// Mate in the given number of moves (negative if the engine is mated).
    Mate(i32),
}

/// Whether the reported score is exact or only a bound.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Exact,
    Lower,
    Upper,
}

/// Fields of one `info` line. Every field is optional: engines report
/// whatever subset they like on each line.
///
/// `time` is kept as reported. The UCI standard says it is in milliseconds,
/// but it is stored as a float so that engines reporting fractional seconds
/// can be benchmarked too (see [`crate::uci::TimeUnit`]).
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchInfo {
    pub depth: Option<u32>,
    pub seldepth: Option<u32>,
    pub multipv: Option<u32>,
    pub score: Option<(Score, Bound)>,
    pub nodes: Option<u64>,
    pub nps: Option<u64>,
    pub time: Option<f64>,
    pub hashfull: Option<u32>,
    pub tbhits: Option<u64>,
    pub currmove: Option<String>,
    pub currmovenumber: Option<u32>,
    /// Principal variation.
    pub pv: Vec<String>,
    /// Free-form `info string` text.
    pub string: Option<String>,
}

impl SearchInfo {
    /// Overwrites the fields present in `update` and leaves the rest as they
    /// were, so that the latest value of each field survives.
    pub fn merge(&mut self, update: Self) {
        fn keep<T>(current: &mut Option<T>, update: Option<T>) {
            if update.is_some() {
                *current = update;
            }
        }

        keep(&mut self.depth, update.depth);
        keep(&mut self.seldepth, update.seldepth);
        keep(&mut self.multipv, update.multipv);
        keep(&mut self.score, update.score);
        keep(&mut self.nodes, update.nodes);
        keep(&mut self.nps, update.nps);
        keep(&mut self.time, update.time);
        keep(&mut self.hashfull, update.hashfull);
        keep(&mut self.tbhits, update.tbhits);
        keep(&mut self.currmove, update.currmove);
        keep(&mut self.currmovenumber, update.currmovenumber);
        keep(&mut self.string, update.string);
        if !update.pv.is_empty() {
            self.pv = update.pv;
        }
    }
}

/// A single line of engine output.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    IdName(String),
    IdAuthor(String),
    UciOk,
    ReadyOk,
    Info(SearchInfo),
    /// End of search. `best` is `None` when the engine has no move to play
    /// (`bestmove (none)` or a bare `bestmove`).
    BestMove {
        best: Option<String>,
        ponder: Option<String>,
    },
    Unknown(String),
}

impl Response {
    /// Parses a line of engine output. Never fails: lines that can not be
    /// interpreted are returned as [`Response::Unknown`].
    ///
    /// ```
    /// use uci_bench::uci::Response;
    ///
    /// let response = Response::parse("info depth 5 nodes 12345 time 1200");
    /// let Response::Info(info) = response else { panic!("expected info") };
    /// assert_eq!(info.depth, Some(5));
    /// assert_eq!(info.nodes, Some(12345));
    /// ```
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let parts: Vec<&str> = line.split_whitespace().collect();

        match parts.as_slice() {
            ["uciok"] => Self::UciOk,
            ["readyok"] => Self::ReadyOk,
            ["id", "name", name @ ..] if !name.is_empty() => Self::IdName(name.join(" ")),
            ["id", "author", author @ ..] if !author.is_empty() => {
                Self::IdAuthor(author.join(" "))
            },
            ["info", fields @ ..] => Self::Info(parse_info(fields)),
            ["bestmove", rest @ ..] => parse_bestmove(rest),
            _ => Self::Unknown(line.trim().to_string()),
        }
    }
}

fn parse_bestmove(parts: &[&str]) -> Response {
    let best = parts
        .first()
        .filter(|&&mv| mv != "(none)")
        .map(|&mv| mv.to_string());
    let ponder = match parts {
        [_, "ponder", mv, ..] => Some((*mv).to_string()),
        _ => None,
    };
    Response::BestMove { best, ponder }
}

fn parse_score(parts: &[&str]) -> (Option<(Score, Bound)>, usize) {
    let score = match parts {
        ["cp", value, ..] => value.parse().ok().map(Score::Centipawns),
        ["mate", value, ..] => value.parse().ok().map(Score::Mate),
        _ => None,
    };
    let Some(score) = score else {
        return (None, parts.len().min(1));
    };
    let (bound, consumed) = match parts.get(2) {
        Some(&"lowerbound") => (Bound::Lower, 3),
        Some(&"upperbound") => (Bound::Upper, 3),
        _ => (Bound::Exact, 2),
    };
    (Some((score, bound)), consumed)
}

fn parse_info(parts: &[&str]) -> SearchInfo {
    let mut info = SearchInfo::default();
    let mut i = 0;

    while i < parts.len() {
        let value = parts.get(i + 1).copied().unwrap_or_default();
        let mut step = 2;
        match parts[i] {
            "depth" => info.depth = value.parse().ok(),
            "seldepth" => info.seldepth = value.parse().ok(),
            "multipv" => info.multipv = value.parse().ok(),
            "nodes" => info.nodes = value.parse().ok(),
            "nps" => info.nps = value.parse().ok(),
            "time" => info.time = value.parse().ok().filter(|time: &f64| time.is_finite()),
            "hashfull" => info.hashfull = value.parse().ok(),
            "tbhits" => info.tbhits = value.parse().ok(),
            "currmovenumber" => info.currmovenumber = value.parse().ok(),
            "currmove" if !value.is_empty() => info.currmove = Some(value.to_string()),
            "score" => {
                let (score, consumed) = parse_score(&parts[i + 1..]);
                info.score = score;
                step = consumed + 1;
            },
            "pv" => {
                info.pv = parts[i + 1..].iter().map(|mv| (*mv).to_string()).collect();
                break;
            },
            "string" => {
                info.string = Some(parts[i + 1..].join(" "));
                break;
            },
            _ => step = 1,
        }
        i += step;
    }

    info
}
