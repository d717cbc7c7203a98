//! Ordered list of positions the benchmark is run on.
//!
//! Positions are kept as opaque [Forsyth-Edwards Notation] (FEN) strings: they
//! are only checked for the overall shape and passed to the engine verbatim.
//! The default suite is embedded into the binary, but any text file with one
//! FEN per line can be used instead (see [`Suite::from_file`]).
//!
//! [Forsyth-Edwards Notation]: https://www.chessprogramming.org/Forsyth-Edwards_Notation

use std::path::Path;
use std::{fs, slice};

use anyhow::{bail, Context};
use itertools::Itertools;

/// Weak or slow engines are usually run at depth 5-8, strong ones at 15-20.
pub const DEFAULT_DEPTH: u32 = 8;

/// Mix of Elometer positions and well-known test suites, one FEN per line.
pub const DEFAULT_SUITE: &str = include_str!("../suites/default.fen");

/// Full FEN has 6 fields, EPD-style trimmed FEN omits the two move counters.
const MIN_FEN_FIELDS: usize = 4;
const MAX_FEN_FIELDS: usize = 6;
const BOARD_RANKS: usize = 8;

/// A single benchmark position: board state plus the depth it is analyzed to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    fen: String,
    depth: u32,
}

impl Position {
    /// Creates a position after checking that `fen` looks like FEN (or
    /// EPD-style FEN without move counters) and `depth` is positive.
    ///
    /// Whitespace between the FEN fields is normalized, nothing else about the
    /// position is changed.
    ///
    /// ```
    /// use uci_bench::suite::Position;
    ///
    /// let position = Position::new("8/8/8/1Pk5/8/8/2P3K1/8  w - - 0 1", 8).unwrap();
    /// assert_eq!(position.fen(), "8/8/8/1Pk5/8/8/2P3K1/8 w - - 0 1");
    /// assert!(Position::new("8/8/8 w - - 0 1", 8).is_err());
    /// ```
    pub fn new(fen: &str, depth: u32) -> anyhow::Result<Self> {
        if depth == 0 {
            bail!("search depth should be positive");
        }
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if !(MIN_FEN_FIELDS..=MAX_FEN_FIELDS).contains(&fields.len()) {
            bail!(
                "FEN should have {MIN_FEN_FIELDS} to {MAX_FEN_FIELDS} fields, got {}: '{fen}'",
                fields.len()
            );
        }
        let ranks = fields[0].split('/').count();
        if ranks != BOARD_RANKS {
            bail!("FEN board should have {BOARD_RANKS} ranks, got {ranks}: '{fen}'");
        }
        if !matches!(fields[1], "w" | "b") {
            bail!("side to move should be 'w' or 'b', got '{}'", fields[1]);
        }
        Ok(Self {
            fen: fields.iter().join(" "),
            depth,
        })
    }

    /// Board state passed to the engine with `position fen`.
    #[must_use]
    pub fn fen(&self) -> &str {
        &self.fen
    }

    /// Depth passed to the engine with `go depth`.
    #[must_use]
    pub const fn depth(&self) -> u32 {
        self.depth
    }
}

/// Ordered sequence of positions. The order is significant: reports refer to
/// positions by their index in the suite.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Suite {
    positions: Vec<Position>,
}

impl Suite {
    /// The embedded default suite analyzed at `depth`.
    pub fn builtin(depth: u32) -> anyhow::Result<Self> {
        Self::parse(DEFAULT_SUITE, depth).context("embedded suite is corrupted")
    }

    /// Reads a suite from a text file, see [`Suite::parse`] for the format.
    pub fn from_file(path: impl AsRef<Path>, depth: u32) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read suite {}", path.display()))?;
        Self::parse(&contents, depth).with_context(|| format!("invalid suite {}", path.display()))
    }

    /// Parses one FEN per line. Empty lines and lines starting with `#` are
    /// skipped.
    pub fn parse(text: &str, depth: u32) -> anyhow::Result<Self> {
        let mut positions = vec![];
        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            positions.push(
                Position::new(line, depth).with_context(|| format!("line {}", number + 1))?,
            );
        }
        if positions.is_empty() {
            bail!("suite does not contain any positions");
        }
        Ok(Self { positions })
    }

    /// Keeps only the first `limit` positions.
    #[must_use]
    pub fn truncated(mut self, limit: usize) -> Self {
        self.positions.truncate(limit);
        self
    }

    /// Number of positions in the suite.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the suite has no positions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Positions in suite order.
    pub fn iter(&self) -> slice::Iter<'_, Position> {
        self.positions.iter()
    }
}

impl FromIterator<Position> for Suite {
    fn from_iter<I: IntoIterator<Item = Position>>(iter: I) -> Self {
        Self {
            positions: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Suite {
    type IntoIter = slice::Iter<'a, Position>;
    type Item = &'a Position;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
