//! Analysis of a single suite position.
//!
//! Kept apart from [`crate::uci::Client`] so that policies around a whole
//! analysis (what to do on failure, retries) do not need to know anything
//! about the protocol.

use std::io::Write;

use crate::error::Result;
use crate::suite::Position;
use crate::uci::Client;

/// Performance counters of one analyzed position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnalysisResult {
    /// Zero-based index of the position in the suite.
    pub index: usize,
    /// Nodes searched.
    pub nodes: u64,
    /// Search time in seconds, always positive.
    pub time: f64,
}

impl AnalysisResult {
    /// Search speed in thousands of nodes per second.
    #[must_use]
    pub fn knps(&self) -> f64 {
        knps(self.nodes, self.time)
    }
}

/// Thousands of nodes per second.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn knps(nodes: u64, seconds: f64) -> f64 {
    nodes as f64 / seconds / 1000.0
}

/// Sets up `position` and searches it to its depth limit.
///
/// # Errors
///
/// Whatever [`Client::set_position`] or [`Client::go_depth`] returns.
pub fn analyze<W: Write>(
    client: &mut Client<W>,
    index: usize,
    position: &Position,
) -> Result<AnalysisResult> {
    client.set_position(position.fen())?;
    let search = client.go_depth(position.depth())?;
    Ok(AnalysisResult {
        index,
        nodes: search.nodes,
        time: search.time,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::Error;
    use crate::uci::testing::scripted;
    use crate::uci::{ClientOptions, TimeUnit};

    const FEN: &str = "8/8/8/1Pk5/8/8/2P3K1/8 w - - 0 1";

    fn options() -> ClientOptions {
        ClientOptions {
            search_timeout: Duration::from_millis(500),
            time_unit: TimeUnit::Seconds,
            ..ClientOptions::default()
        }
    }

    #[test]
    fn analyze_position() {
        let (mut client, input) = scripted(&["info nodes 500000 time 0.5", "bestmove c2c4"], options());
        let position = Position::new(FEN, 8).unwrap();
        let result = analyze(&mut client, 0, &position).unwrap();
        assert_eq!(result.index, 0);
        assert_eq!(result.nodes, 500_000);
        assert!((result.time - 0.5).abs() < 1e-9);
        assert!((result.knps() - 1000.0).abs() < 1e-9);
        assert_eq!(
            input.lines(),
            vec![format!("position fen {FEN}"), "go depth 8".to_string()]
        );
    }

    #[test]
    fn malformed_lines_are_ignored() {
        let (mut client, _input) = scripted(
            &[
                "info string hello",
                "info depth 5 nodes 12345 time 1.2",
                "info string hello",
                "bestmove e2e4",
            ],
            options(),
        );
        let position = Position::new(FEN, 5).unwrap();
        let result = analyze(&mut client, 3, &position).unwrap();
        assert_eq!(result.index, 3);
        assert_eq!(result.nodes, 12345);
        assert!((result.time - 1.2).abs() < 1e-9);
    }

    #[test]
    fn broken_engine() {
        let (mut client, _input) = scripted(&[], options());
        let position = Position::new(FEN, 5).unwrap();
        assert!(matches!(
            analyze(&mut client, 0, &position),
            Err(Error::Protocol(_))
        ));
        assert!(!client.is_running());
    }
}
