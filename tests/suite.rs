use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess};
use uci_bench::suite::{Suite, DEFAULT_DEPTH};

#[test]
fn builtin_positions_are_legal() {
    let suite = Suite::builtin(DEFAULT_DEPTH).unwrap();
    assert_eq!(suite.len(), 100);
    for position in &suite {
        let fen: Fen = position
            .fen()
            .parse()
            .unwrap_or_else(|e| panic!("{}: {e}", position.fen()));
        let _: Chess = fen
            .into_position(CastlingMode::Standard)
            .unwrap_or_else(|e| panic!("{}: {e}", position.fen()));
        assert_eq!(position.depth(), DEFAULT_DEPTH);
    }
}

#[test]
fn builtin_positions_are_unique() {
    let suite = Suite::builtin(DEFAULT_DEPTH).unwrap();
    let mut fens: Vec<&str> = suite.iter().map(|position| position.fen()).collect();
    fens.sort_unstable();
    fens.dedup();
    assert_eq!(fens.len(), suite.len());
}
