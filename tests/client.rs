use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use uci_bench::session::analyze;
use uci_bench::suite::Position;
use uci_bench::uci::{Client, ClientOptions};
use uci_bench::Error;

const MOCK_ENGINE: &str = env!("CARGO_BIN_EXE_mock-uci");
const FEN: &str = "8/8/8/1Pk5/8/8/2P3K1/8 w - - 0 1";

fn options(args: &[&str]) -> ClientOptions {
    ClientOptions {
        args: args.iter().map(ToString::to_string).collect(),
        handshake_timeout: Duration::from_secs(5),
        search_timeout: Duration::from_millis(300),
        stop_grace: Duration::from_millis(300),
        quit_grace: Duration::from_millis(200),
        ..ClientOptions::default()
    }
}

#[test]
fn handshake_reports_identity() {
    let client = Client::start(MOCK_ENGINE, options(&["--name", "Mock Engine 2"]))
        .expect("Mock engine should start");
    assert!(client.is_running());
    assert_eq!(client.id().name.as_deref(), Some("Mock Engine 2"));
    assert_eq!(client.id().author.as_deref(), Some("uci-bench"));
}

#[test]
fn search() {
    let mut client = Client::start(MOCK_ENGINE, options(&["--nodes", "1234", "--time", "250"]))
        .expect("Mock engine should start");
    client.set_position(FEN).unwrap();
    let result = client.go_depth(6).unwrap();
    assert_eq!(result.nodes, 1234);
    assert!((result.time - 0.25).abs() < 1e-9);
    assert_eq!(result.depth, Some(6));
    assert_eq!(result.best_move.as_deref(), Some("e2e4"));
    client.quit();
    assert!(!client.is_running());
}

#[test]
fn measured_time_without_report() {
    let mut client = Client::start(MOCK_ENGINE, options(&["--no-time", "--delay-ms", "50"]))
        .expect("Mock engine should start");
    let position = Position::new(FEN, 3).unwrap();
    let result = analyze(&mut client, 0, &position).unwrap();
    assert_eq!(result.nodes, 500_000);
    assert!(result.time > 0.03);
    assert!(result.time < 5.0);
}

#[test]
fn launch_failure() {
    let error = Client::start("/nonexistent/engine", options(&[])).err();
    assert!(matches!(error, Some(Error::Launch { .. })));
}

#[test]
fn handshake_timeout() {
    let started = Instant::now();
    let error = Client::start(
        MOCK_ENGINE,
        ClientOptions {
            handshake_timeout: Duration::from_millis(200),
            ..options(&["--no-uciok"])
        },
    )
    .err();
    assert!(matches!(error, Some(Error::Launch { .. })));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn hung_engine_is_killed() {
    let mut client =
        Client::start(MOCK_ENGINE, options(&["--hang-at", "1"])).expect("Mock engine should start");
    client.set_position(FEN).unwrap();
    let started = Instant::now();
    assert!(matches!(client.go_depth(10), Err(Error::Timeout(_))));
    assert!(!client.is_running());
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(matches!(client.go_depth(10), Err(Error::Protocol(_))));
}

#[test]
fn stalled_search_is_stopped() {
    let mut client = Client::start(MOCK_ENGINE, options(&["--stall-at", "1"]))
        .expect("Mock engine should start");
    assert!(matches!(client.go_depth(10), Err(Error::Timeout(_))));
    assert!(client.is_running());
    assert_eq!(client.go_depth(10).unwrap().nodes, 500_000);
}

#[test]
fn crashed_engine() {
    let mut client = Client::start(MOCK_ENGINE, options(&["--crash-at", "1"]))
        .expect("Mock engine should start");
    assert!(matches!(client.go_depth(10), Err(Error::Protocol(_))));
    assert!(!client.is_running());
}
