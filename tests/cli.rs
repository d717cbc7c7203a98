use std::path::PathBuf;

use assert_cmd::Command;
use predicates::boolean::PredicateBooleanExt;
use predicates::str::contains;
use pretty_assertions::assert_eq;

const BINARY_NAME: &str = "uci-bench";
const MOCK_ENGINE: &str = env!("CARGO_BIN_EXE_mock-uci");
const SEPARATOR: &str =
    "========================================================================";

fn bench(engine_args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin(BINARY_NAME).expect("Binary should be built");
    let _ = cmd.arg(MOCK_ENGINE);
    for arg in engine_args {
        let _ = cmd.arg(format!("--engine-arg={arg}"));
    }
    cmd
}

fn write_suite(name: &str, contents: &str) -> PathBuf {
    let path = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name);
    std::fs::write(&path, contents).expect("Suite should be written");
    path
}

fn stdout(cmd: &mut Command) -> String {
    let output = cmd.output().expect("Benchmark should run");
    String::from_utf8(output.stdout).expect("Output should be UTF-8")
}

#[test]
fn single_position() {
    let suite = write_suite("single.fen", "8/8/8/1Pk5/8/8/2P3K1/8 w - - 0 1\n");
    let mut cmd = bench(&[]);
    let _ = cmd.arg("--suite").arg(&suite);

    let output = cmd.output().expect("Benchmark should run");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        format!(
            "Test 1/1 -- nodes=500000; time=0.5s; nps=1000 knps\n{SEPARATOR}\n\
             Total nodes=500000; time=0.50s\n\
             Avg. nodes=500000; avg. time=0.50s; nps=1000 knps\n"
        )
    );
}

#[test]
fn time_in_seconds_and_noise() {
    let suite = write_suite("seconds.fen", "8/8/8/1Pk5/8/8/2P3K1/8 w - - 0 1\n");
    let mut cmd = bench(&["--nodes=12345", "--time=1.2", "--noise"]);
    let _ = cmd.arg("--suite").arg(&suite).args(["--time-unit", "s"]);

    drop(
        cmd.assert()
            .success()
            .stdout(contains("Test 1/1 -- nodes=12345; time=1.2s; nps=10 knps")),
    );
}

#[test]
fn several_positions() {
    let mut cmd = bench(&["--nodes=1000", "--nodes-step=1000", "--time=100"]);
    let _ = cmd.args(["--limit", "3", "--depth", "4"]);

    let output = stdout(&mut cmd);
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Test 1/3 -- nodes=1000; time=0.1s; nps=10 knps",
            "Test 2/3 -- nodes=2000; time=0.1s; nps=20 knps",
            "Test 3/3 -- nodes=3000; time=0.1s; nps=30 knps",
            SEPARATOR,
            "Total nodes=6000; time=0.30s",
            "Avg. nodes=2000; avg. time=0.10s; nps=20 knps",
        ]
    );
}

#[test]
fn index_is_padded() {
    let mut cmd = bench(&[]);
    let _ = cmd.args(["--limit", "10"]);

    drop(
        cmd.assert().success().stdout(
            contains("Test 01/10 -- ")
                .and(contains("Test 09/10 -- "))
                .and(contains("Test 10/10 -- ")),
        ),
    );
}

#[test]
fn identical_runs() {
    let args = ["--nodes=777", "--nodes-step=13", "--time=42"];
    let first = stdout(bench(&args).args(["--limit", "4"]));
    let second = stdout(bench(&args).args(["--limit", "4"]));
    assert_eq!(first, second);
}

#[test]
fn abort_on_timeout() {
    let mut cmd = bench(&["--hang-at=3"]);
    let _ = cmd.args([
        "--limit",
        "5",
        "--search-timeout-ms",
        "300",
        "--quit-grace-ms",
        "100",
    ]);

    drop(
        cmd.assert()
            .failure()
            .stdout(
                contains("Test 1/5 -- ")
                    .and(contains("Test 2/5 -- "))
                    .and(contains("Test 3/5").not())
                    .and(contains("Total nodes=1000000; time=1.00s"))
                    .and(contains("Failed positions=1")),
            )
            .stderr(contains("benchmark aborted at position 3")),
    );
}

#[test]
fn skip_stalled_position() {
    let mut cmd = bench(&["--stall-at=2"]);
    let _ = cmd.args([
        "--limit",
        "3",
        "--search-timeout-ms",
        "300",
        "--on-failure",
        "skip",
    ]);

    drop(
        cmd.assert().failure().stdout(
            contains("Test 1/3 -- nodes=500000")
                .and(contains(
                    "Test 2/3 -- failed: engine did not finish the search within 300ms",
                ))
                .and(contains("Test 3/3 -- nodes=500000"))
                .and(contains("Failed positions=1")),
        ),
    );
}

#[test]
fn skip_stops_when_engine_crashes() {
    let mut cmd = bench(&["--crash-at=2"]);
    let _ = cmd.args(["--limit", "3", "--on-failure", "skip"]);

    drop(
        cmd.assert()
            .failure()
            .stdout(
                contains("Test 1/3 -- ")
                    .and(contains("Test 3/3").not())
                    .and(contains("Failed positions=1")),
            )
            .stderr(contains("aborted at position 2")),
    );
}

#[test]
fn missing_engine() {
    let mut cmd = Command::cargo_bin(BINARY_NAME).expect("Binary should be built");
    let _ = cmd.arg("/nonexistent/engine");

    drop(
        cmd.assert()
            .failure()
            .stdout(contains("Test").not())
            .stderr(contains("failed to launch engine /nonexistent/engine")),
    );
}

#[test]
fn engine_without_handshake() {
    let mut cmd = bench(&["--no-uciok"]);
    let _ = cmd.args(["--handshake-timeout-ms", "300", "--quit-grace-ms", "100"]);

    drop(
        cmd.assert()
            .failure()
            .stderr(contains("did not complete the handshake")),
    );
}

#[test]
fn invalid_suite() {
    let suite = write_suite(
        "invalid.fen",
        "# comment\n8/8/8/1Pk5/8/8/2P3K1/8 w - - 0 1\nnot a position\n",
    );
    let mut cmd = bench(&[]);
    let _ = cmd.arg("--suite").arg(&suite);

    drop(cmd.assert().failure().stderr(contains("line 3")));
}

#[test]
fn zero_depth_is_rejected() {
    let mut cmd = bench(&[]);
    let _ = cmd.args(["--depth", "0"]);

    drop(cmd.assert().failure());
}

#[test]
fn zero_limit_is_rejected() {
    let mut cmd = bench(&[]);
    let _ = cmd.args(["--limit", "0"]);

    drop(cmd.assert().failure().stdout(contains("Test").not()));
}
