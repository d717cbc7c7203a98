//! Engine process driver.
//!
//! The engine writes its output whenever it likes, so a background thread
//! reads standard output line by line and forwards the lines through a
//! channel. The [`Client`] consumes them in order, with every wait bounded by
//! a timeout and interrupted by a [`CancelToken`].
//!
//! Only one request can be in flight at a time: every operation takes
//! `&mut self` and runs until the engine's answer is consumed. If the engine
//! does not answer in time, the client tries to bring it back in sync with
//! `stop` and releases the process when that fails too. Any other channel
//! failure releases the process immediately, so after an error the client is
//! either in sync with the engine or not running at all.

use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::process::{self, Child, ChildStdin, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::ValueEnum;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::uci::protocol::{Command, Response, SearchInfo};

/// Granularity of cancellation checks while waiting for engine output.
const POLL_INTERVAL: Duration = Duration::from_millis(20);
/// Granularity of process exit checks after `quit`.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Unit of the `time` field in `info` lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum TimeUnit {
    /// Milliseconds, as the UCI standard prescribes.
    #[default]
    #[value(name = "ms")]
    Milliseconds,
    /// Seconds, possibly fractional.
    #[value(name = "s")]
    Seconds,
}

impl TimeUnit {
    /// Converts a reported `time` value to seconds.
    #[must_use]
    pub fn to_seconds(self, time: f64) -> f64 {
        match self {
            Self::Milliseconds => time / 1000.0,
            Self::Seconds => time,
        }
    }
}

/// Shared flag that interrupts whatever the client is waiting for.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Requests cancellation. Every client holding a clone of this token
    /// releases its engine at the next wait.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether [`CancelToken::cancel`] was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Knobs of the engine process driver.
#[derive(Clone, Debug)]
pub struct ClientOptions {
    /// Extra command line arguments for the engine.
    pub args: Vec<String>,
    /// Bound on the `uci`..`uciok` and `isready`..`readyok` exchange.
    pub handshake_timeout: Duration,
    /// Bound on a single `go`..`bestmove` exchange.
    pub search_timeout: Duration,
    /// How long to wait for `bestmove` after sending `stop` to an engine that
    /// exceeded the search timeout.
    pub stop_grace: Duration,
    /// How long to wait for the process to exit after `quit` before killing
    /// it.
    pub quit_grace: Duration,
    /// Unit of the `time` the engine reports.
    pub time_unit: TimeUnit,
    /// Interrupts any wait for engine output.
    pub cancel: CancelToken,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            args: vec![],
            handshake_timeout: Duration::from_secs(10),
            search_timeout: Duration::from_secs(120),
            stop_grace: Duration::from_millis(500),
            quit_grace: Duration::from_millis(500),
            time_unit: TimeUnit::default(),
            cancel: CancelToken::default(),
        }
    }
}

/// Identity the engine reports during the handshake.
#[allow(missing_docs)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EngineId {
    pub name: Option<String>,
    pub author: Option<String>,
}

/// Outcome of a completed search.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult {
    /// Last reported node count, 0 if the engine never reported one.
    pub nodes: u64,
    /// Elapsed search time in seconds, always positive. Taken from the last
    /// reported `time`, or measured by the client if the engine did not report
    /// a positive one.
    pub time: f64,
    /// Last reported depth.
    pub depth: Option<u32>,
    /// `None` if the engine had no move to play.
    pub best_move: Option<String>,
}

/// UCI client owning exactly one engine process.
pub struct Client<W: Write = ChildStdin> {
    input: W,
    lines: Receiver<String>,
    process: Option<Child>,
    running: bool,
    id: EngineId,
    options: ClientOptions,
}

impl Client<ChildStdin> {
    /// Launches the engine and performs the handshake: `uci` until `uciok`,
    /// then `ucinewgame` and `isready` until `readyok`.
    ///
    /// # Errors
    ///
    /// [`Error::Launch`] if the executable can not be started or does not
    /// complete the handshake within [`ClientOptions::handshake_timeout`],
    /// [`Error::Cancelled`] if the token fires first. The process is released
    /// in both cases.
    pub fn start(path: impl AsRef<Path>, options: ClientOptions) -> Result<Self> {
        let path = path.as_ref();
        let launch_error = |reason: String| Error::Launch {
            path: path.to_path_buf(),
            reason,
        };

        debug!("starting engine {} {:?}", path.display(), options.args);
        let mut child = process::Command::new(path)
            .args(&options.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| launch_error(e.to_string()))?;
        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            if let Err(e) = child.kill() {
                warn!("failed to kill engine: {e}");
            }
            return Err(launch_error("engine standard streams are not available".to_string()));
        };

        let mut client = Self::with_lines(
            stdin,
            spawn_reader(BufReader::new(stdout)),
            Some(child),
            options,
        );
        match client.handshake() {
            Ok(()) => Ok(client),
            Err(Error::Cancelled) => Err(Error::Cancelled),
            Err(Error::Timeout(limit)) => Err(launch_error(format!(
                "engine did not complete the handshake within {limit:?}"
            ))),
            Err(error) => Err(launch_error(error.to_string())),
        }
    }
}

impl<W: Write> Client<W> {
    /// Wraps an already established connection: `input` receives commands and
    /// `output` yields engine responses. No process is owned and no handshake
    /// is performed, see [`Client::handshake`].
    pub fn from_streams<R>(input: W, output: R, options: ClientOptions) -> Self
    where
        R: BufRead + Send + 'static,
    {
        Self::with_lines(input, spawn_reader(output), None, options)
    }

    fn with_lines(
        input: W,
        lines: Receiver<String>,
        process: Option<Child>,
        options: ClientOptions,
    ) -> Self {
        Self {
            input,
            lines,
            process,
            running: true,
            id: EngineId::default(),
            options,
        }
    }

    /// Identity reported by the engine during the handshake.
    #[must_use]
    pub const fn id(&self) -> &EngineId {
        &self.id
    }

    /// Whether the engine can still be talked to.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Performs the `uci`/`uciok` handshake and waits until the engine is
    /// ready for the first search.
    ///
    /// # Errors
    ///
    /// [`Error::Timeout`] if the engine does not answer within
    /// [`ClientOptions::handshake_timeout`], [`Error::Protocol`] if the
    /// channel breaks and [`Error::Cancelled`] on cancellation. The engine is
    /// released on any error.
    pub fn handshake(&mut self) -> Result<()> {
        self.ensure_running()?;
        let started = Instant::now();
        let limit = self.options.handshake_timeout;

        let result = self.send(Command::Uci).and_then(|()| loop {
            match Response::parse(&self.read_line(started, limit)?) {
                Response::IdName(name) => self.id.name = Some(name),
                Response::IdAuthor(author) => self.id.author = Some(author),
                Response::UciOk => break Ok(()),
                response => trace!("ignoring during handshake: {response:?}"),
            }
        });
        let result = result
            .and_then(|()| self.send(Command::NewGame))
            .and_then(|()| self.send(Command::IsReady))
            .and_then(|()| self.wait_ready(started, limit));

        match result {
            Ok(()) => {
                info!(
                    "connected to {} by {}",
                    self.id.name.as_deref().unwrap_or("unnamed engine"),
                    self.id.author.as_deref().unwrap_or("unknown author")
                );
                Ok(())
            },
            Err(error) => Err(self.release(error)),
        }
    }

    /// Sets up the position for the next search. The engine does not answer
    /// this command.
    ///
    /// # Errors
    ///
    /// [`Error::Protocol`] if the engine is not running or the command can
    /// not be written, in which case the engine is released.
    pub fn set_position(&mut self, fen: &str) -> Result<()> {
        self.ensure_running()?;
        self.send(Command::SetPosition { fen })
            .map_err(|error| self.release(error))
    }

    /// Searches the current position to `depth` and waits for `bestmove`.
    ///
    /// `info` lines update the latest known depth, node count and time;
    /// everything else the engine prints is skipped.
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`] if `bestmove` does not arrive within
    ///   [`ClientOptions::search_timeout`]. The client sends `stop` and keeps
    ///   running if the engine answers within [`ClientOptions::stop_grace`];
    ///   otherwise the engine is released.
    /// - [`Error::Protocol`] if the engine is not running or the channel
    ///   breaks, [`Error::Cancelled`] on cancellation. The engine is released.
    pub fn go_depth(&mut self, depth: u32) -> Result<SearchResult> {
        self.ensure_running()?;
        self.send(Command::Go { depth })
            .map_err(|error| self.release(error))?;

        let started = Instant::now();
        let limit = self.options.search_timeout;
        let mut info = SearchInfo::default();
        let best_move = loop {
            let line = match self.read_line(started, limit) {
                Ok(line) => line,
                Err(Error::Timeout(limit)) => {
                    self.resync()?;
                    return Err(Error::Timeout(limit));
                },
                Err(error) => return Err(self.release(error)),
            };
            match Response::parse(&line) {
                Response::Info(update) => info.merge(update),
                Response::BestMove { best, .. } => break best,
                response => trace!("ignoring during search: {response:?}"),
            }
        };

        Ok(self.search_result(info, best_move, started.elapsed()))
    }

    /// Asks the engine to quit and waits [`ClientOptions::quit_grace`] for
    /// the process to exit before killing it. Does nothing if the engine is
    /// already stopped.
    pub fn quit(&mut self) {
        if !self.running {
            return;
        }
        if let Err(error) = self.send(Command::Quit) {
            debug!("engine is already gone: {error}");
        }
        self.running = false;

        let Some(mut child) = self.process.take() else {
            return;
        };
        let deadline = Instant::now() + self.options.quit_grace;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    debug!("engine exited: {status}");
                    return;
                },
                Ok(None) if Instant::now() < deadline => thread::sleep(EXIT_POLL_INTERVAL),
                Ok(None) => break,
                Err(e) => {
                    warn!("failed to check engine status: {e}");
                    break;
                },
            }
        }
        warn!("engine did not exit within {:?}, killing it", self.options.quit_grace);
        if let Err(e) = child.kill() {
            warn!("failed to kill engine: {e}");
        }
        if let Err(e) = child.wait() {
            warn!("failed to reap engine: {e}");
        }
    }

    fn ensure_running(&self) -> Result<()> {
        if self.running {
            Ok(())
        } else {
            Err(Error::Protocol("engine is not running".to_string()))
        }
    }

    /// Releases the engine and passes the error through.
    fn release(&mut self, error: Error) -> Error {
        debug!("releasing engine after error: {error}");
        self.quit();
        error
    }

    fn send(&mut self, command: Command<'_>) -> Result<()> {
        debug!("> {command}");
        writeln!(self.input, "{command}")
            .and_then(|()| self.input.flush())
            .map_err(|e| Error::Protocol(format!("failed to send '{command}': {e}")))
    }

    /// Waits for the next line of engine output until `limit` has passed
    /// since `started`.
    fn read_line(&self, started: Instant, limit: Duration) -> Result<String> {
        loop {
            if self.options.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let remaining = limit.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                return Err(Error::Timeout(limit));
            }
            match self.lines.recv_timeout(remaining.min(POLL_INTERVAL)) {
                Ok(line) => {
                    trace!("< {line}");
                    return Ok(line);
                },
                Err(RecvTimeoutError::Timeout) => {},
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(Error::Protocol("engine closed its output".to_string()));
                },
            }
        }
    }

    fn wait_ready(&self, started: Instant, limit: Duration) -> Result<()> {
        loop {
            if Response::parse(&self.read_line(started, limit)?) == Response::ReadyOk {
                return Ok(());
            }
        }
    }

    /// Brings a timed out engine back in sync by stopping the search and
    /// consuming its `bestmove`. Releases the engine if that does not work.
    ///
    /// Only cancellation is reported as an error, every other failure leaves
    /// the timeout as the outcome of the search.
    fn resync(&mut self) -> Result<()> {
        warn!("search timed out, sending stop");
        if let Err(error) = self.send(Command::Stop) {
            warn!("failed to stop the search: {error}");
            self.quit();
            return Ok(());
        }
        let started = Instant::now();
        loop {
            match self.read_line(started, self.options.stop_grace) {
                Ok(line) => {
                    if matches!(Response::parse(&line), Response::BestMove { .. }) {
                        debug!("engine stopped after timeout");
                        return Ok(());
                    }
                },
                Err(Error::Cancelled) => return Err(self.release(Error::Cancelled)),
                Err(error) => {
                    warn!("engine did not stop: {error}");
                    self.quit();
                    return Ok(());
                },
            }
        }
    }

    fn search_result(
        &self,
        info: SearchInfo,
        best_move: Option<String>,
        elapsed: Duration,
    ) -> SearchResult {
        let nodes = info.nodes.unwrap_or_else(|| {
            warn!("engine did not report the node count");
            0
        });
        let time = info
            .time
            .map(|time| self.options.time_unit.to_seconds(time))
            .filter(|&time| time > 0.0)
            .unwrap_or_else(|| {
                debug!("engine did not report a positive time, using measured {elapsed:?}");
                elapsed.as_secs_f64().max(f64::MIN_POSITIVE)
            });
        SearchResult {
            nodes,
            time,
            depth: info.depth,
            best_move,
        }
    }
}

impl<W: Write> Drop for Client<W> {
    fn drop(&mut self) {
        self.quit();
    }
}

/// Forwards lines from `output` until it is closed or the receiving side is
/// gone. Bytes that are not valid UTF-8 are replaced, the line itself is kept.
fn spawn_reader<R>(mut output: R) -> Receiver<String>
where
    R: BufRead + Send + 'static,
{
    let (sender, receiver) = mpsc::channel();
    drop(thread::spawn(move || {
        let mut buffer = Vec::new();
        loop {
            buffer.clear();
            match output.read_until(b'\n', &mut buffer) {
                Ok(0) => break,
                Ok(_) => {},
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!("failed to read engine output: {e}");
                    break;
                },
            }
            let line = String::from_utf8_lossy(&buffer);
            let line = line.trim_end_matches(['\n', '\r']);
            if sender.send(line.to_string()).is_err() {
                break;
            }
        }
    }));
    receiver
}
