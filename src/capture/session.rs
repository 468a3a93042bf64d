use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use anyhow::{Context, Result};
use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender};
use tracing::{debug, info, warn};

use super::reader::{spawn_reader, StreamKind};
use super::{ChildProcess, Outcome, Transcript, UNKNOWN_EXIT_CODE};

pub(crate) const KILLED_BY_USER: &str = "Process was killed by user";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SessionState {
    Running,
    Killed,
    Finished(Outcome),
}

impl SessionState {
    pub(crate) fn is_finished(&self) -> bool {
        matches!(self, SessionState::Finished(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Completion {
    StdoutClosed,
    StderrClosed,
    Exited { code: i32, killed: bool },
}

/// Order-independent three-way barrier. Duplicate signals are ignored.
#[derive(Debug, Default)]
pub(crate) struct Rendezvous {
    stdout_closed: bool,
    stderr_closed: bool,
    exit: Option<Outcome>,
}

impl Rendezvous {
    pub(crate) fn record(&mut self, signal: Completion) -> bool {
        match signal {
            Completion::StdoutClosed => self.stdout_closed = true,
            Completion::StderrClosed => self.stderr_closed = true,
            Completion::Exited { code, killed } => {
                if self.exit.is_none() {
                    self.exit = Some(Outcome { code, killed });
                }
            }
        }
        self.is_complete()
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.stdout_closed && self.stderr_closed && self.exit.is_some()
    }

    pub(crate) fn outcome(&self) -> Option<Outcome> {
        if self.is_complete() {
            self.exit
        } else {
            None
        }
    }
}

/// Proof that every completion signal arrived. Only `ProcessSession::wait`
/// produces one, and `finish` consumes it.
#[derive(Debug)]
pub(crate) struct Drained {
    outcome: Outcome,
}

impl Drained {
    pub(crate) fn outcome(&self) -> Outcome {
        self.outcome
    }
}

#[derive(Clone)]
pub(crate) struct KillSwitch {
    requested: Arc<AtomicBool>,
    tx: Sender<()>,
}

impl KillSwitch {
    pub(crate) fn new() -> (Self, Receiver<()>) {
        let (tx, rx) = bounded(1);
        (
            Self {
                requested: Arc::new(AtomicBool::new(false)),
                tx,
            },
            rx,
        )
    }

    /// Returns `true` only for the call that actually issued the request.
    pub(crate) fn request(&self) -> bool {
        if self.requested.swap(true, Ordering::AcqRel) {
            return false;
        }
        let _ = self.tx.try_send(());
        true
    }

    pub(crate) fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}

pub(crate) struct ProcessSession {
    process: Arc<dyn ChildProcess>,
    state: Arc<Mutex<SessionState>>,
    kill: KillSwitch,
    completion: Receiver<Completion>,
}

impl ProcessSession {
    pub(crate) fn start<O, E>(
        process: Arc<dyn ChildProcess>,
        stdout: O,
        stderr: E,
        transcript: Arc<Transcript>,
    ) -> Result<Self>
    where
        O: Read + Send + 'static,
        E: Read + Send + 'static,
    {
        let workers = spawn_workers(&process, stdout, stderr, transcript);
        let (kill, state, completion) = terminate_on_error(process.as_ref(), workers)?;
        Ok(Self {
            process,
            state,
            kill,
            completion,
        })
    }

    pub(crate) fn pid(&self) -> u32 {
        self.process.id()
    }

    pub(crate) fn state(&self) -> SessionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn request_kill(&self) -> bool {
        let issued = self.kill.request();
        if issued {
            info!(pid = self.pid(), "kill requested");
        }
        issued
    }

    pub(crate) fn wait(&self) -> Drained {
        let mut rendezvous = Rendezvous::default();
        for signal in self.completion.iter() {
            debug!(?signal, "completion signal");
            if rendezvous.record(signal) {
                break;
            }
        }
        let outcome = rendezvous.outcome().unwrap_or_else(|| {
            warn!("completion channel closed before all signals arrived");
            Outcome {
                code: UNKNOWN_EXIT_CODE,
                killed: self.kill.is_requested(),
            }
        });
        info!(code = outcome.code, killed = outcome.killed, "session drained");
        Drained { outcome }
    }

    pub(crate) fn finish(&self, drained: Drained) -> Outcome {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = SessionState::Finished(drained.outcome);
        drained.outcome
    }
}

type Workers = (KillSwitch, Arc<Mutex<SessionState>>, Receiver<Completion>);

fn spawn_workers<O, E>(
    process: &Arc<dyn ChildProcess>,
    stdout: O,
    stderr: E,
    transcript: Arc<Transcript>,
) -> Result<Workers>
where
    O: Read + Send + 'static,
    E: Read + Send + 'static,
{
    let (done_tx, done_rx) = unbounded();
    spawn_reader(
        StreamKind::Stdout,
        stdout,
        Arc::clone(&transcript),
        done_tx.clone(),
    )
    .context("start stdout reader")?;
    spawn_reader(
        StreamKind::Stderr,
        stderr,
        Arc::clone(&transcript),
        done_tx.clone(),
    )
    .context("start stderr reader")?;

    let (exit_tx, exit_rx) = bounded(1);
    let waiter = Arc::clone(process);
    thread::Builder::new()
        .name("buildcap-wait".to_string())
        .spawn(move || {
            let code = match waiter.wait() {
                Ok(code) => code,
                Err(err) => {
                    warn!(error = %err, "waiting for process failed");
                    UNKNOWN_EXIT_CODE
                }
            };
            debug!(code, "process exited");
            let _ = exit_tx.send(code);
        })
        .context("start exit waiter")?;

    let (kill, kill_rx) = KillSwitch::new();
    let state = Arc::new(Mutex::new(SessionState::Running));
    let race = ExitRace {
        process: Arc::clone(process),
        transcript,
        state: Arc::clone(&state),
    };
    thread::Builder::new()
        .name("buildcap-race".to_string())
        .spawn(move || {
            let signal = race.run(&kill_rx, &exit_rx);
            let _ = done_tx.send(signal);
        })
        .context("start exit race")?;

    Ok((kill, state, done_rx))
}

/// A half-started session has nobody left to reap the child, so it is killed.
fn terminate_on_error<T>(process: &dyn ChildProcess, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        warn!(pid = process.id(), error = %format!("{err:#}"), "session setup failed, killing child");
        if let Err(kill_err) = process.terminate() {
            warn!(pid = process.id(), error = %kill_err, "terminate after setup failure failed");
        }
    }
    result
}

struct ExitRace {
    process: Arc<dyn ChildProcess>,
    transcript: Arc<Transcript>,
    state: Arc<Mutex<SessionState>>,
}

impl ExitRace {
    fn run(&self, kill_rx: &Receiver<()>, exit_rx: &Receiver<i32>) -> Completion {
        select! {
            recv(kill_rx) -> msg => match msg {
                Ok(()) => self.kill_and_reap(exit_rx),
                // Every kill handle is gone; only a natural exit remains.
                Err(_) => Completion::Exited {
                    code: exit_rx.recv().unwrap_or(UNKNOWN_EXIT_CODE),
                    killed: false,
                },
            },
            recv(exit_rx) -> code => Completion::Exited {
                code: code.unwrap_or(UNKNOWN_EXIT_CODE),
                killed: false,
            },
        }
    }

    fn kill_and_reap(&self, exit_rx: &Receiver<i32>) -> Completion {
        self.transcript.append_closing(KILLED_BY_USER);
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = SessionState::Killed;

        let code = match self.process.terminate() {
            Ok(()) => {
                info!(pid = self.process.id(), "terminate sent, waiting for exit");
                exit_rx.recv().unwrap_or(UNKNOWN_EXIT_CODE)
            }
            Err(err) => {
                warn!(pid = self.process.id(), error = %err, "terminate failed");
                self.transcript
                    .append(format!("Error killing process: {err}"), true);
                exit_rx.try_recv().unwrap_or(UNKNOWN_EXIT_CODE)
            }
        };
        Completion::Exited { code, killed: true }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::io::{self, Cursor, Read};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crossbeam_channel::{unbounded, Receiver, Sender};

    use crate::capture::ChildProcess;

    pub(crate) struct FakeProcess {
        exit_rx: Receiver<i32>,
        exit_tx: Sender<i32>,
        terminate_calls: AtomicUsize,
        terminate_error: Option<String>,
        exit_on_terminate: Option<i32>,
    }

    impl FakeProcess {
        pub(crate) fn new() -> Self {
            let (exit_tx, exit_rx) = unbounded();
            Self {
                exit_rx,
                exit_tx,
                terminate_calls: AtomicUsize::new(0),
                terminate_error: None,
                exit_on_terminate: Some(-1),
            }
        }

        pub(crate) fn failing_terminate(message: &str) -> Self {
            Self {
                terminate_error: Some(message.to_string()),
                exit_on_terminate: None,
                ..Self::new()
            }
        }

        pub(crate) fn exit(&self, code: i32) {
            let _ = self.exit_tx.send(code);
        }

        pub(crate) fn terminate_count(&self) -> usize {
            self.terminate_calls.load(Ordering::SeqCst)
        }
    }

    impl ChildProcess for FakeProcess {
        fn id(&self) -> u32 {
            4242
        }

        fn wait(&self) -> io::Result<i32> {
            self.exit_rx
                .recv()
                .map_err(|_| io::Error::other("fake process dropped"))
        }

        fn terminate(&self) -> io::Result<()> {
            self.terminate_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(message) = &self.terminate_error {
                return Err(io::Error::other(message.clone()));
            }
            if let Some(code) = self.exit_on_terminate {
                self.exit(code);
            }
            Ok(())
        }
    }

    pub(crate) struct ChannelReader {
        rx: Receiver<Vec<u8>>,
        pending: Cursor<Vec<u8>>,
    }

    impl ChannelReader {
        pub(crate) fn new() -> (Sender<Vec<u8>>, Self) {
            let (tx, rx) = unbounded();
            (
                tx,
                Self {
                    rx,
                    pending: Cursor::new(Vec::new()),
                },
            )
        }
    }

    impl Read for ChannelReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            loop {
                let n = self.pending.read(buf)?;
                if n > 0 {
                    return Ok(n);
                }
                match self.rx.recv() {
                    Ok(chunk) => self.pending = Cursor::new(chunk),
                    Err(_) => return Ok(0),
                }
            }
        }
    }
}
