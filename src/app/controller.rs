use std::io::Read;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use tracing::info;

use crate::capture::process::{self, ChildProcess};
use crate::capture::{Invocation, ProcessSession, SessionEvent, SessionState, Transcript};

/// What happens to the terminal once the interactive view is torn down.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Exit {
    /// Print every captured line, in order, without tags.
    Dump(Vec<String>),
    Clear,
}

pub(crate) fn failure_line(code: i32, invocation: &Invocation) -> String {
    format!("Command failed: rc = {code}: {invocation}")
}

/// Wires a process session to the transcript, waits for it to drain on a
/// supervisor thread and publishes the final outcome.
pub(crate) struct SessionController {
    invocation: Invocation,
    session: Arc<ProcessSession>,
    transcript: Arc<Transcript>,
    dump_on_exit: bool,
}

impl SessionController {
    pub(crate) fn launch(invocation: Invocation, events: Sender<SessionEvent>) -> Result<Self> {
        let spawned = process::spawn(&invocation)?;
        Self::attach(
            invocation,
            spawned.process,
            spawned.stdout,
            spawned.stderr,
            events,
        )
    }

    pub(crate) fn attach<O, E>(
        invocation: Invocation,
        process: Arc<dyn ChildProcess>,
        stdout: O,
        stderr: E,
        events: Sender<SessionEvent>,
    ) -> Result<Self>
    where
        O: Read + Send + 'static,
        E: Read + Send + 'static,
    {
        let transcript = Arc::new(Transcript::new(events.clone()));
        let session = Arc::new(ProcessSession::start(
            process,
            stdout,
            stderr,
            Arc::clone(&transcript),
        )?);

        {
            let session = Arc::clone(&session);
            let transcript = Arc::clone(&transcript);
            let invocation = invocation.clone();
            thread::Builder::new()
                .name("buildcap-supervisor".to_string())
                .spawn(move || {
                    let drained = session.wait();
                    let outcome = drained.outcome();
                    // Appended only after both streams drained, so it is always last.
                    if outcome.is_failure() {
                        transcript.append(failure_line(outcome.code, &invocation), true);
                    }
                    let outcome = session.finish(drained);
                    info!(code = outcome.code, killed = outcome.killed, "session finished");
                    let _ = events.send(SessionEvent::Finished(outcome));
                })
                .context("start session supervisor")?;
        }

        Ok(Self {
            invocation,
            session,
            transcript,
            dump_on_exit: true,
        })
    }

    pub(crate) fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    pub(crate) fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub(crate) fn state(&self) -> SessionState {
        self.session.state()
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.state().is_finished()
    }

    /// Forwards a kill request while the command runs. Repeats are no-ops.
    pub(crate) fn request_kill(&self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.session.request_kill()
    }

    /// The "clear" action: leave the terminal empty on exit.
    pub(crate) fn suppress_dump(&mut self) {
        self.dump_on_exit = false;
    }

    pub(crate) fn dumps_on_exit(&self) -> bool {
        self.dump_on_exit
    }

    /// Evaluates the dump decision once, consuming the controller.
    pub(crate) fn into_exit(self) -> Exit {
        if self.dumps_on_exit() {
            Exit::Dump(self.transcript.texts())
        } else {
            Exit::Clear
        }
    }
}
