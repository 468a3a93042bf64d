use std::io;
use std::process::{Child, ChildStderr, ChildStdout, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tracing::info;

use super::{Invocation, UNKNOWN_EXIT_CODE};

pub(crate) trait ChildProcess: Send + Sync {
    fn id(&self) -> u32;

    fn wait(&self) -> io::Result<i32>;

    fn terminate(&self) -> io::Result<()>;
}

/// A process launched through `std::process`, killed by pid so that
/// termination does not contend with the blocked `wait`.
pub(crate) struct OsProcess {
    pid: u32,
    child: Mutex<Child>,
    reaped: AtomicBool,
}

impl OsProcess {
    fn new(child: Child) -> Self {
        Self {
            pid: child.id(),
            child: Mutex::new(child),
            reaped: AtomicBool::new(false),
        }
    }
}

impl ChildProcess for OsProcess {
    fn id(&self) -> u32 {
        self.pid
    }

    fn wait(&self) -> io::Result<i32> {
        let mut child = self.child.lock().unwrap_or_else(PoisonError::into_inner);
        let status = child.wait()?;
        self.reaped.store(true, Ordering::Release);
        Ok(exit_code(status))
    }

    fn terminate(&self) -> io::Result<()> {
        // After reaping, the pid may belong to someone else.
        if self.reaped.load(Ordering::Acquire) {
            return Err(io::Error::other("process already finished"));
        }
        let pid = i32::try_from(self.pid)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
        kill(Pid::from_raw(pid), Signal::SIGKILL).map_err(io::Error::from)
    }
}

pub(crate) fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(UNKNOWN_EXIT_CODE)
}

pub(crate) struct Spawned {
    pub(crate) process: Arc<dyn ChildProcess>,
    pub(crate) stdout: ChildStdout,
    pub(crate) stderr: ChildStderr,
}

pub(crate) fn spawn(invocation: &Invocation) -> Result<Spawned> {
    let mut cmd = invocation.command();
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    let mut child = cmd
        .spawn()
        .with_context(|| format!("start command `{invocation}`"))?;

    let stdout = child.stdout.take().context("capture stdout pipe")?;
    let stderr = child.stderr.take().context("capture stderr pipe")?;
    info!(
        pid = child.id(),
        program = invocation.program(),
        args = invocation.args().len(),
        "process started"
    );

    Ok(Spawned {
        process: Arc::new(OsProcess::new(child)),
        stdout,
        stderr,
    })
}
