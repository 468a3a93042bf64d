use std::fmt;
use std::process::Command;

pub(crate) mod log;
pub(crate) mod process;
pub(crate) mod reader;
pub(crate) mod session;
pub(crate) mod transcript;
pub(crate) mod view;

pub(crate) use log::{Line, LineLog};
pub(crate) use process::ChildProcess;
pub(crate) use session::{ProcessSession, SessionState};
pub(crate) use transcript::{Appended, Transcript};
pub(crate) use view::ViewState;

pub(crate) const UNKNOWN_EXIT_CODE: i32 = -1;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Invocation {
    program: String,
    args: Vec<String>,
}

impl Invocation {
    pub(crate) fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub(crate) fn from_args<I>(args: I) -> Option<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let program = args.next()?;
        if program.is_empty() {
            return None;
        }
        Some(Self::new(program, args.collect()))
    }

    pub(crate) fn program(&self) -> &str {
        &self.program
    }

    pub(crate) fn args(&self) -> &[String] {
        &self.args
    }

    pub(crate) fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Outcome {
    pub(crate) code: i32,
    pub(crate) killed: bool,
}

impl Outcome {
    pub(crate) fn is_failure(&self) -> bool {
        !self.killed && self.code != 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SessionEvent {
    Appended(Appended),
    Finished(Outcome),
}
