//! Subprocess plumbing for driving the scanner CLI. Everything above this
//! module goes through the [`CommandRunner`] trait, so the process layer can
//! be substituted in tests without touching the orchestration logic.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::debug;

/// Longest stderr excerpt carried inside a [`ProcessError::Failed`].
const STDERR_EXCERPT_CHARS: usize = 500;

/// An executable plus its arguments, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    argv: Vec<String>,
}

impl CommandLine {
    /// Build a command line from a program name (or path) and its arguments.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = vec![program.into()];
        argv.extend(args.into_iter().map(Into::into));
        Self { argv }
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv.join(" "))
    }
}

/// Where a command runs. The default inherits the parent's working directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionContext {
    working_dir: Option<PathBuf>,
}

impl ExecutionContext {
    /// Run the command with `dir` as its working directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: Some(dir.into()),
        }
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }
}

/// Captured output of a finished process.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl ExecutionOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Failure while launching a command or collecting its output.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The executable could not be started or its streams could not be read.
    #[error("failed to run `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("`{program}` exited with code {code}: {stderr}")]
    Failed {
        program: String,
        code: i32,
        stderr: String,
    },
    #[error("`{program}` was terminated before exiting normally")]
    Terminated { program: String },
    #[error("`{program}` produced output that was not valid UTF-8")]
    NonUtf8Output { program: String },
}

/// Launches external commands and waits for them to finish.
///
/// Implementations run exactly one process per call and must not retry.
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion and capture its output, successful or
    /// not. `Err` is reserved for launch and capture problems.
    fn execute(
        &self,
        command: &CommandLine,
        context: &ExecutionContext,
    ) -> Result<ExecutionOutcome, ProcessError>;

    /// Run the command and return its stdout, treating any unsuccessful exit
    /// as an error.
    fn run(
        &self,
        command: &CommandLine,
        context: &ExecutionContext,
    ) -> Result<String, ProcessError> {
        let outcome = self.execute(command, context)?;
        if outcome.success() {
            return Ok(outcome.stdout);
        }
        match outcome.exit_code {
            Some(code) => Err(ProcessError::Failed {
                program: command.program().to_owned(),
                code,
                stderr: stderr_excerpt(&outcome.stderr),
            }),
            None => Err(ProcessError::Terminated {
                program: command.program().to_owned(),
            }),
        }
    }
}

/// [`CommandRunner`] backed by the operating system.
///
/// Calls block until the child process exits; there is no built-in timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn execute(
        &self,
        command: &CommandLine,
        context: &ExecutionContext,
    ) -> Result<ExecutionOutcome, ProcessError> {
        let mut invocation = Command::new(command.program());
        invocation.args(command.args()).stdin(Stdio::null());
        if let Some(dir) = context.working_dir() {
            invocation.current_dir(dir);
        }
        debug!(command = %command, cwd = ?context.working_dir(), "spawning process");

        let output = invocation.output().map_err(|source| ProcessError::Io {
            program: command.program().to_owned(),
            source,
        })?;
        let stdout =
            String::from_utf8(output.stdout).map_err(|_| ProcessError::NonUtf8Output {
                program: command.program().to_owned(),
            })?;
        Ok(ExecutionOutcome {
            stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}

fn stderr_excerpt(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::from("no diagnostic output");
    }
    let mut excerpt: String = trimmed.chars().take(STDERR_EXCERPT_CHARS).collect();
    if trimmed.chars().count() > STDERR_EXCERPT_CHARS {
        excerpt.push_str("...");
    }
    excerpt
}
