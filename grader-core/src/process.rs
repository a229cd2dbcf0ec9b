//! External process execution for tool runs.

use std::process::Stdio;

use log::debug;
use tokio::process::Command;
use tokio::time::timeout;

use crate::command::Invocation;
use crate::error::{GraderError, Result};

/// Captured output of a finished process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessOutput {
    /// Exit code, `None` when terminated by a signal.
    pub status: Option<i32>,
    /// Standard output split into lines.
    pub stdout: Vec<String>,
    /// Standard error split into lines.
    pub stderr: Vec<String>,
}

impl ProcessOutput {
    /// Output from a successful run with the given stdout lines.
    pub fn success<I, S>(stdout: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            status: Some(0),
            stdout: stdout.into_iter().map(Into::into).collect(),
            stderr: Vec::new(),
        }
    }

    /// Whether the process exited with status zero.
    pub fn succeeded(&self) -> bool {
        self.status == Some(0)
    }

    /// Whether both streams are blank.
    pub fn is_blank(&self) -> bool {
        self.stdout
            .iter()
            .chain(self.stderr.iter())
            .all(|line| line.trim().is_empty())
    }

    /// Trimmed stderr joined into a single line, for error messages.
    pub fn stderr_excerpt(&self) -> String {
        self.stderr
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Runs an invocation and captures its output.
#[cfg_attr(test, mockall::automock)]
pub trait ProcessRunner {
    /// Run to completion or until the invocation's timeout elapses.
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput>;
}

/// Runs invocations through `sh -c` on a dedicated Tokio runtime.
///
/// The shell is killed when the timeout elapses, even if a background
/// descendant still holds the output pipes open.
#[derive(Debug, Default, Clone)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    /// Create a new process runner.
    pub fn new() -> Self {
        Self
    }

    /// Run an invocation on the caller's runtime.
    pub async fn run_async(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        debug!(
            "running `{}` in {}",
            invocation.command,
            invocation.working_dir.display()
        );
        let failure = |reason: String| GraderError::ToolExecution {
            tool: invocation.tool.to_string(),
            reason,
        };

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&invocation.command)
            .current_dir(&invocation.working_dir)
            .envs(invocation.env.iter().map(|(key, value)| (key, value)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match timeout(invocation.timeout, cmd.output()).await {
            Ok(Ok(output)) => Ok(ProcessOutput {
                status: output.status.code(),
                stdout: split_lines(&output.stdout),
                stderr: split_lines(&output.stderr),
            }),
            Ok(Err(err)) => Err(failure(format!(
                "could not run `{}`: {err}",
                invocation.command
            ))),
            Err(_) => Err(failure(format!(
                "timed out after {}s",
                invocation.timeout.as_secs_f64()
            ))),
        }
    }
}

impl ProcessRunner for TokioProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.run_async(invocation))
    }
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::to_string)
        .collect()
}
