//! External process execution.
//!
//! [`ProcessRunner`] is a small builder over [`tokio::process::Command`]
//! that merges stderr into stdout and streams the combined output
//! line-by-line to a caller-supplied sink while the process runs. The
//! dependency-probe parser and the preprocessor log forwarding are both
//! built on this.
//!
//! There is deliberately no timeout: probes and preprocessing block until
//! the external tool finishes.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

/// Builder for one external command invocation.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
}

impl ProcessRunner {
    /// Create a runner for `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), args: Vec::new(), current_dir: None }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory.
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// The working directory, if one was set.
    pub fn working_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// Render the command line for logs: flag arguments bare, everything
    /// else quoted.
    pub fn command_string(&self) -> String {
        let mut rendered = vec![format!("\"{}\"", self.program)];
        for arg in &self.args {
            if arg.starts_with('-') {
                rendered.push(arg.clone());
            } else {
                rendered.push(format!("\"{arg}\""));
            }
        }
        rendered.join(" ")
    }

    /// Run the command, feeding each merged output line to `sink`, and
    /// return the exit code (-1 when killed by a signal).
    ///
    /// A nonzero exit is *not* an error here; callers decide whether it is
    /// fatal. Errors are reserved for spawn and stream I/O failures.
    pub async fn run_streaming(&self, mut sink: impl FnMut(&str)) -> Result<i32> {
        let mut command = Command::new(&self.program);
        command.args(&self.args).stdout(Stdio::piped()).stderr(Stdio::piped());
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }

        match self.working_dir() {
            Some(dir) => sink(&format!(
                "-- Running {} in {} --",
                self.command_string(),
                dir.display()
            )),
            None => sink(&format!("-- Running {} --", self.command_string())),
        }
        debug!("spawning {}", self.command_string());

        let mut child = command
            .spawn()
            .with_context(|| format!("failed to spawn '{}'", self.program))?;

        let stdout = child.stdout.take().expect("stdout piped above");
        let stderr = child.stderr.take().expect("stderr piped above");
        let mut stdout_lines = BufReader::new(stdout).lines();
        let mut stderr_lines = BufReader::new(stderr).lines();

        // Drain both streams fully before waiting so the child can never
        // block on a full pipe.
        let (mut stdout_done, mut stderr_done) = (false, false);
        while !(stdout_done && stderr_done) {
            tokio::select! {
                line = stdout_lines.next_line(), if !stdout_done => match line? {
                    Some(line) => sink(&line),
                    None => stdout_done = true,
                },
                line = stderr_lines.next_line(), if !stderr_done => match line? {
                    Some(line) => sink(&line),
                    None => stderr_done = true,
                },
            }
        }

        let status = child.wait().await.context("failed to wait for child process")?;
        Ok(status.code().unwrap_or(-1))
    }

    /// Run the command, collecting output lines instead of streaming them.
    pub async fn run_collect(&self) -> Result<(i32, Vec<String>)> {
        let mut lines = Vec::new();
        let code = self.run_streaming(|line| lines.push(line.to_string())).await?;
        Ok((code, lines))
    }
}
