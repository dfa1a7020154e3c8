//! Post-update command specification and runner.

use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use tracing::{debug, info};

use crate::{ExecError, ExecResult};

/// How a post-update command is run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecMode {
    /// Wait for the command to finish and report its exit status.
    #[default]
    Blocking,
    /// Start the command and return immediately.
    ///
    /// Meant for commands that put a long-lived process in the background
    /// themselves, e.g. a service reload.
    Detached,
}

/// A command executed after a repository update.
///
/// Arguments are passed to the program verbatim; no shell is involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    mode: ExecMode,
}

impl CommandSpec {
    /// Creates a blocking command.
    #[must_use]
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            mode: ExecMode::Blocking,
        }
    }

    /// Creates a detached command.
    #[must_use]
    pub fn detached<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(program, args).with_mode(ExecMode::Detached)
    }

    /// Sets the execution mode.
    #[must_use]
    pub fn with_mode(mut self, mode: ExecMode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns the program name.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Returns the arguments.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns the execution mode.
    #[must_use]
    pub fn mode(&self) -> ExecMode {
        self.mode
    }

    /// Renders the program and its arguments separated by spaces.
    #[must_use]
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Runs the command with `dir` as its working directory.
    ///
    /// Blocking commands are waited for; detached commands only have to start.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be started, or if a blocking
    /// command exits unsuccessfully.
    pub fn exec(&self, dir: impl AsRef<Path>) -> ExecResult<()> {
        match self.mode {
            ExecMode::Blocking => self.run_blocking(dir.as_ref()),
            ExecMode::Detached => self.run_detached(dir.as_ref()),
        }
    }

    fn command(&self, dir: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).current_dir(dir).stdin(Stdio::null());
        command
    }

    fn run_blocking(&self, dir: &Path) -> ExecResult<()> {
        debug!(command = %self.command_line(), ?dir, "running command");

        let output = self
            .command(dir)
            .output()
            .map_err(|source| ExecError::Spawn {
                command: self.command_line(),
                source,
            })?;

        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            if !combined.is_empty() && !combined.ends_with('\n') {
                combined.push('\n');
            }
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(ExecError::Failed {
                command: self.command_line(),
                status: output.status,
                output: combined.trim().to_string(),
            });
        }

        info!("Command '{}' successful.", self.command_line());
        Ok(())
    }

    fn run_detached(&self, dir: &Path) -> ExecResult<()> {
        let mut child = self
            .command(dir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ExecError::Spawn {
                command: self.command_line(),
                source,
            })?;

        let command = self.command_line();
        debug!(pid = child.id(), command = %command, "started detached command");

        // Reap the child so it does not linger as a zombie.
        thread::spawn(move || match child.wait() {
            Ok(status) => debug!(command = %command, %status, "detached command exited"),
            Err(e) => debug!(command = %command, error = %e, "failed to wait on detached command"),
        });

        Ok(())
    }
}
