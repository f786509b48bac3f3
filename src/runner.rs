//! Runs the reported command through a shell and captures what it produced.

use std::process::{Command, ExitStatus, Stdio};

use log::{debug, info, trace};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Failed to launch '{shell}': {source}")]
    Launch {
        shell: String,
        #[source]
        source: std::io::Error,
    },
}

/// Everything the command left behind. A non-zero `exit_code` is a normal
/// result, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: i32,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

pub struct ShellRunner {
    shell: String,
}

impl ShellRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    /// Run `command` as `<shell> -c <command>` and block until it exits.
    ///
    /// Stdin is closed. There is no timeout: a command that never exits
    /// keeps the report from being sent.
    pub fn run(&self, command: &str) -> Result<ExecutionResult, RunnerError> {
        info!("Running command via {}: {}", self.shell, command);

        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| RunnerError::Launch {
                shell: self.shell.clone(),
                source,
            })?;

        let exit_code = exit_code(output.status);
        info!("Command exited with status {}", exit_code);
        trace!(
            "Command output: stdout_bytes={} stderr_bytes={}",
            output.stdout.len(),
            output.stderr.len()
        );
        if output.status.code().is_none() {
            debug!("Command terminated without an exit code: {}", output.status);
        }

        Ok(ExecutionResult {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code,
        })
    }
}

/// Killed processes report the negated signal number.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}
