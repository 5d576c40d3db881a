//! External tool invocation seam.
//!
//! Every side effect in this crate runs through the [`CommandRunner`]
//! trait so provisioning logic (output parsing, statement construction,
//! encoding) stays testable with a scripted runner. The production
//! implementation is [`SystemRunner`], a blocking wrapper around
//! [`std::process::Command`].

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::debug;

/// Errors raised while spawning or driving an external command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The child process could not be spawned.
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// I/O failed while feeding stdin or collecting output.
    #[error("I/O error while running `{program}`: {source}")]
    Io {
        /// Program being driven when the error occurred.
        program: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
}

/// Specification of a single external command invocation.
#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    /// Program name or path.
    pub program: String,
    /// Positional arguments, in order.
    pub args: Vec<String>,
    /// Bytes written to the child's stdin; stdin is closed after the write.
    /// `None` attaches a null stdin.
    pub stdin: Option<Vec<u8>>,
    /// Working directory for the child. `None` inherits the parent's.
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    /// Create a spec for `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Append a single argument.
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

    /// Provide bytes for the child's stdin.
    #[must_use]
    pub fn stdin(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(bytes.into());
        self
    }

    /// Set the child's working directory.
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    /// Process exit code; `-1` when terminated by a signal.
    pub exit_code: i32,
    /// Raw standard output.
    pub stdout: Vec<u8>,
    /// Raw standard error.
    pub stderr: Vec<u8>,
}

impl CapturedOutput {
    /// Whether the command exited with code zero.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Standard output as lossily-decoded text.
    #[must_use]
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Standard error as lossily-decoded text.
    #[must_use]
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Best-effort diagnostic text for error reporting: trimmed stderr
    /// when non-empty, then trimmed stdout, then `placeholder`.
    #[must_use]
    pub fn diagnostic(&self, placeholder: &str) -> String {
        let stderr = self.stderr_text();
        let stderr = stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout_text();
        let stdout = stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        placeholder.to_string()
    }
}

/// Runs external commands to completion, capturing their output.
pub trait CommandRunner {
    /// Run `spec` to completion.
    ///
    /// A non-zero exit code is not an error at this layer; callers decide
    /// what a failing tool means for them.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] when the process cannot be spawned or its
    /// stdio cannot be driven.
    fn run(&self, spec: &CommandSpec) -> Result<CapturedOutput, CommandError>;
}

/// Blocking [`CommandRunner`] backed by [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CapturedOutput, CommandError> {
        debug!(program = %spec.program, args = ?spec.args, "running external command");

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(if spec.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(|e| CommandError::Spawn {
            program: spec.program.clone(),
            source: e,
        })?;

        if let Some(bytes) = &spec.stdin {
            if let Some(mut handle) = child.stdin.take() {
                handle
                    .write_all(bytes)
                    .map_err(|e| CommandError::Io {
                        program: spec.program.clone(),
                        source: e,
                    })?;
                // Handle drops here, closing the pipe so the child sees EOF.
            }
        }

        let output = child.wait_with_output().map_err(|e| CommandError::Io {
            program: spec.program.clone(),
            source: e,
        })?;

        Ok(CapturedOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout_and_exit_code() {
        let output = SystemRunner
            .run(&CommandSpec::new("sh").args(["-c", "echo hello"]))
            .unwrap();

        assert!(output.success());
        assert_eq!(output.stdout_text().trim(), "hello");
        assert!(output.stderr.is_empty());
    }

    #[test]
    fn captures_nonzero_exit_code() {
        let output = SystemRunner
            .run(&CommandSpec::new("sh").args(["-c", "echo oops >&2; exit 3"]))
            .unwrap();

        assert!(!output.success());
        assert_eq!(output.exit_code, 3);
        assert_eq!(output.stderr_text().trim(), "oops");
    }

    #[test]
    fn feeds_stdin_to_child() {
        let output = SystemRunner
            .run(&CommandSpec::new("cat").stdin(&b"requirement text"[..]))
            .unwrap();

        assert!(output.success());
        assert_eq!(output.stdout, b"requirement text");
    }

    #[test]
    fn honors_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let canonical = dir.path().canonicalize().unwrap();

        let output = SystemRunner
            .run(&CommandSpec::new("pwd").current_dir(&canonical))
            .unwrap();

        assert_eq!(output.stdout_text().trim(), canonical.to_str().unwrap());
    }

    #[test]
    fn spawn_failure_is_reported() {
        let err = SystemRunner
            .run(&CommandSpec::new("deskprov-nonexistent-tool-57214"))
            .unwrap_err();

        assert!(matches!(err, CommandError::Spawn { .. }));
    }

    #[test]
    fn diagnostic_prefers_stderr_then_stdout_then_placeholder() {
        let both = CapturedOutput {
            exit_code: 1,
            stdout: b"out\n".to_vec(),
            stderr: b"err\n".to_vec(),
        };
        assert_eq!(both.diagnostic("(none)"), "err");

        let stdout_only = CapturedOutput {
            exit_code: 1,
            stdout: b"out\n".to_vec(),
            stderr: Vec::new(),
        };
        assert_eq!(stdout_only.diagnostic("(none)"), "out");

        let silent = CapturedOutput {
            exit_code: 1,
            stdout: Vec::new(),
            stderr: b"  \n".to_vec(),
        };
        assert_eq!(silent.diagnostic("(none)"), "(none)");
    }
}
