//! Static configuration-policy application.
//!
//! Policies are vendor-specific shell scripts (update channel, telemetry,
//! first-run suppression) shipped next to the binary. A missing script is
//! skipped so one configuration set can serve several application
//! versions; a failing script aborts provisioning.

use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::command::{CommandError, CommandRunner, CommandSpec};

/// Errors raised while applying policy scripts.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A policy script exited non-zero.
    #[error("policy script `{script}` failed (exit code {exit_code}): {detail}")]
    ScriptFailed {
        /// Script name that failed.
        script: String,
        /// `bash` exit code.
        exit_code: i32,
        /// Captured diagnostic text.
        detail: String,
    },

    /// A tool invocation could not be driven at all.
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Apply the named policy scripts from `dir`, in order.
///
/// Scripts run through `bash` with `dir` as working directory. Scripts
/// that do not exist are skipped with a log line.
///
/// # Errors
///
/// Returns [`PolicyError::ScriptFailed`] on the first script that exits
/// non-zero.
pub fn apply_policies(
    runner: &dyn CommandRunner,
    dir: &Path,
    scripts: &[String],
) -> Result<(), PolicyError> {
    for script in scripts {
        let path = dir.join(script);
        if !path.exists() {
            info!(script = %script, "skipping policy script: not present");
            continue;
        }

        info!(script = %script, "applying policy script");
        let output = runner.run(
            &CommandSpec::new("bash")
                .arg(path.display().to_string())
                .current_dir(dir),
        )?;
        if !output.success() {
            return Err(PolicyError::ScriptFailed {
                script: script.clone(),
                exit_code: output.exit_code,
                detail: output.diagnostic("(no diagnostic output)"),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{output, FakeRunner};

    #[test]
    fn missing_scripts_are_skipped_without_invocation() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::new();

        apply_policies(&runner, dir.path(), &["absent.sh".to_string()]).unwrap();
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn present_scripts_run_with_policy_dir_as_cwd() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("policy_one.sh"), "#!/bin/bash\n").unwrap();

        let runner = FakeRunner::new();
        runner.expect(|spec| {
            assert_eq!(spec.program, "bash");
            assert!(spec.args[0].ends_with("policy_one.sh"));
            assert!(spec.cwd.is_some());
            Ok(output(0, "", ""))
        });

        apply_policies(
            &runner,
            dir.path(),
            &["policy_one.sh".to_string(), "absent.sh".to_string()],
        )
        .unwrap();
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn failing_script_aborts_with_its_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.sh"), "#!/bin/bash\nexit 7\n").unwrap();

        let runner = FakeRunner::new();
        runner.expect(|_| Ok(output(7, "", "defaults write failed\n")));

        let err = apply_policies(&runner, dir.path(), &["bad.sh".to_string()]).unwrap_err();
        match err {
            PolicyError::ScriptFailed {
                script, exit_code, ..
            } => {
                assert_eq!(script, "bad.sh");
                assert_eq!(exit_code, 7);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
