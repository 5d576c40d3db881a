//! Designated code-requirement extraction and compilation.
//!
//! A TCC authorization row identifies its client by a compiled
//! code-signing requirement, not by path. This module derives that blob
//! from an installed, signed bundle in two steps:
//!
//! 1. `codesign -d -r- <bundle>` displays the bundle's requirement set;
//!    the `designated => …` line carries the requirement source text.
//! 2. `csreq -r- -b <out>` compiles the source text (fed on stdin) into
//!    the binary form the TCC store embeds.
//!
//! The compiler's output file lives in a scratch directory that is
//! removed on every exit path, including panics.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info};

use crate::command::{CommandError, CommandRunner, CommandSpec};

static DESIGNATED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"designated\s*=>\s*(.+)").expect("designated requirement pattern is valid")
});

/// Errors raised while deriving a compiled requirement from a bundle.
#[derive(Debug, Error)]
pub enum RequirementError {
    /// `codesign` exited non-zero for the bundle.
    #[error("`codesign` failed for {bundle} (exit code {exit_code}): {detail}")]
    Inspect {
        /// Bundle path that was inspected.
        bundle: String,
        /// `codesign` exit code.
        exit_code: i32,
        /// Captured diagnostic text.
        detail: String,
    },

    /// The inspection output carried no `designated =>` line. The bundle
    /// is unsigned or the tool output format changed; re-running cannot
    /// help.
    #[error("no designated requirement in `codesign` output for {bundle}")]
    MissingDesignated {
        /// Bundle path that was inspected.
        bundle: String,
    },

    /// `csreq` exited non-zero while compiling the requirement text.
    #[error("`csreq` failed to compile the requirement (exit code {exit_code}): {detail}")]
    Compile {
        /// `csreq` exit code.
        exit_code: i32,
        /// Captured diagnostic text.
        detail: String,
    },

    /// `csreq` reported success but produced no usable output file.
    #[error("`csreq` produced no compiled requirement at {path}")]
    EmptyOutput {
        /// Expected output file path.
        path: String,
    },

    /// A tool invocation could not be driven at all.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Filesystem error around the scratch directory.
    #[error("I/O error during requirement extraction: {0}")]
    Io(#[from] std::io::Error),
}

/// Read the designated requirement source text of a signed bundle.
///
/// # Errors
///
/// Returns [`RequirementError::Inspect`] when `codesign` exits non-zero
/// and [`RequirementError::MissingDesignated`] when its output carries no
/// `designated =>` line.
pub fn designated_requirement(
    runner: &dyn CommandRunner,
    bundle_path: &Path,
) -> Result<String, RequirementError> {
    let bundle = bundle_path.display().to_string();

    let output = runner.run(
        &CommandSpec::new("codesign")
            .arg("-d")
            .arg("-r-")
            .arg(&bundle),
    )?;
    if !output.success() {
        return Err(RequirementError::Inspect {
            bundle,
            exit_code: output.exit_code,
            detail: output.diagnostic("(no diagnostic output)"),
        });
    }

    let text = output.stdout_text();
    let captures = DESIGNATED_RE
        .captures(&text)
        .ok_or(RequirementError::MissingDesignated { bundle })?;

    Ok(captures[1].trim().to_string())
}

/// Derive the compiled code-requirement blob for a signed bundle.
///
/// # Errors
///
/// Returns [`RequirementError`] when either tool fails, the designated
/// requirement cannot be found, or the compiled output is missing or
/// empty. All failures are fatal to a provisioning run; the underlying
/// condition (bad or absent signature) does not change on re-attempt.
pub fn compiled_requirement(
    runner: &dyn CommandRunner,
    bundle_path: &Path,
) -> Result<Vec<u8>, RequirementError> {
    let requirement = designated_requirement(runner, bundle_path)?;
    debug!(requirement = %requirement, "compiling designated requirement");

    // RAII scratch dir: removed on success, error, and unwind alike.
    let scratch = TempDir::new()?;
    let out_path = scratch.path().join("csreq.bin");
    let out_path_text = out_path.display().to_string();

    let output = runner.run(
        &CommandSpec::new("csreq")
            .arg("-r-")
            .arg("-b")
            .arg(&out_path_text)
            .stdin(requirement.into_bytes()),
    )?;
    if !output.success() {
        return Err(RequirementError::Compile {
            exit_code: output.exit_code,
            detail: output.diagnostic("(no diagnostic output)"),
        });
    }

    let bytes = match std::fs::read(&out_path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(RequirementError::EmptyOutput {
                path: out_path_text,
            });
        }
        Err(e) => return Err(RequirementError::Io(e)),
    };
    if bytes.is_empty() {
        return Err(RequirementError::EmptyOutput {
            path: out_path_text,
        });
    }

    info!(
        bundle = %bundle_path.display(),
        size = bytes.len(),
        "compiled designated requirement"
    );
    Ok(bytes)
}
