//! Installed-bundle metadata via `defaults read`.

use std::fmt;
use std::path::Path;

use thiserror::Error;
use tracing::error;

use crate::command::{CommandError, CommandRunner, CommandSpec};

/// Placeholder used when a property-list value cannot be read.
pub const UNKNOWN_VALUE: &str = "(unknown)";

/// Errors raised while reading a property-list value.
#[derive(Debug, Error)]
pub enum PlistError {
    /// `defaults` exited non-zero for the requested key.
    #[error("`defaults` failed to read {key} from {plist} (exit code {exit_code}): {detail}")]
    ReadFailed {
        /// Property list that was read.
        plist: String,
        /// Key that was requested.
        key: String,
        /// `defaults` exit code.
        exit_code: i32,
        /// Captured diagnostic text.
        detail: String,
    },

    /// The tool invocation could not be driven at all.
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Marketing version and build number of an installed bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleVersion {
    /// `CFBundleShortVersionString`, or [`UNKNOWN_VALUE`].
    pub version: String,
    /// Final dot-separated component of `CFBundleVersion`, or
    /// [`UNKNOWN_VALUE`].
    pub build: String,
}

impl fmt::Display for BundleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.version, self.build)
    }
}

/// Read a single value from a property list.
///
/// # Errors
///
/// Returns [`PlistError::ReadFailed`] when `defaults` exits non-zero.
pub fn read_plist_value(
    runner: &dyn CommandRunner,
    plist_path: &Path,
    key: &str,
) -> Result<String, PlistError> {
    let output = runner.run(
        &CommandSpec::new("defaults")
            .arg("read")
            .arg(plist_path.display().to_string())
            .arg(key),
    )?;
    if !output.success() {
        return Err(PlistError::ReadFailed {
            plist: plist_path.display().to_string(),
            key: key.to_string(),
            exit_code: output.exit_code,
            detail: output.diagnostic("(no diagnostic output)"),
        });
    }

    Ok(output.stdout_text().trim().to_string())
}

/// Read the installed version of the bundle at `app_path`.
///
/// Version reporting never aborts provisioning: unreadable values
/// degrade to [`UNKNOWN_VALUE`] with a logged error.
pub fn installed_version(runner: &dyn CommandRunner, app_path: &Path) -> BundleVersion {
    let plist = app_path.join("Contents").join("Info.plist");

    let version = match read_plist_value(runner, &plist, "CFBundleShortVersionString") {
        Ok(value) => value,
        Err(e) => {
            error!(plist = %plist.display(), "failed to read bundle version: {e}");
            UNKNOWN_VALUE.to_string()
        }
    };

    let build = match read_plist_value(runner, &plist, "CFBundleVersion") {
        Ok(raw) if !raw.is_empty() => raw
            .split('.')
            .next_back()
            .unwrap_or(UNKNOWN_VALUE)
            .to_string(),
        Ok(_) => UNKNOWN_VALUE.to_string(),
        Err(e) => {
            error!(plist = %plist.display(), "failed to read bundle build: {e}");
            UNKNOWN_VALUE.to_string()
        }
    };

    BundleVersion { version, build }
}
