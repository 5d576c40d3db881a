//! Installer package download and installation.
//!
//! Both steps are thin wrappers over platform commands behind the
//! command seam: `curl` fetches the vendor `.pkg` and `sudo installer`
//! applies it. The download lands in a caller-provided directory so the
//! caller controls its lifetime (the CLI hands in a scoped temp dir).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::command::{CommandError, CommandRunner, CommandSpec};

/// File name of the Microsoft PowerPoint updater package.
pub const POWERPOINT_PACKAGE_NAME: &str = "Microsoft_PowerPoint_16.102.25101829_Updater.pkg";

/// Office CDN URL of [`POWERPOINT_PACKAGE_NAME`].
pub const POWERPOINT_INSTALLER_URL: &str = "https://officecdn.microsoft.com/pr/C1297A47-86C4-4C1F-97FA-950631F94777/MacAutoupdate/Microsoft_PowerPoint_16.102.25101829_Updater.pkg";

/// Default installation target volume/folder.
pub const DEFAULT_INSTALL_TARGET: &str = "/Applications";

/// Errors raised while downloading or applying an installer package.
#[derive(Debug, Error)]
pub enum InstallError {
    /// `curl` exited non-zero while fetching the package.
    #[error("download of {url} failed (exit code {exit_code}): {detail}")]
    DownloadFailed {
        /// URL that was fetched.
        url: String,
        /// `curl` exit code.
        exit_code: i32,
        /// Captured diagnostic text.
        detail: String,
    },

    /// `sudo installer` exited non-zero.
    #[error("installation of {package} failed (exit code {exit_code}): {detail}")]
    InstallerFailed {
        /// Package path handed to the installer.
        package: String,
        /// `installer` exit code.
        exit_code: i32,
        /// Captured diagnostic text.
        detail: String,
    },

    /// A tool invocation could not be driven at all.
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Where the installer package comes from and what to call it on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageSource {
    /// Download URL of the `.pkg`.
    pub url: String,
    /// File name the download is stored under.
    pub file_name: String,
}

impl Default for PackageSource {
    fn default() -> Self {
        Self {
            url: POWERPOINT_INSTALLER_URL.to_string(),
            file_name: POWERPOINT_PACKAGE_NAME.to_string(),
        }
    }
}

/// Download the installer package into `dest_dir` and return its path.
///
/// # Errors
///
/// Returns [`InstallError::DownloadFailed`] when `curl` exits non-zero.
pub fn download_package(
    runner: &dyn CommandRunner,
    source: &PackageSource,
    dest_dir: &Path,
) -> Result<PathBuf, InstallError> {
    let dest = dest_dir.join(&source.file_name);
    info!(url = %source.url, "downloading installer package");

    let output = runner.run(
        &CommandSpec::new("curl")
            .arg("-fsSL")
            .arg("-o")
            .arg(dest.display().to_string())
            .arg(&source.url),
    )?;
    if !output.success() {
        return Err(InstallError::DownloadFailed {
            url: source.url.clone(),
            exit_code: output.exit_code,
            detail: output.diagnostic("(no diagnostic output)"),
        });
    }

    info!(package = %dest.display(), "installer package downloaded");
    Ok(dest)
}

/// Apply the installer package to `target` with administrator rights.
///
/// # Errors
///
/// Returns [`InstallError::InstallerFailed`] when `installer` exits
/// non-zero.
pub fn install_package(
    runner: &dyn CommandRunner,
    pkg_path: &Path,
    target: &str,
) -> Result<(), InstallError> {
    info!(package = %pkg_path.display(), target, "installing application");

    let output = runner.run(
        &CommandSpec::new("sudo")
            .arg("installer")
            .arg("-pkg")
            .arg(pkg_path.display().to_string())
            .arg("-target")
            .arg(target),
    )?;
    if !output.success() {
        return Err(InstallError::InstallerFailed {
            package: pkg_path.display().to_string(),
            exit_code: output.exit_code,
            detail: output.diagnostic("(no diagnostic output)"),
        });
    }

    info!("application installed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{output, FakeRunner};

    #[test]
    fn download_builds_curl_invocation_and_returns_dest() {
        let runner = FakeRunner::new();
        runner.expect(|spec| {
            assert_eq!(spec.program, "curl");
            assert_eq!(spec.args[0], "-fsSL");
            assert_eq!(spec.args[1], "-o");
            assert_eq!(spec.args[2], "/tmp/work/pkg.pkg");
            assert_eq!(spec.args[3], "https://example.com/pkg.pkg");
            Ok(output(0, "", ""))
        });

        let source = PackageSource {
            url: "https://example.com/pkg.pkg".to_string(),
            file_name: "pkg.pkg".to_string(),
        };
        let dest = download_package(&runner, &source, Path::new("/tmp/work")).unwrap();
        assert_eq!(dest, Path::new("/tmp/work/pkg.pkg"));
    }

    #[test]
    fn download_failure_is_fatal() {
        let runner = FakeRunner::new();
        runner.expect(|_| Ok(output(22, "", "curl: (22) The requested URL returned error\n")));

        let err =
            download_package(&runner, &PackageSource::default(), Path::new("/tmp")).unwrap_err();
        assert!(matches!(
            err,
            InstallError::DownloadFailed { exit_code: 22, .. }
        ));
    }

    #[test]
    fn install_runs_installer_with_escalation() {
        let runner = FakeRunner::new();
        runner.expect(|spec| {
            assert_eq!(spec.program, "sudo");
            assert_eq!(
                spec.args,
                [
                    "installer",
                    "-pkg",
                    "/tmp/work/pkg.pkg",
                    "-target",
                    "/Applications"
                ]
            );
            Ok(output(0, "installer: The install was successful.\n", ""))
        });

        install_package(
            &runner,
            Path::new("/tmp/work/pkg.pkg"),
            DEFAULT_INSTALL_TARGET,
        )
        .unwrap();
    }

    #[test]
    fn installer_failure_carries_exit_code() {
        let runner = FakeRunner::new();
        runner.expect(|_| Ok(output(1, "", "installer: Error - the package path specified was invalid\n")));

        let err = install_package(&runner, Path::new("/missing.pkg"), "/Applications").unwrap_err();
        match err {
            InstallError::InstallerFailed {
                exit_code, detail, ..
            } => {
                assert_eq!(exit_code, 1);
                assert!(detail.contains("package path"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
