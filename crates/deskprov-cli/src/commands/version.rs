//! Installed-version report.

use anyhow::Result;
use deskprov_core::command::SystemRunner;
use deskprov_core::{bundle, ProvisionConfig};

use super::ensure_macos;

/// Print the installed application's version and build.
pub fn run(config: &ProvisionConfig) -> Result<()> {
    ensure_macos()?;

    let version = bundle::installed_version(&SystemRunner, &config.app.path);
    println!("{} version {version}", config.app.path.display());
    Ok(())
}
