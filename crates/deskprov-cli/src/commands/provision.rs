//! Full provisioning pipeline.
//!
//! Strictly sequential; the first failing step aborts the run. The
//! automation grant comes last because it consumes the installed client
//! bundle's code requirement.

use anyhow::{Context, Result};
use deskprov_core::command::SystemRunner;
use deskprov_core::{bundle, installer, policy, requirement, tcc, ProvisionConfig};
use tempfile::TempDir;
use tracing::info;

use super::ensure_macos;

/// Run the whole pipeline against the live system.
pub fn run(config: &ProvisionConfig) -> Result<()> {
    ensure_macos()?;

    let runner = SystemRunner;
    info!(app = %config.app.path.display(), "provisioning application");

    let download_dir = TempDir::new().context("failed to create download directory")?;
    let pkg = installer::download_package(&runner, &config.package, download_dir.path())
        .context("installer download failed")?;
    installer::install_package(&runner, &pkg, &config.app.install_target)
        .context("installation failed")?;

    let version = bundle::installed_version(&runner, &config.app.path);
    println!("Installed {} version {version}", config.app.path.display());

    policy::apply_policies(&runner, &config.policies.dir, &config.policies.scripts)
        .context("policy application failed")?;

    let csreq = requirement::compiled_requirement(&runner, &config.grant.client_app_path)
        .context("code requirement extraction failed")?;
    tcc::grant_automation_access(&runner, &config.grant, &csreq)
        .context("authorization grant failed")?;

    println!(
        "Granted {} permission to automate the user interface.",
        config.grant.client
    );
    Ok(())
}
