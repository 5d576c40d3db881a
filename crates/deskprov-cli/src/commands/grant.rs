//! Standalone UI-automation grant.
//!
//! Useful when the application is already installed (e.g. a baked runner
//! image) and only the authorization record is missing.

use std::path::Path;

use anyhow::{Context, Result};
use deskprov_core::command::SystemRunner;
use deskprov_core::{requirement, tcc, ProvisionConfig};

use super::ensure_macos;

/// Extract the client's compiled requirement and upsert the grant row.
///
/// `bundle` overrides the configured client bundle path; the client must
/// already be installed and signed.
pub fn run(config: &ProvisionConfig, bundle: Option<&Path>) -> Result<()> {
    ensure_macos()?;

    let runner = SystemRunner;
    let bundle_path = bundle.unwrap_or(&config.grant.client_app_path);

    let csreq = requirement::compiled_requirement(&runner, bundle_path)
        .context("code requirement extraction failed")?;
    tcc::grant_automation_access(&runner, &config.grant, &csreq)
        .context("authorization grant failed")?;

    println!(
        "Granted {} permission to automate the user interface.",
        config.grant.client
    );
    Ok(())
}
