//! Subcommand implementations.

pub mod grant;
pub mod provision;
pub mod version;

use anyhow::{bail, Result};

/// Refuse to run on anything but a macOS host; every external tool this
/// binary drives is platform-specific.
pub fn ensure_macos() -> Result<()> {
    let os = std::env::consts::OS;
    if os != "macos" {
        bail!("deskprov supports macOS hosts only (detected platform: '{os}')");
    }
    Ok(())
}
