//! deskprov - headless macOS desktop-application provisioner.
//!
//! Installs a desktop productivity application and grants a client
//! application the accessibility (UI automation) capability without any
//! interactive consent.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deskprov_core::ProvisionConfig;
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod commands;

/// deskprov - provision desktop applications on headless macOS hosts
#[derive(Parser, Debug)]
#[command(name = "deskprov")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to provisioning configuration file
    #[arg(short, long, default_value = "deskprov.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full pipeline: download, install, policies, automation grant
    Provision,

    /// Write the UI-automation authorization record only
    Grant {
        /// Client application bundle whose code requirement identifies
        /// the grantee (defaults to the configured client bundle)
        #[arg(long)]
        bundle: Option<PathBuf>,
    },

    /// Report the installed application version
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Provision => commands::provision::run(&config),
        Commands::Grant { bundle } => commands::grant::run(&config, bundle.as_deref()),
        Commands::Version => commands::version::run(&config),
    }
}

fn load_config(path: &Path) -> Result<ProvisionConfig> {
    if path.exists() {
        ProvisionConfig::from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))
    } else {
        debug!(path = %path.display(), "no configuration file, using defaults");
        Ok(ProvisionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let config = load_config(Path::new("/nonexistent/deskprov.toml")).unwrap();
        assert_eq!(config.grant.client, "com.apple.Terminal");
    }
}
