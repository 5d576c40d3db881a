//! Unattended TCC authorization-record writer.
//!
//! Headless machines cannot answer the consent dialog the privacy
//! subsystem normally raises, so the grant is written straight into the
//! access-control store: one `INSERT OR REPLACE` row in the `access`
//! table of `TCC.db`, executed through `sudo sqlite3`. The row says
//! "client application X may exercise capability Y" and embeds the
//! client's compiled code requirement as a hex blob.
//!
//! `(service, client)` is the table's natural key, so the write is an
//! upsert: re-running provisioning leaves exactly one matching row. The
//! store itself arbitrates races with other writers; no application-level
//! locking is layered on top.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::command::{CommandError, CommandRunner, CommandSpec};

/// Well-known path of the system TCC database.
pub const DEFAULT_TCC_DB_PATH: &str = "/Library/Application Support/com.apple.TCC/TCC.db";

/// Service identifier of the accessibility (UI automation) capability.
pub const ACCESSIBILITY_SERVICE: &str = "kTCCServiceAccessibility";

/// Bundle identifier of the automation host granted access by default.
pub const TERMINAL_BUNDLE_ID: &str = "com.apple.Terminal";

/// Bundle path matching [`TERMINAL_BUNDLE_ID`], used to derive the
/// client's code requirement.
pub const TERMINAL_APP_PATH: &str = "/System/Applications/Utilities/Terminal.app";

/// Errors raised while writing the authorization record.
#[derive(Debug, Error)]
pub enum TccError {
    /// The administrative channel reported a non-zero exit. Either the
    /// store rejected the statement or no privilege escalation is
    /// available; both abort the provisioning run.
    #[error("failed to apply changes to the TCC database (exit code {exit_code}): {detail}")]
    WriteFailed {
        /// `sudo sqlite3` exit code.
        exit_code: i32,
        /// Captured diagnostic text.
        detail: String,
    },

    /// The administrative channel could not be invoked at all.
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Parameters of the authorization row, passed explicitly so tests and
/// configuration can substitute alternate capability or client targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessGrant {
    /// Protected capability being granted.
    pub service: String,
    /// Bundle identifier of the client application being authorized.
    pub client: String,
    /// Bundle path of the client application; its designated requirement
    /// identifies the client in the store.
    pub client_app_path: PathBuf,
    /// Client key discriminator; `0` keys the row by bundle identifier.
    pub client_type: i64,
    /// Authorization outcome; `2` is "allowed".
    pub auth_value: i64,
    /// Provenance code; `4` marks a deliberate administrator override
    /// rather than an interactive user grant.
    pub auth_reason: i64,
    /// Schema version of the record.
    pub auth_version: i64,
    /// Path of the access-control store to mutate.
    pub db_path: PathBuf,
}

impl Default for AccessGrant {
    fn default() -> Self {
        Self {
            service: ACCESSIBILITY_SERVICE.to_string(),
            client: TERMINAL_BUNDLE_ID.to_string(),
            client_app_path: PathBuf::from(TERMINAL_APP_PATH),
            client_type: 0,
            auth_value: 2,
            auth_reason: 4,
            auth_version: 1,
            db_path: PathBuf::from(DEFAULT_TCC_DB_PATH),
        }
    }
}

impl AccessGrant {
    /// Build the upsert statement embedding `csreq` as a hex blob.
    ///
    /// The hex encoding is lowercase with no separators, matching the
    /// `X'…'` literal form SQLite decodes back to the original bytes.
    #[must_use]
    pub fn statement(&self, csreq: &[u8]) -> String {
        format!(
            "INSERT OR REPLACE INTO access \
             (service, client, client_type, auth_value, auth_reason, auth_version, csreq) \
             VALUES('{}','{}',{},{},{},{},X'{}');",
            self.service,
            self.client,
            self.client_type,
            self.auth_value,
            self.auth_reason,
            self.auth_version,
            hex::encode(csreq)
        )
    }
}

/// Write the authorization row granting `grant.client` the capability
/// `grant.service`, identified by the compiled requirement `csreq`.
///
/// Idempotent: the statement is an upsert keyed by `(service, client)`,
/// so repeated runs leave exactly one matching row with the latest
/// values.
///
/// # Errors
///
/// Returns [`TccError::WriteFailed`] with the exit code and captured
/// diagnostics when `sudo sqlite3` exits non-zero. There is no retry; a
/// failed grant means the run must stop rather than proceed silently
/// unauthorized.
pub fn grant_automation_access(
    runner: &dyn CommandRunner,
    grant: &AccessGrant,
    csreq: &[u8],
) -> Result<(), TccError> {
    let statement = grant.statement(csreq);

    let output = runner.run(
        &CommandSpec::new("sudo")
            .arg("sqlite3")
            .arg(grant.db_path.display().to_string())
            .arg(&statement),
    )?;
    if !output.success() {
        return Err(TccError::WriteFailed {
            exit_code: output.exit_code,
            detail: output.diagnostic("(unknown SQLite error)"),
        });
    }

    info!(
        client = %grant.client,
        service = %grant.service,
        "authorization record written"
    );
    Ok(())
}
