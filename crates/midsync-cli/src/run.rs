//! Run execution
//!
//! Wires the Midas adapter, the local filesystem adapter, the deletion
//! confirmation strategy and the presenter into a [`SyncDriver`], runs
//! one pass and maps its outcome to an exit code.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use midsync_core::config::Config;
use midsync_core::domain::SyncSettings;
use midsync_core::ports::{FixedAnswer, IConfirmation};
use midsync_midas::{MidasClient, MidasRemoteStore};
use midsync_sync::confirm::TerminalPrompt;
use midsync_sync::driver::SyncDriver;
use midsync_sync::filesystem::LocalFileSystemAdapter;
use tracing::info;

use crate::output::OutputFormat;
use crate::presenter::CliPresenter;
use crate::Cli;

/// Strategy answering the remote deletion question
fn confirmation_for(cli: &Cli) -> Arc<dyn IConfirmation> {
    if cli.yes {
        Arc::new(FixedAnswer(true))
    } else if cli.no_delete {
        Arc::new(FixedAnswer(false))
    } else {
        Arc::new(TerminalPrompt::new())
    }
}

/// Runs one synchronization pass
///
/// Returns the exit code for a completed run; errors that abort the run
/// are returned for the caller to report.
pub async fn execute(
    cli: &Cli,
    config: &Config,
    settings: &SyncSettings,
    format: OutputFormat,
) -> Result<ExitCode> {
    info!(
        mode = %settings.mode(),
        local_root = %settings.local_root().display(),
        remote_root = %settings.root_locator(),
        "Starting run"
    );

    let client = MidasClient::with_timeout(
        settings.endpoint(),
        Duration::from_secs(config.remote.timeout_secs),
    )
    .context("Failed to create HTTP client")?;

    let driver = SyncDriver::new(
        Arc::new(MidasRemoteStore::new(client)),
        Arc::new(LocalFileSystemAdapter::new()),
        confirmation_for(cli),
        Arc::new(CliPresenter::new(format)),
    );

    let outcome = driver
        .run(settings)
        .await
        .with_context(|| format!("{} run aborted", settings.mode()))?;

    // Check runs never mirror, so they always exit 0 once the report is shown
    if outcome.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
