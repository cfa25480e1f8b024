//! Synchronization driver
//!
//! The [`SyncDriver`] runs one synchronization pass for a mode:
//!
//! - **check**: diff, present, stop
//! - **upload**: diff, present; if anything differs, mirror the report,
//!   present the mirror summary, diff again and present the final report
//! - **download**: diff (informational), present; if the local root is
//!   empty, download the remote root, then diff again and present
//!
//! Every run starts from a fresh report; nothing is persisted between
//! runs.

use std::sync::Arc;

use midsync_core::domain::{DiffReport, MirrorSummary, Session, SyncMode, SyncSettings};
use midsync_core::ports::{
    IConfirmation, ILocalFileSystem, IRemoteStore, IReportPresenter, ReportStage,
};
use tracing::info;

use crate::differ::TreeDiffer;
use crate::mirror::MirrorExecutor;
use crate::resolver::DestinationResolver;
use crate::{sanity, SyncError};

/// Result of one run
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    /// Report of the first diff pass
    pub initial: DiffReport,
    /// What the mirror step did, if it ran
    pub summary: Option<MirrorSummary>,
    /// Report of the diff pass after mirroring
    pub final_report: Option<DiffReport>,
}

impl RunOutcome {
    /// True unless a mirror entry failed
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.summary.as_ref().map_or(true, MirrorSummary::is_success)
    }
}

/// Orchestrates sanity check, diff, mirror and re-check
pub struct SyncDriver {
    remote: Arc<dyn IRemoteStore>,
    presenter: Arc<dyn IReportPresenter>,
    differ: TreeDiffer,
    mirror: MirrorExecutor,
    resolver: DestinationResolver,
}

impl SyncDriver {
    /// Creates a new `SyncDriver`
    ///
    /// # Arguments
    /// * `remote` - Remote store operations (IRemoteStore)
    /// * `local` - Local tree reads (ILocalFileSystem)
    /// * `confirmation` - Answers the remote deletion question (IConfirmation)
    /// * `presenter` - Receives reports and summaries (IReportPresenter)
    pub fn new(
        remote: Arc<dyn IRemoteStore>,
        local: Arc<dyn ILocalFileSystem>,
        confirmation: Arc<dyn IConfirmation>,
        presenter: Arc<dyn IReportPresenter>,
    ) -> Self {
        Self {
            differ: TreeDiffer::new(Arc::clone(&remote), Arc::clone(&local)),
            mirror: MirrorExecutor::new(Arc::clone(&remote), local, confirmation),
            resolver: DestinationResolver::new(Arc::clone(&remote)),
            remote,
            presenter,
        }
    }

    /// Checks the local root, logs in, verifies remote access, then runs
    ///
    /// # Errors
    /// Any sanity check failure aborts before the first diff; see
    /// [`SyncDriver::run_with_session`] for the rest
    pub async fn run(&self, settings: &SyncSettings) -> Result<RunOutcome, SyncError> {
        sanity::check_local_root(settings).await?;
        let session = sanity::check_remote_access(self.remote.as_ref(), &self.resolver, settings).await?;
        self.run_with_session(settings, &session).await
    }

    /// Runs the mode of `settings` with an existing session
    ///
    /// # Errors
    /// Fails if a diff pass cannot complete or, in download mode, if the
    /// local root is not empty or the remote root cannot be resolved
    #[tracing::instrument(skip_all, fields(mode = %settings.mode()))]
    pub async fn run_with_session(
        &self,
        settings: &SyncSettings,
        session: &Session,
    ) -> Result<RunOutcome, SyncError> {
        let initial = self.diff(settings, session, ReportStage::Initial).await?;
        let mut outcome = RunOutcome {
            initial,
            ..RunOutcome::default()
        };

        match settings.mode() {
            SyncMode::Check => {}
            SyncMode::Upload => {
                if outcome.initial.is_empty() {
                    self.presenter
                        .present_notice("Local and remote trees are already in sync");
                } else {
                    let summary = self
                        .mirror
                        .upload(
                            session,
                            settings.local_root(),
                            settings.root_folder_id(),
                            &outcome.initial,
                        )
                        .await;
                    self.presenter.present_summary(&summary);
                    outcome.summary = Some(summary);
                    outcome.final_report = Some(self.diff(settings, session, ReportStage::Final).await?);
                }
            }
            SyncMode::Download => {
                let summary = self
                    .mirror
                    .download(session, settings.local_root(), settings.root_folder_id())
                    .await?;
                self.presenter.present_summary(&summary);
                outcome.summary = Some(summary);
                outcome.final_report = Some(self.diff(settings, session, ReportStage::Final).await?);
            }
        }

        info!(success = outcome.is_success(), "Run finished");
        Ok(outcome)
    }

    async fn diff(
        &self,
        settings: &SyncSettings,
        session: &Session,
        stage: ReportStage,
    ) -> Result<DiffReport, SyncError> {
        let report = self
            .differ
            .diff(
                session,
                settings.local_root(),
                settings.root_folder_id(),
                settings.endpoint(),
            )
            .await?;
        self.presenter.present_report(
            stage,
            settings.local_root(),
            &settings.root_locator(),
            &report,
        );
        Ok(report)
    }
}
