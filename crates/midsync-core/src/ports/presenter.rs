//! Report presenter port (driven/secondary port)
//!
//! The synchronization driver hands every diff report and mirror summary
//! it produces to a presenter. The CLI renders them for humans or as JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::newtypes::RemoteLocator;
use crate::domain::report::{DiffReport, MirrorSummary};

/// Which pass of a run produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStage {
    /// Diff computed before any mirroring
    Initial,
    /// Diff recomputed after mirroring
    Final,
}

/// Port trait for displaying synchronization results
pub trait IReportPresenter: Send + Sync {
    /// Displays a diff report between `local_root` and `remote_root`
    fn present_report(
        &self,
        stage: ReportStage,
        local_root: &Path,
        remote_root: &RemoteLocator,
        report: &DiffReport,
    );

    /// Displays what a mirror run did
    fn present_summary(&self, summary: &MirrorSummary);

    /// Displays an informational message
    fn present_notice(&self, message: &str);
}
