//! Terminal rendering of diff reports and mirror summaries

use std::path::Path;

use midsync_core::domain::{
    DeletionDecision, DiffReport, MirrorAction, MirrorSummary, RemoteLocator,
};
use midsync_core::ports::{IReportPresenter, ReportStage};

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

const ALL_ACTIONS: [MirrorAction; 6] = [
    MirrorAction::UploadFolder,
    MirrorAction::UploadFile,
    MirrorAction::UploadRevision,
    MirrorAction::DeleteFolder,
    MirrorAction::DeleteItem,
    MirrorAction::Download,
];

/// Presenter writing through the CLI output formatter
pub struct CliPresenter {
    format: OutputFormat,
    formatter: Box<dyn OutputFormatter>,
}

impl CliPresenter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            formatter: get_formatter(format),
        }
    }
}

impl IReportPresenter for CliPresenter {
    fn present_report(
        &self,
        stage: ReportStage,
        local_root: &Path,
        remote_root: &RemoteLocator,
        report: &DiffReport,
    ) {
        match self.format {
            OutputFormat::Json => {
                self.formatter
                    .print_json(&report_json(stage, local_root, remote_root, report));
            }
            OutputFormat::Human => {
                if stage == ReportStage::Final {
                    self.formatter.line("");
                    self.formatter.line("After mirroring:");
                }
                for line in report_lines(local_root, remote_root, report) {
                    self.formatter.line(&line);
                }
            }
        }
    }

    fn present_summary(&self, summary: &MirrorSummary) {
        if self.format == OutputFormat::Json {
            self.formatter.print_json(&serde_json::json!({
                "success": summary.is_success(),
                "summary": summary,
            }));
            return;
        }

        self.formatter.line("");
        if summary.is_success() {
            self.formatter.success("Mirroring completed");
        } else {
            self.formatter.error(&format!(
                "{} of {} entr{} failed",
                summary.failures.len(),
                summary.failures.len() + summary.completed.len(),
                if summary.failures.len() + summary.completed.len() == 1 {
                    "y"
                } else {
                    "ies"
                }
            ));
        }
        for line in summary_lines(summary) {
            self.formatter.info(&line);
        }
    }

    fn present_notice(&self, message: &str) {
        self.formatter.success(message);
    }
}

/// JSON document for one report
pub fn report_json(
    stage: ReportStage,
    local_root: &Path,
    remote_root: &RemoteLocator,
    report: &DiffReport,
) -> serde_json::Value {
    serde_json::json!({
        "stage": stage,
        "local_root": local_root,
        "remote_root": remote_root,
        "in_sync": report.is_empty(),
        "report": report,
    })
}

/// Human-readable lines for one report, heading first
pub fn report_lines(
    local_root: &Path,
    remote_root: &RemoteLocator,
    report: &DiffReport,
) -> Vec<String> {
    let mut lines = vec![format!(
        "The synchronization information between local directory {} and remote folder {} is as below:",
        local_root.display(),
        remote_root
    )];

    if report.is_empty() {
        lines.push("  Local directory and remote folder are in sync.".to_string());
        return lines;
    }

    let mut section = |title: &str, entries: Vec<String>| {
        lines.push(format!("  {title}:"));
        if entries.is_empty() {
            lines.push("    (none)".to_string());
        }
        lines.extend(entries.into_iter().map(|e| format!("    {e}")));
    };

    section(
        "Only in local directory",
        report
            .only_local
            .entire_dirs
            .iter()
            .map(|dir| format!("{}/ (entire directory)", dir.display()))
            .chain(
                report
                    .only_local
                    .files
                    .iter()
                    .map(|f| format!("{} -> folder {}", f.path.display(), f.folder_id)),
            )
            .collect(),
    );
    section(
        "Only in remote folder",
        report
            .only_remote
            .entire_folders
            .iter()
            .map(|f| format!("{} (entire folder {})", f.locator, f.name))
            .chain(
                report
                    .only_remote
                    .items
                    .iter()
                    .map(|i| format!("{} ({})", i.locator, i.name)),
            )
            .collect(),
    );
    section(
        "Needs update",
        report
            .needs_update
            .files
            .iter()
            .map(|u| format!("{} -> item {}", u.path.display(), u.item_id))
            .collect(),
    );
    if !report.unverified.files.is_empty() {
        section(
            "Could not be verified",
            report
                .unverified
                .files
                .iter()
                .map(|u| format!("{}: {}", u.path.display(), u.reason))
                .collect(),
        );
    }

    lines
}

/// Per-action counts, the deletion decision and every failure
pub fn summary_lines(summary: &MirrorSummary) -> Vec<String> {
    let mut lines: Vec<String> = ALL_ACTIONS
        .iter()
        .filter_map(|&action| match summary.count(action) {
            0 => None,
            n => Some(format!("{:<18} {}", format!("{}:", capitalize(action.label())), n)),
        })
        .collect();

    if summary.deletions == DeletionDecision::Declined {
        lines.push("Remote-only entries were kept".to_string());
    }

    for failure in &summary.failures {
        lines.push(format!("  - {}: {}", failure.target, failure.reason));
    }

    lines
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
