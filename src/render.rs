//! Plan Rendering
//!
//! Text previews of a diff and reports of an applied sync

use std::fmt::Write;

use colored::Colorize;

use crate::config::Label;
use crate::diff::{summarize, LabelDiff};
use crate::sync::{Progress, SyncOperation, SyncOutcome, SyncResult};

/// Preview of the diff, one line per record
///
/// Matching labels are listed only when `verbose` is set.
pub fn format_diff(diffs: &[LabelDiff], verbose: bool) -> String {
    let mut out = String::from("Analyzing labels...\n");

    for diff in diffs {
        match diff {
            LabelDiff::Match { desired, .. } => {
                if verbose {
                    let _ = writeln!(out, "  {} {} - matches", "✓".green(), desired.name);
                }
            }
            LabelDiff::Create { desired } => {
                let _ = writeln!(
                    out,
                    "  {} {} - will create (color: {})",
                    "+".green(),
                    desired.name.cyan(),
                    desired.normalized_color()
                );
            }
            LabelDiff::Update {
                desired,
                observed,
                color_changed,
                description_changed,
            } => {
                let mut changes = Vec::new();
                if *color_changed {
                    changes.push(format!(
                        "color: {} → {}",
                        observed.normalized_color(),
                        desired.normalized_color()
                    ));
                }
                if *description_changed {
                    changes.push("description".to_string());
                }
                let _ = writeln!(
                    out,
                    "  {} {} - differs ({})",
                    "~".yellow(),
                    desired.name.cyan(),
                    changes.join(", ")
                );
            }
            LabelDiff::Extra { observed } => {
                let _ = writeln!(
                    out,
                    "  {} {} - exists but not in file",
                    "⚠".yellow(),
                    observed.name
                );
            }
        }
    }

    out
}

/// Per-kind counts, worded by whether updates/deletions are enabled
///
/// Categories with no records are omitted.
pub fn format_summary(diffs: &[LabelDiff], update_enabled: bool, delete_enabled: bool) -> String {
    let summary = summarize(diffs);
    let mut out = String::from("\nSummary:\n");

    if summary.matches > 0 {
        let _ = writeln!(out, "  {} label(s) match", summary.matches);
    }
    if summary.creates > 0 {
        let _ = writeln!(out, "  {} label(s) to create", summary.creates);
    }
    if summary.updates > 0 {
        if update_enabled {
            let _ = writeln!(out, "  {} label(s) to update", summary.updates);
        } else {
            let _ = writeln!(
                out,
                "  {} label(s) differ (use --force to update)",
                summary.updates
            );
        }
    }
    if summary.extras > 0 {
        if delete_enabled {
            let _ = writeln!(out, "  {} unmanaged label(s) to delete", summary.extras);
        } else {
            let _ = writeln!(
                out,
                "  {} unmanaged label(s) (use --delete-unmanaged to remove)",
                summary.extras
            );
        }
    }

    out
}

/// Report for a finished reconciliation pass
pub fn format_outcome(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::AlreadyInSync => {
            format!("\n{} All labels are already in sync\n", "✓".green())
        }
        SyncOutcome::DryRun { pending } => format!(
            "\n{} {pending} change(s) would be applied (dry-run mode: no changes applied)\n",
            "!".yellow()
        ),
        SyncOutcome::Cancelled => format!("{}\n", "Cancelled.".yellow()),
        SyncOutcome::Completed(result) => format!("\n{}\n", format_result(result)),
    }
}

/// One-line result with the successful counts only
pub fn format_result(result: &SyncResult) -> String {
    let mut parts = Vec::new();
    if result.created > 0 {
        parts.push(format!("{} created", result.created));
    }
    if result.updated > 0 {
        parts.push(format!("{} updated", result.updated));
    }
    if result.deleted > 0 {
        parts.push(format!("{} deleted", result.deleted));
    }

    if parts.is_empty() {
        format!("{} No changes made", "✓".green())
    } else {
        format!("{} Synced labels ({})", "✓".green(), parts.join(", "))
    }
}

/// Line for one finished mutation
///
/// `✓ Created x` style on success, `✗ Failed to <verb> x: <cause>` on failure.
pub fn format_progress(progress: Progress<'_>) -> String {
    match progress {
        Progress::Applied(operation) => {
            let verb = match operation {
                SyncOperation::Create { .. } => "Created",
                SyncOperation::Update { .. } => "Updated",
                SyncOperation::Delete { .. } => "Deleted",
            };
            format!("  {} {verb} {}\n", "✓".green(), operation.name())
        }
        Progress::Failed(failure) => format!(
            "  {} Failed to {} {}: {}\n",
            "✗".red(),
            failure.operation.verb(),
            failure.operation.name(),
            failure.reason
        ),
    }
}

/// Table of labels for terminal display
pub fn format_label_table(labels: &[Label]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<30} {:<8} {:<50}",
        "Name".cyan(),
        "Color".cyan(),
        "Description".cyan()
    );
    let _ = writeln!(out, "{}", "─".repeat(90));

    for label in labels {
        let description = if label.description.is_empty() {
            "(none)"
        } else {
            label.description.as_str()
        };
        let _ = writeln!(
            out,
            "{:<30} {:<8} {:<50}",
            label.name,
            format!("#{}", label.normalized_color()),
            description
        );
    }

    out
}
