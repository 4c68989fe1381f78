//! Text rendering of diffs, outcomes and run summaries.

use std::path::Path;

use super::types::{DeclarationOutcome, DeclarationStatus, DiffKind, DiffResult, SummaryStats};

const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

/// Render a diff as a unified-style block. Empty when there are no changes.
pub fn format_diff(diff: &DiffResult, target_path: &Path) -> String {
    render_diff(diff, target_path, false)
}

/// Like [`format_diff`] with ANSI colors.
pub fn format_color_diff(diff: &DiffResult, target_path: &Path) -> String {
    render_diff(diff, target_path, true)
}

fn render_diff(diff: &DiffResult, target_path: &Path, color: bool) -> String {
    if !diff.has_changes {
        return String::new();
    }

    let paint = |code: &str, text: String| {
        if color {
            format!("{code}{text}{RESET}")
        } else {
            text
        }
    };

    let path = target_path.display();
    let mut lines = vec![
        paint(YELLOW, format!("--- a/{path}")),
        paint(YELLOW, format!("+++ b/{path}")),
        paint(CYAN, format!("@@ struct {} @@", diff.declaration)),
    ];

    for line in &diff.lines {
        let text = format!("{}{}", line.kind.prefix(), line.content);
        lines.push(match line.kind {
            DiffKind::Unchanged => text,
            DiffKind::Added => paint(GREEN, text),
            DiffKind::Removed => paint(RED, text),
        });
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Render the end-of-run summary block.
pub fn format_summary(stats: &SummaryStats) -> String {
    let lines = [
        String::new(),
        "=== Sync Summary ===".to_string(),
        format!("Structs processed: {}", stats.total_structs),
        format!("Structs changed:   {}", stats.changed_structs),
        format!("New fields:        {}", stats.new_fields),
        format!("Removed fields:    {}", stats.removed_fields),
        format!("Modified tags:     {}", stats.modified_tags),
        format!("Excluded fields:   {}", stats.excluded_fields),
    ];
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// One-line status message for an outcome, if it has one to print.
///
/// Unchanged declarations only get a message when `verbose` is set. Failures
/// are reported through logging and return `None`.
pub fn format_outcome(outcome: &DeclarationOutcome, verbose: bool) -> Option<String> {
    let file = outcome.target_file.display();
    match &outcome.status {
        DeclarationStatus::Updated => Some(format!("Updated {} in {file}", outcome.name)),
        DeclarationStatus::WouldUpdate => Some(format!("Would update {} in {file}", outcome.name)),
        DeclarationStatus::Unchanged if verbose => {
            Some(format!("No changes needed for {}", outcome.name))
        }
        DeclarationStatus::Unchanged | DeclarationStatus::Failed { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::types::DiffLine;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn sample_diff() -> DiffResult {
        let mut diff = DiffResult::new("User");
        diff.has_changes = true;
        diff.lines = vec![
            DiffLine::unchanged("type User struct {"),
            DiffLine::removed("\tB int"),
            DiffLine::added("\tB int64"),
            DiffLine::unchanged("}"),
        ];
        diff
    }

    #[test]
    fn test_format_diff() {
        let out = format_diff(&sample_diff(), Path::new("object/user.go"));
        assert_eq!(
            out,
            concat!(
                "--- a/object/user.go\n",
                "+++ b/object/user.go\n",
                "@@ struct User @@\n",
                " type User struct {\n",
                "-\tB int\n",
                "+\tB int64\n",
                " }\n",
            )
        );
    }

    #[test]
    fn test_format_color_diff() {
        let out = format_color_diff(&sample_diff(), Path::new("user.go"));
        assert!(out.starts_with("\x1b[33m--- a/user.go\x1b[0m\n"));
        assert!(out.contains("\x1b[36m@@ struct User @@\x1b[0m\n"));
        assert!(out.contains("\x1b[31m-\tB int\x1b[0m\n"));
        assert!(out.contains("\x1b[32m+\tB int64\x1b[0m\n"));
        assert!(out.contains("\n type User struct {\n"));
    }

    #[test]
    fn test_unchanged_diff_is_empty() {
        let diff = DiffResult::new("User");
        assert_eq!(format_diff(&diff, Path::new("user.go")), "");
        assert_eq!(format_color_diff(&diff, Path::new("user.go")), "");
    }

    #[test]
    fn test_format_summary() {
        let stats = SummaryStats {
            total_structs: 3,
            changed_structs: 1,
            new_fields: 2,
            removed_fields: 1,
            modified_tags: 14,
            excluded_fields: 4,
        };
        assert_eq!(
            format_summary(&stats),
            concat!(
                "\n=== Sync Summary ===\n",
                "Structs processed: 3\n",
                "Structs changed:   1\n",
                "New fields:        2\n",
                "Removed fields:    1\n",
                "Modified tags:     14\n",
                "Excluded fields:   4\n",
            )
        );
    }

    #[test]
    fn test_format_outcome() {
        let mut outcome = DeclarationOutcome {
            name: "User".to_string(),
            target_file: PathBuf::from("sdk/user.go"),
            status: DeclarationStatus::WouldUpdate,
            diffs: vec![],
        };
        assert_eq!(
            format_outcome(&outcome, false).as_deref(),
            Some("Would update User in sdk/user.go")
        );

        outcome.status = DeclarationStatus::Unchanged;
        assert_eq!(format_outcome(&outcome, false), None);
        assert_eq!(
            format_outcome(&outcome, true).as_deref(),
            Some("No changes needed for User")
        );
    }
}
