//! Type definitions for the sync pipeline.
//!
//! This module defines the transform rules, the per-declaration intermediate
//! results (transform, diff, build) and the run-level report types.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use crate::golang::{Declaration, Field, FieldKey, FieldNode};

/// Default deprecation message for stubbed fields.
pub const DEFAULT_DEPRECATION_MESSAGE: &str = "removed from server";

fn default_skip_directive_keys() -> Vec<String> {
    vec!["xorm".to_string(), "json".to_string()]
}

/// Field-level transformation rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformRules {
    /// Tag keys stripped from every retained field.
    #[serde(rename = "remove_tags", default)]
    pub remove_annotation_keys: Vec<String>,
    /// Embedded types dropped entirely, matched against the rendered type.
    #[serde(rename = "exclude_embedded", default)]
    pub exclude_embedded_types: Vec<String>,
    /// Exact-match type replacements.
    #[serde(default)]
    pub type_mappings: BTreeMap<String, String>,
    /// Tag keys that must all be `-` for a field to be skipped.
    #[serde(default = "default_skip_directive_keys")]
    pub skip_directive_keys: Vec<String>,
}

impl Default for TransformRules {
    fn default() -> Self {
        Self {
            remove_annotation_keys: Vec::new(),
            exclude_embedded_types: Vec::new(),
            type_mappings: BTreeMap::new(),
            skip_directive_keys: default_skip_directive_keys(),
        }
    }
}

impl TransformRules {
    /// Create rules with nothing configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag key to strip.
    pub fn remove_key(mut self, key: impl Into<String>) -> Self {
        self.remove_annotation_keys.push(key.into());
        self
    }

    /// Add an embedded type to exclude.
    pub fn exclude_embedded(mut self, ty: impl Into<String>) -> Self {
        self.exclude_embedded_types.push(ty.into());
        self
    }

    /// Add a type mapping.
    pub fn map_type(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.type_mappings.insert(from.into(), to.into());
        self
    }
}

/// A field after transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedField {
    pub field: Field,
    /// Tag literal after stripping, empty if nothing remains.
    pub new_annotation: String,
    /// Replacement type when a mapping applied.
    pub new_type: Option<String>,
    pub should_exclude: bool,
}

impl TransformedField {
    /// Wrap a field with no transformation applied.
    pub fn unchanged(field: Field) -> Self {
        Self {
            new_annotation: field.annotation.clone(),
            field,
            new_type: None,
            should_exclude: false,
        }
    }

    /// Identity key of the underlying field.
    pub fn key(&self) -> FieldKey {
        self.field.key()
    }

    /// The mapped type, or the original one.
    pub fn effective_type(&self) -> &str {
        self.new_type.as_deref().unwrap_or(&self.field.ty)
    }
}

/// Result of transforming one declaration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransformResult {
    /// Declaration name.
    pub name: String,
    /// Retained fields, in upstream order.
    pub fields: Vec<TransformedField>,
    /// Fields dropped by an exclusion rule.
    pub excluded: Vec<TransformedField>,
    /// Number of retained fields whose tag lost at least one key.
    pub modified_tags: usize,
}

impl TransformResult {
    /// Display names of the excluded fields.
    pub fn excluded_fields(&self) -> Vec<String> {
        self.excluded
            .iter()
            .map(|f| f.field.display_name().to_string())
            .collect()
    }
}

/// Classification of a diff line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    Unchanged,
    Added,
    Removed,
}

impl DiffKind {
    /// Unified-diff prefix character.
    pub fn prefix(&self) -> char {
        match self {
            Self::Unchanged => ' ',
            Self::Added => '+',
            Self::Removed => '-',
        }
    }
}

/// One rendered line of a declaration diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub kind: DiffKind,
    pub content: String,
}

impl DiffLine {
    /// Create an unchanged line.
    pub fn unchanged(content: impl Into<String>) -> Self {
        Self {
            kind: DiffKind::Unchanged,
            content: content.into(),
        }
    }

    /// Create an added line.
    pub fn added(content: impl Into<String>) -> Self {
        Self {
            kind: DiffKind::Added,
            content: content.into(),
        }
    }

    /// Create a removed line.
    pub fn removed(content: impl Into<String>) -> Self {
        Self {
            kind: DiffKind::Removed,
            content: content.into(),
        }
    }
}

/// Field diff of one declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    pub declaration: String,
    pub has_changes: bool,
    pub lines: Vec<DiffLine>,
    /// Upstream fields missing from the target.
    pub new_fields: usize,
    /// Target-only fields pending removal.
    pub removed_fields: usize,
    /// Fields present on both sides that render differently.
    pub modified_fields: usize,
}

impl DiffResult {
    /// Create an empty diff for a declaration.
    pub fn new(declaration: impl Into<String>) -> Self {
        Self {
            declaration: declaration.into(),
            has_changes: false,
            lines: Vec::new(),
            new_fields: 0,
            removed_fields: 0,
            modified_fields: 0,
        }
    }

    /// Lines of the given kind.
    pub fn lines_of(&self, kind: DiffKind) -> impl Iterator<Item = &DiffLine> {
        self.lines.iter().filter(move |l| l.kind == kind)
    }
}

/// Options for building a replacement field list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    /// Keep target-only fields as deprecated stubs instead of deleting them.
    pub mark_deprecated: bool,
    /// Message after `Deprecated:`; empty means the default.
    pub deprecation_message: String,
    /// Reserved: removal of previously deprecated fields.
    pub prune_deprecated: bool,
    /// Tag keys stripped from deprecated stubs.
    pub remove_annotation_keys: Vec<String>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            mark_deprecated: true,
            deprecation_message: DEFAULT_DEPRECATION_MESSAGE.to_string(),
            prune_deprecated: false,
            remove_annotation_keys: Vec::new(),
        }
    }
}

impl MergeOptions {
    /// Create options with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set deprecate-vs-delete.
    pub fn with_mark_deprecated(mut self, mark: bool) -> Self {
        self.mark_deprecated = mark;
        self
    }

    /// Set the deprecation message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.deprecation_message = message.into();
        self
    }

    /// Set the tag keys stripped from stubs.
    pub fn with_remove_keys(mut self, keys: Vec<String>) -> Self {
        self.remove_annotation_keys = keys;
        self
    }

    /// The full deprecation comment line.
    pub fn deprecation_comment(&self) -> String {
        let message = if self.deprecation_message.trim().is_empty() {
            DEFAULT_DEPRECATION_MESSAGE
        } else {
            self.deprecation_message.trim()
        };
        format!("// Deprecated: {message}")
    }
}

/// Per-category field names of a build.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MergeReport {
    pub new: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<String>,
    pub unchanged: Vec<String>,
    pub deprecated: Vec<String>,
}

/// Replacement field list for a target declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult {
    pub fields: Vec<FieldNode>,
    pub report: MergeReport,
}

/// Counters accumulated across one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_structs: usize,
    pub changed_structs: usize,
    pub new_fields: usize,
    pub removed_fields: usize,
    pub modified_tags: usize,
    pub excluded_fields: usize,
}

impl SummaryStats {
    /// Create zeroed stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the counts of one transformed and diffed declaration.
    pub fn record(&mut self, transform: &TransformResult, diff: &DiffResult) {
        self.new_fields += diff.new_fields;
        self.removed_fields += diff.removed_fields;
        self.modified_tags += transform.modified_tags;
        self.excluded_fields += transform.excluded.len();
    }
}

/// What happened to one configured declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeclarationStatus {
    Unchanged,
    WouldUpdate,
    Updated,
    Failed { error: String },
}

impl DeclarationStatus {
    /// True for `WouldUpdate` and `Updated`.
    pub fn is_change(&self) -> bool {
        matches!(self, Self::WouldUpdate | Self::Updated)
    }
}

impl std::fmt::Display for DeclarationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unchanged => write!(f, "unchanged"),
            Self::WouldUpdate => write!(f, "would update"),
            Self::Updated => write!(f, "updated"),
            Self::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}

/// Outcome of syncing one configured declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationOutcome {
    pub name: String,
    pub target_file: PathBuf,
    #[serde(flatten)]
    pub status: DeclarationStatus,
    /// Diffs with changes: the declaration and any included types.
    pub diffs: Vec<DiffResult>,
}

/// Result of a full run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub outcomes: Vec<DeclarationOutcome>,
    pub stats: SummaryStats,
    pub generated_at: DateTime<Utc>,
}

impl SyncReport {
    /// Create an empty report stamped now.
    pub fn new() -> Self {
        Self {
            outcomes: Vec::new(),
            stats: SummaryStats::new(),
            generated_at: Utc::now(),
        }
    }

    /// Outcomes that failed.
    pub fn failures(&self) -> impl Iterator<Item = &DeclarationOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, DeclarationStatus::Failed { .. }))
    }
}

impl Default for SyncReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_rules_defaults() {
        let rules = TransformRules::default();
        assert_eq!(rules.skip_directive_keys, vec!["xorm", "json"]);
        assert!(rules.remove_annotation_keys.is_empty());

        let rules = TransformRules::new()
            .remove_key("xorm")
            .exclude_embedded("*xormadapter.Adapter")
            .map_type("pp.PaymentState", "string");
        assert_eq!(rules.type_mappings["pp.PaymentState"], "string");
    }

    #[test]
    fn test_deprecation_comment() {
        assert_eq!(
            MergeOptions::default().deprecation_comment(),
            "// Deprecated: removed from server"
        );
        assert_eq!(
            MergeOptions::new().with_message("").deprecation_comment(),
            "// Deprecated: removed from server"
        );
        assert_eq!(
            MergeOptions::new().with_message("use Foo").deprecation_comment(),
            "// Deprecated: use Foo"
        );
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = DeclarationOutcome {
            name: "User".to_string(),
            target_file: PathBuf::from("object/user.go"),
            status: DeclarationStatus::Failed {
                error: "boom".to_string(),
            },
            diffs: vec![],
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "boom");

        let back: DeclarationOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(back, outcome);
    }

    #[test]
    fn test_summary_record() {
        let mut stats = SummaryStats::new();
        let transform = TransformResult {
            modified_tags: 2,
            ..Default::default()
        };
        let mut diff = DiffResult::new("User");
        diff.new_fields = 3;
        diff.removed_fields = 1;
        stats.record(&transform, &diff);
        stats.record(&transform, &diff);

        assert_eq!(stats.new_fields, 6);
        assert_eq!(stats.removed_fields, 2);
        assert_eq!(stats.modified_tags, 4);
        assert_eq!(stats.excluded_fields, 0);
    }
}
