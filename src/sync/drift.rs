//! Drift detection between a downstream declaration and its transformed
//! upstream counterpart.
//!
//! Output order follows the ordered field lists: upstream order first, then
//! target-only fields in target order. Maps are used for lookups only.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::types::{
    Declaration, DiffLine, DiffResult, Field, FieldKey, TransformResult, TransformedField,
};

/// Comment content that marks a field as already neutralized: a commented-out
/// type (`// *old.Type`, `// pkg.Type`) or a deprecation note.
static NEUTRALIZED_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^//\s*(?:\*|Deprecated:|.*\b[A-Za-z_]\w*\.[A-Za-z_]\w*)").expect("Invalid regex")
});

/// Compute the field diff of `target` against the transformed upstream.
pub fn compute_diff(target: &Declaration, transform: &TransformResult) -> DiffResult {
    let mut diff = DiffResult::new(&target.name);

    let target_fields: HashMap<FieldKey, &Field> =
        target.fields.iter().map(|f| (f.key(), f)).collect();
    let upstream_keys: HashSet<FieldKey> =
        transform.fields.iter().map(TransformedField::key).collect();
    let excluded_keys: HashSet<FieldKey> =
        transform.excluded.iter().map(TransformedField::key).collect();

    diff.lines
        .push(DiffLine::unchanged(format!("type {} struct {{", target.name)));

    for tf in transform.fields.iter().filter(|tf| !tf.should_exclude) {
        let new_line = render_transformed(tf);
        match target_fields.get(&tf.key()) {
            Some(existing) => {
                let old_line = render_field(existing);
                if old_line == new_line {
                    diff.lines.push(DiffLine::unchanged(new_line));
                } else {
                    diff.lines.push(DiffLine::removed(old_line));
                    diff.lines.push(DiffLine::added(new_line));
                    diff.modified_fields += 1;
                }
            }
            None => {
                diff.lines.push(DiffLine::added(new_line));
                diff.new_fields += 1;
            }
        }
    }

    let mut seen = HashSet::new();
    for field in &target.fields {
        let key = field.key();
        if upstream_keys.contains(&key) || excluded_keys.contains(&key) || !seen.insert(key) {
            continue;
        }
        if is_neutralized(field) {
            debug!(
                declaration = %target.name,
                field = field.display_name(),
                "skipping already neutralized field"
            );
            continue;
        }
        diff.lines.push(DiffLine::removed(render_field(field)));
        diff.removed_fields += 1;
    }

    diff.lines.push(DiffLine::unchanged("}"));
    diff.has_changes = diff.new_fields + diff.removed_fields + diff.modified_fields > 0;
    diff
}

/// True if a leading comment of `field` marks it as commented out or deprecated.
pub fn is_neutralized(field: &Field) -> bool {
    field
        .comments
        .iter()
        .any(|c| NEUTRALIZED_COMMENT.is_match(c.trim()))
}

/// Render a target field as a diff line.
pub fn render_field(field: &Field) -> String {
    render_line(&field.name, &field.ty, &field.annotation)
}

/// Render a transformed field as a diff line.
pub fn render_transformed(tf: &TransformedField) -> String {
    render_line(&tf.field.name, tf.effective_type(), &tf.new_annotation)
}

fn render_line(name: &str, ty: &str, annotation: &str) -> String {
    let parts: Vec<&str> = [name, ty, annotation]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect();
    format!("\t{}", parts.join(" "))
}
