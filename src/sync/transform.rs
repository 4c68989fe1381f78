//! Field transformation.
//!
//! Applies [`TransformRules`] to an upstream declaration: embedded-type and
//! skip-directive exclusion, exact-match type remapping, and tag key stripping.
//! Never fails; a malformed tag leaves its field untransformed.

use tracing::debug;

use crate::golang::Tags;

use super::types::{Declaration, TransformResult, TransformRules, TransformedField};

/// Transform every field of `declaration`, preserving order.
pub fn transform(declaration: &Declaration, rules: &TransformRules) -> TransformResult {
    let mut result = TransformResult {
        name: declaration.name.clone(),
        ..Default::default()
    };

    for field in &declaration.fields {
        let mut tf = TransformedField::unchanged(field.clone());

        if field.is_embedded && rules.exclude_embedded_types.iter().any(|t| *t == field.ty) {
            tf.should_exclude = true;
            result.excluded.push(tf);
            continue;
        }

        if is_skipped(&field.annotation, &rules.skip_directive_keys) {
            tf.should_exclude = true;
            result.excluded.push(tf);
            continue;
        }

        if let Some(mapped) = rules.type_mappings.get(&field.ty) {
            tf.new_type = Some(mapped.clone());
        }

        let (annotation, modified) =
            strip_annotation(&field.annotation, &rules.remove_annotation_keys);
        if modified {
            tf.new_annotation = annotation;
            result.modified_tags += 1;
        }

        result.fields.push(tf);
    }

    debug!(
        declaration = %result.name,
        retained = result.fields.len(),
        excluded = result.excluded.len(),
        modified_tags = result.modified_tags,
        "transformed declaration"
    );

    result
}

/// True when every key in `keys` is present with the directive name `-`.
pub fn is_skipped(annotation: &str, keys: &[String]) -> bool {
    if keys.is_empty() {
        return false;
    }
    let Some(tags) = Tags::from_literal(annotation) else {
        return false;
    };
    keys.iter().all(|key| tags.get(key).is_some_and(|tag| tag.name() == "-"))
}

/// Remove `keys` from a tag literal.
///
/// Returns the rebuilt literal and whether anything was removed. When every
/// pair is removed the literal is empty. A literal that does not parse is
/// returned as is.
pub fn strip_annotation<S: AsRef<str>>(annotation: &str, keys: &[S]) -> (String, bool) {
    if keys.is_empty() {
        return (annotation.to_string(), false);
    }
    let Some(mut tags) = Tags::from_literal(annotation) else {
        return (annotation.to_string(), false);
    };
    if !tags.remove_keys(keys) {
        return (annotation.to_string(), false);
    }
    (tags.to_literal().unwrap_or_default(), true)
}
