//! Replacement field list builder.
//!
//! The built list is the transformed upstream fields in upstream order, then
//! the target-only fields as deprecated stubs (or nothing, when deleting).

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::golang::{Spacing, TypeExpr};

use super::drift::{render_field, render_transformed};
use super::transform::strip_annotation;
use super::types::{
    BuildResult, Field, FieldKey, MergeOptions, MergeReport, TransformResult, TransformedField,
};

/// Build the field list that replaces the target declaration's fields.
pub fn build(
    transform: &TransformResult,
    existing: &[Field],
    options: &MergeOptions,
) -> BuildResult {
    let mut fields = Vec::new();
    let mut report = MergeReport::default();

    let existing_by_key: HashMap<FieldKey, &Field> =
        existing.iter().map(|f| (f.key(), f)).collect();
    let upstream_keys: HashSet<FieldKey> =
        transform.fields.iter().map(TransformedField::key).collect();
    let excluded_keys: HashSet<FieldKey> =
        transform.excluded.iter().map(TransformedField::key).collect();

    for tf in transform.fields.iter().filter(|tf| !tf.should_exclude) {
        let key = tf.key();
        match existing_by_key.get(&key) {
            Some(current) if field_changed(current, tf) => report.modified.push(key.to_string()),
            Some(_) => report.unchanged.push(key.to_string()),
            None => report.new.push(key.to_string()),
        }

        let ty = match &tf.new_type {
            Some(mapped) if *mapped != tf.field.ty => {
                TypeExpr::parse(mapped).unwrap_or_else(|| TypeExpr::Ident(mapped.clone()))
            }
            _ => tf.field.type_expr.clone(),
        };
        fields.push(tf.field.to_node(ty, &tf.new_annotation));
    }

    let deprecation = options.deprecation_comment();
    let mut seen = HashSet::new();
    for field in existing {
        let key = field.key();
        if upstream_keys.contains(&key)
            || excluded_keys.contains(&key)
            || !seen.insert(key.clone())
        {
            continue;
        }
        if !options.mark_deprecated {
            report.removed.push(key.to_string());
            continue;
        }

        let (annotation, _) = strip_annotation(&field.annotation, &options.remove_annotation_keys);
        let mut node = field.to_node(field.type_expr.clone(), &annotation);
        if !node.decs.start.iter().any(|c| c.trim() == deprecation) {
            node.decs.start.insert(0, deprecation.clone());
        }
        if node.decs.before != Spacing::EmptyLine {
            node.decs.before = Spacing::NewLine;
        }
        fields.push(node);
        report.deprecated.push(key.to_string());
    }

    debug!(
        declaration = %transform.name,
        new = report.new.len(),
        modified = report.modified.len(),
        deprecated = report.deprecated.len(),
        removed = report.removed.len(),
        "built field list"
    );

    BuildResult { fields, report }
}

fn field_changed(current: &Field, tf: &TransformedField) -> bool {
    render_field(current) != render_transformed(tf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::golang::Declaration;
    use crate::sync::transform::transform;
    use crate::sync::types::TransformRules;

    fn ident(name: &str) -> TypeExpr {
        TypeExpr::Ident(name.to_string())
    }

    fn declaration(fields: Vec<Field>) -> Declaration {
        Declaration {
            name: "User".to_string(),
            fields,
            comments: vec![],
            trailing: vec![],
        }
    }

    #[test]
    fn test_deprecated_stub() {
        let upstream = declaration(vec![Field::named("Name", ident("string"))]);
        let existing = vec![
            Field::named("Name", ident("string")),
            Field::named("Foo", ident("string"))
                .with_annotation(r#"`xorm:"varchar(100)"`"#)
                .with_comments(vec!["// legacy".to_string()]),
        ];
        let options = MergeOptions::new().with_remove_keys(vec!["xorm".to_string()]);
        let result = build(&transform(&upstream, &TransformRules::default()), &existing, &options);

        assert_eq!(result.fields.len(), 2);
        let foo = &result.fields[1];
        assert_eq!(foo.names, vec!["Foo"]);
        assert_eq!(foo.ty, ident("string"));
        assert_eq!(foo.tag, None);
        assert_eq!(
            foo.decs.start,
            vec!["// Deprecated: removed from server", "// legacy"]
        );
        assert_eq!(result.report.deprecated, vec!["Foo"]);
        assert_eq!(result.report.unchanged, vec!["Name"]);
    }

    #[test]
    fn test_hard_delete() {
        let upstream = declaration(vec![Field::named("Name", ident("string"))]);
        let existing = vec![Field::named("Foo", ident("string"))];
        let options = MergeOptions::new().with_mark_deprecated(false);
        let result = build(&transform(&upstream, &TransformRules::default()), &existing, &options);

        assert_eq!(result.fields.len(), 1);
        assert_eq!(result.fields[0].names, vec!["Name"]);
        assert_eq!(result.report.removed, vec!["Foo"]);
        assert_eq!(result.report.new, vec!["Name"]);
    }

    #[test]
    fn test_deprecation_not_duplicated() {
        let upstream = declaration(vec![]);
        let existing = vec![Field::named("Foo", ident("int"))
            .with_comments(vec!["// Deprecated: removed from server".to_string()])];
        let result = build(
            &transform(&upstream, &TransformRules::default()),
            &existing,
            &MergeOptions::default(),
        );
        assert_eq!(result.fields[0].decs.start, vec!["// Deprecated: removed from server"]);
    }

    #[test]
    fn test_type_mapping_and_clone() {
        let state = TypeExpr::Qualified {
            package: "pp".to_string(),
            name: "PaymentState".to_string(),
        };
        let upstream = declaration(vec![
            Field::named("State", state.clone()),
            Field::named("Items", TypeExpr::Slice(Box::new(state.clone()))),
        ]);
        let existing = vec![Field::named("State", state)];
        let rules = TransformRules::new().map_type("pp.PaymentState", "string");
        let result = build(&transform(&upstream, &rules), &existing, &MergeOptions::default());

        assert_eq!(result.fields[0].ty, ident("string"));
        assert_eq!(result.fields[1].ty.render(), "[]pp.PaymentState");
        assert_eq!(result.report.modified, vec!["State"]);
        assert_eq!(result.report.new, vec!["Items"]);
    }

    #[test]
    fn test_excluded_never_emitted() {
        let adapter = TypeExpr::Pointer(Box::new(TypeExpr::Qualified {
            package: "xormadapter".to_string(),
            name: "Adapter".to_string(),
        }));
        let upstream = declaration(vec![Field::embedded(adapter.clone())]);
        let existing = vec![Field::embedded(adapter)];
        let rules = TransformRules::new().exclude_embedded("*xormadapter.Adapter");
        let result = build(&transform(&upstream, &rules), &existing, &MergeOptions::default());

        assert!(result.fields.is_empty());
        assert!(result.report.deprecated.is_empty());
    }

    #[test]
    fn test_upstream_decorations_kept() {
        let upstream = declaration(vec![Field::named("A", ident("int"))
            .with_annotation(r#"`json:"a"`"#)
            .with_comments(vec!["// A doc".to_string()])]);
        let result = build(
            &transform(&upstream, &TransformRules::default()),
            &[],
            &MergeOptions::default(),
        );
        let node = &result.fields[0];
        assert_eq!(node.tag.as_deref(), Some(r#"`json:"a"`"#));
        assert_eq!(node.decs.start, vec!["// A doc"]);
    }
}
