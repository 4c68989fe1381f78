//! Flat view of struct declarations.
//!
//! A [`Declaration`] lists one [`Field`] per field name, so `A, B int` becomes
//! two fields sharing a type and tag. Fields keep their structured type and
//! decorations so they can be turned back into [`FieldNode`]s.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::types::{Decorations, FieldNode, SourceFile, Spacing, TypeExpr};

/// Identity of a field within a declaration: its name, or its rendered type
/// when embedded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldKey {
    Named(String),
    Embedded(String),
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) | Self::Embedded(name) => write!(f, "{name}"),
        }
    }
}

/// One member of a struct declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field name; empty for embedded fields.
    pub name: String,
    /// Rendered type.
    pub ty: String,
    /// Structured type used when the field is rebuilt.
    pub type_expr: TypeExpr,
    /// Raw tag literal with backticks, or empty.
    pub annotation: String,
    /// Comment lines directly above the field.
    pub comments: Vec<String>,
    /// Comments on the same line after the field.
    pub trailing_comments: Vec<String>,
    /// Spacing before the field.
    pub spacing: Spacing,
    pub is_embedded: bool,
}

impl Field {
    /// Create a named field.
    pub fn named(name: impl Into<String>, type_expr: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty: type_expr.render(),
            type_expr,
            annotation: String::new(),
            comments: Vec::new(),
            trailing_comments: Vec::new(),
            spacing: Spacing::NewLine,
            is_embedded: false,
        }
    }

    /// Create an embedded field.
    pub fn embedded(type_expr: TypeExpr) -> Self {
        Self {
            is_embedded: true,
            ..Self::named("", type_expr)
        }
    }

    /// Set the tag literal.
    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = annotation.into();
        self
    }

    /// Set the leading comment lines.
    pub fn with_comments(mut self, comments: Vec<String>) -> Self {
        self.comments = comments;
        self
    }

    /// Identity key.
    pub fn key(&self) -> FieldKey {
        if self.is_embedded {
            FieldKey::Embedded(self.ty.clone())
        } else {
            FieldKey::Named(self.name.clone())
        }
    }

    /// Name if named, type if embedded.
    pub fn display_name(&self) -> &str {
        if self.is_embedded {
            &self.ty
        } else {
            &self.name
        }
    }

    /// Build a syntax node with the given type and tag.
    pub(crate) fn to_node(&self, ty: TypeExpr, annotation: &str) -> FieldNode {
        let names = if self.is_embedded {
            Vec::new()
        } else {
            vec![self.name.clone()]
        };
        FieldNode {
            names,
            ty,
            tag: (!annotation.is_empty()).then(|| annotation.to_string()),
            decs: Decorations {
                before: self.spacing,
                start: self.comments.clone(),
                end: self.trailing_comments.clone(),
            },
        }
    }
}

/// A named struct type and its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub fields: Vec<Field>,
    /// Doc comment lines above the declaration.
    pub comments: Vec<String>,
    /// Comments after the last field.
    pub trailing: Vec<String>,
}

impl Declaration {
    /// Find a field by identity key. The last duplicate wins.
    pub fn field(&self, key: &FieldKey) -> Option<&Field> {
        self.fields.iter().rev().find(|f| &f.key() == key)
    }
}

fn fan_out(node: &FieldNode) -> Vec<Field> {
    let template = Field {
        name: String::new(),
        ty: node.ty.render(),
        type_expr: node.ty.clone(),
        annotation: node.tag.clone().unwrap_or_default(),
        comments: node.decs.start.clone(),
        trailing_comments: node.decs.end.clone(),
        spacing: node.decs.before,
        is_embedded: node.is_embedded(),
    };
    if node.is_embedded() {
        return vec![template];
    }
    node.names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            if i == 0 {
                Field {
                    name: name.clone(),
                    ..template.clone()
                }
            } else {
                Field {
                    name: name.clone(),
                    comments: Vec::new(),
                    trailing_comments: Vec::new(),
                    spacing: Spacing::NewLine,
                    ..template.clone()
                }
            }
        })
        .collect()
}

impl SourceFile {
    /// Extract the named struct declaration.
    pub fn extract(&self, name: &str) -> Result<Declaration> {
        let spec = self.spec(name).ok_or_else(|| {
            debug!(
                name,
                available = ?self.record_names(),
                "struct not found"
            );
            Error::not_found(name, self.path())
        })?;
        let st = spec.as_struct().ok_or_else(|| Error::not_a_record(name))?;

        Ok(Declaration {
            name: spec.name.clone(),
            fields: st.fields.iter().flat_map(fan_out).collect(),
            comments: spec.doc.clone(),
            trailing: st.trailing.clone(),
        })
    }

    /// Extract every named struct that exists, in source order. Missing names
    /// and non-struct types are skipped.
    pub fn extract_many<S: AsRef<str>>(&self, names: &[S]) -> Vec<Declaration> {
        self.specs
            .iter()
            .filter(|spec| names.iter().any(|n| n.as_ref() == spec.name))
            .filter_map(|spec| self.extract(&spec.name).ok())
            .collect()
    }

    /// Replace the field list of the named struct.
    pub fn replace_fields(&mut self, name: &str, fields: Vec<FieldNode>) -> Result<()> {
        let path = self.path.clone();
        let spec = self
            .spec_mut(name)
            .ok_or_else(|| Error::not_found(name, &path))?;
        let st = spec.as_struct_mut().ok_or_else(|| Error::not_a_record(name))?;
        st.fields = fields;
        st.replaced = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::golang::parser::parse_source;

    const SOURCE: &str = r#"package object

type Alias = string

// User doc
type User struct {
	// owner comment
	Owner, Name string `json:"name"`
	*xormadapter.Adapter `xorm:"extends"`
	Props map[string]interface{}
}

type Userinfo struct {
	Sub string
}
"#;

    fn file() -> SourceFile {
        parse_source("user.go", SOURCE).unwrap()
    }

    #[test]
    fn test_extract_fans_out_names() {
        let decl = file().extract("User").unwrap();
        assert_eq!(decl.comments, vec!["// User doc"]);
        assert_eq!(decl.fields.len(), 4);

        let owner = &decl.fields[0];
        let name = &decl.fields[1];
        assert_eq!(owner.name, "Owner");
        assert_eq!(name.name, "Name");
        assert_eq!(owner.ty, name.ty);
        assert_eq!(name.annotation, "`json:\"name\"`");
        assert_eq!(owner.comments, vec!["// owner comment"]);
        assert!(name.comments.is_empty());
        assert_eq!(name.spacing, Spacing::NewLine);
    }

    #[test]
    fn test_rebuilt_names_keep_one_comment() {
        let source = "package p\n\ntype P struct {\n\tA int\n\n\t// shared\n\tX, Y int // xy\n}\n";
        let mut f = parse_source("p.go", source).unwrap();
        let decl = f.extract("P").unwrap();
        let nodes = decl
            .fields
            .iter()
            .map(|field| field.to_node(field.type_expr.clone(), &field.annotation))
            .collect();
        f.replace_fields("P", nodes).unwrap();

        assert_eq!(
            crate::golang::serialize(&f),
            "package p\n\ntype P struct {\n\tA int\n\n\t// shared\n\tX int // xy\n\tY int\n}\n"
        );
    }

    #[test]
    fn test_embedded_identity() {
        let decl = file().extract("User").unwrap();
        let adapter = &decl.fields[2];
        assert!(adapter.is_embedded);
        assert_eq!(adapter.name, "");
        assert_eq!(adapter.key(), FieldKey::Embedded("*xormadapter.Adapter".to_string()));
        assert_eq!(decl.fields[3].ty, "map[string]interface{}");
    }

    #[test]
    fn test_extract_errors() {
        let f = file();
        assert!(matches!(f.extract("Missing"), Err(Error::DeclarationNotFound { .. })));
        assert!(matches!(f.extract("Alias"), Err(Error::NotARecordType { .. })));
    }

    #[test]
    fn test_extract_many_skips_missing() {
        let decls = file().extract_many(&["Userinfo", "Missing", "Alias", "User"]);
        let names: Vec<&str> = decls.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["User", "Userinfo"]);
    }

    #[test]
    fn test_replace_fields() {
        let mut f = file();
        f.replace_fields("Userinfo", vec![]).unwrap();
        assert!(f.spec("Userinfo").unwrap().as_struct().unwrap().is_replaced());
        assert!(matches!(
            f.replace_fields("Missing", vec![]),
            Err(Error::DeclarationNotFound { .. })
        ));
    }

    #[test]
    fn test_last_duplicate_wins() {
        let decl = Declaration {
            name: "T".to_string(),
            fields: vec![
                Field::named("A", TypeExpr::Ident("int".to_string())),
                Field::named("A", TypeExpr::Ident("string".to_string())),
            ],
            comments: vec![],
            trailing: vec![],
        };
        let field = decl.field(&FieldKey::Named("A".to_string())).unwrap();
        assert_eq!(field.ty, "string");
    }
}
