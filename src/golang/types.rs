//! Syntax tree for the parts of a Go file that structsync edits.
//!
//! The tree keeps the original source text and records byte spans for every
//! struct body. Untouched regions are written back verbatim; a struct whose
//! field list was replaced is re-rendered from its [`FieldNode`]s.

use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Vertical spacing before a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Spacing {
    /// Same line as the previous token.
    None,
    /// Own line.
    #[default]
    NewLine,
    /// Own line, preceded by a blank line.
    EmptyLine,
}

/// Comments attached to a field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Decorations {
    /// Spacing before the field (and its leading comments).
    pub before: Spacing,
    /// Comment lines above the field, verbatim. An empty entry is a blank
    /// line inside the comment block.
    pub start: Vec<String>,
    /// Comments after the field on the same line.
    pub end: Vec<String>,
}

/// A Go type expression.
///
/// Cloning deep-copies the structural variants. Inline literal and opaque
/// variants share their source text with the original (`Arc`), so a clone of
/// `chan<- int` or `func() error` is the same text, not a re-parsed copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// `string`, `T`
    Ident(String),
    /// `*T`
    Pointer(Box<TypeExpr>),
    /// `pkg.T`
    Qualified { package: String, name: String },
    /// `[]T`
    Slice(Box<TypeExpr>),
    /// `[N]T`
    Array { len: String, elem: Box<TypeExpr> },
    /// `map[K]V`
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    /// `interface{...}`, kept as written.
    Interface(Arc<str>),
    /// `struct{...}`, kept as written.
    Struct(Arc<str>),
    /// Anything else (`func`, `chan`, generic instantiations), kept as written.
    Opaque(Arc<str>),
}

impl TypeExpr {
    /// Parse a standalone type expression such as `*pp.PaymentState`.
    pub fn parse(text: &str) -> Option<Self> {
        super::parser::parse_type_expr(text)
    }

    /// Textual projection used for identity keys and diffs.
    ///
    /// Inline interface and struct literals render as their empty short
    /// form; everything else renders as written.
    pub fn render(&self) -> String {
        self.format(true)
    }

    /// Source form written back to a file.
    pub fn to_source(&self) -> String {
        self.format(false)
    }

    fn format(&self, short: bool) -> String {
        match self {
            Self::Ident(name) => name.clone(),
            Self::Pointer(inner) => format!("*{}", inner.format(short)),
            Self::Qualified { package, name } => format!("{package}.{name}"),
            Self::Slice(elem) => format!("[]{}", elem.format(short)),
            Self::Array { len, elem } => format!("[{len}]{}", elem.format(short)),
            Self::Map { key, value } => {
                format!("map[{}]{}", key.format(short), value.format(short))
            }
            Self::Interface(_) if short => "interface{}".to_string(),
            Self::Struct(_) if short => "struct{}".to_string(),
            Self::Interface(raw) | Self::Struct(raw) | Self::Opaque(raw) => raw.to_string(),
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// One field line of a struct: `A, B T \`tag\``.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNode {
    /// Explicit names; empty for embedded fields.
    pub names: Vec<String>,
    pub ty: TypeExpr,
    /// Raw tag literal including its quotes, if any.
    pub tag: Option<String>,
    pub decs: Decorations,
}

impl FieldNode {
    /// Create a named field.
    pub fn named(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            names: vec![name.into()],
            ty,
            tag: None,
            decs: Decorations::default(),
        }
    }

    /// Create an embedded field.
    pub fn embedded(ty: TypeExpr) -> Self {
        Self {
            names: Vec::new(),
            ty,
            tag: None,
            decs: Decorations::default(),
        }
    }

    /// Set the tag literal.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Set the decorations.
    pub fn with_decorations(mut self, decs: Decorations) -> Self {
        self.decs = decs;
        self
    }

    /// True if the field has no explicit name.
    pub fn is_embedded(&self) -> bool {
        self.names.is_empty()
    }
}

/// A struct type literal with its location in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructType {
    pub fields: Vec<FieldNode>,
    /// Comments after the last field, before the closing brace.
    pub trailing: Vec<String>,
    /// Byte range strictly between the braces.
    pub body: Range<usize>,
    /// Indentation of the line the declaration starts on.
    pub indent: String,
    /// Set once the field list has been replaced.
    pub(crate) replaced: bool,
}

impl StructType {
    /// True if the field list was replaced since parsing.
    pub fn is_replaced(&self) -> bool {
        self.replaced
    }
}

/// What a type declaration declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Struct(StructType),
    /// Any non-struct type, kept as written.
    Other(String),
}

/// One `Name Type` spec of a `type` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpec {
    pub name: String,
    /// Comment block directly above the declaration.
    pub doc: Vec<String>,
    pub kind: TypeKind,
    /// 1-based line of the name.
    pub line: usize,
}

impl TypeSpec {
    /// The struct type, if this declares one.
    pub fn as_struct(&self) -> Option<&StructType> {
        match &self.kind {
            TypeKind::Struct(st) => Some(st),
            TypeKind::Other(_) => None,
        }
    }

    /// Mutable access to the struct type, if this declares one.
    pub fn as_struct_mut(&mut self) -> Option<&mut StructType> {
        match &mut self.kind {
            TypeKind::Struct(st) => Some(st),
            TypeKind::Other(_) => None,
        }
    }
}

/// A parsed Go file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub(crate) source: String,
    /// Package clause name, if present.
    pub package: Option<String>,
    /// All type specs in source order.
    pub specs: Vec<TypeSpec>,
}

impl SourceFile {
    /// Original text the file was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Path the file was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Find a type spec by name.
    pub fn spec(&self, name: &str) -> Option<&TypeSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    /// Find a type spec by name, mutably.
    pub fn spec_mut(&mut self, name: &str) -> Option<&mut TypeSpec> {
        self.specs.iter_mut().find(|s| s.name == name)
    }

    /// Names of all struct declarations, in source order.
    pub fn record_names(&self) -> Vec<&str> {
        self.specs
            .iter()
            .filter(|s| s.as_struct().is_some())
            .map(|s| s.name.as_str())
            .collect()
    }

    /// True if any struct body was replaced.
    pub fn is_modified(&self) -> bool {
        self.specs
            .iter()
            .filter_map(TypeSpec::as_struct)
            .any(StructType::is_replaced)
    }
}
