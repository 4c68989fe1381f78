//! Go source handling.
//!
//! Parses the `type` declarations of a Go file into a comment-preserving tree,
//! exposes struct declarations as flat field lists, and writes the tree back.
//!
//! ## Components
//!
//! - [`lexer`]: byte-preserving tokenizer
//! - [`types`]: syntax tree and type expressions
//! - [`parser`]: file and type-expression parser
//! - [`declaration`]: flat [`Declaration`] view, extraction and field replacement
//! - [`printer`]: writer, byte-stable for untouched regions
//! - [`tag`]: struct tag codec
//!
//! ## Example
//!
//! ```rust,ignore
//! use structsync::golang::{parse_file, write_file};
//!
//! let mut file = parse_file("object/user.go")?;
//! let user = file.extract("User")?;
//! println!("{} has {} fields", user.name, user.fields.len());
//! write_file(&file)?;
//! ```

pub mod declaration;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod tag;
pub mod types;

pub use declaration::{Declaration, Field, FieldKey};
pub use parser::{parse_file, parse_source};
pub use printer::{render_struct_body, serialize, write_file};
pub use tag::{has_tag, json_field_name, Tag, TagError, Tags};
pub use types::{
    Decorations, FieldNode, SourceFile, Spacing, StructType, TypeExpr, TypeKind, TypeSpec,
};
