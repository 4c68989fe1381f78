//! # structsync
//!
//! Keeps downstream Go struct definitions in sync with upstream sources.
//!
//! ## Core Components
//!
//! - **Golang**: comment-preserving parser and byte-stable writer for Go `type` declarations
//! - **Sync**: field transformation, drift detection, merge and reporting
//! - **Config**: YAML configuration
//! - **Sources**: local overrides and shallow git clones of upstream repositories
//!
//! ## Example
//!
//! ```rust,ignore
//! use structsync::{compute_diff, parse_file, transform, TransformRules};
//!
//! let upstream = parse_file("casdoor/object/user.go")?.extract("User")?;
//! let target = parse_file("sdk/user.go")?.extract("User")?;
//!
//! let rules = TransformRules::new().remove_key("xorm");
//! let diff = compute_diff(&target, &transform(&upstream, &rules));
//! if diff.has_changes {
//!     println!("{} is out of date", diff.declaration);
//! }
//! ```

pub mod config;
pub mod error;
pub mod golang;
pub mod sources;
pub mod sync;

// Re-exports for convenience
pub use config::{Config, DeprecationConfig, SourceDef, StructDef};
pub use error::{Error, Result};
pub use golang::{
    parse_file, parse_source, serialize, write_file, Declaration, Field, FieldKey, FieldNode,
    SourceFile, TypeExpr,
};
pub use sources::{parse_override, resolve_sources, ResolvedSources};
pub use sync::{
    build, compute_diff, format_color_diff, format_diff, format_summary, transform, BuildResult,
    DeclarationOutcome, DeclarationStatus, DiffKind, DiffLine, DiffResult, MergeOptions,
    MergeReport, RunOptions, SummaryStats, SyncReport, Syncer, TransformResult, TransformRules,
    TransformedField,
};
