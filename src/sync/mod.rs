//! Struct sync pipeline.
//!
//! Brings a downstream declaration in line with its upstream counterpart:
//!
//! 1. **Transform** the upstream fields ([`transform()`]): drop excluded
//!    embedded types and fields skipped by every directive key, remap types,
//!    strip tag keys.
//! 2. **Diff** the downstream declaration against the result
//!    ([`compute_diff`]).
//! 3. **Build** the replacement field list ([`build`]): upstream fields in
//!    upstream order, then downstream-only fields as deprecated stubs or
//!    nothing.
//! 4. **Write** the file back, touching only the replaced struct bodies.
//!
//! ## Components
//!
//! - [`types`]: rules, intermediate results and report types
//! - [`transform`]: field transformer
//! - [`drift`]: diff engine
//! - [`merge`]: replacement field list builder
//! - [`report`]: diff, outcome and summary rendering
//! - [`engine`]: the [`Syncer`] orchestrator
//!
//! ## Example
//!
//! ```rust,ignore
//! use structsync::sync::{RunOptions, Syncer};
//!
//! let syncer = Syncer::new(&config, sources.paths().clone())
//!     .with_options(RunOptions { dry_run: true, ..RunOptions::default() });
//! let report = syncer.run();
//! print!("{}", format_summary(&report.stats));
//! ```
//!
//! ## Neutralized fields
//!
//! A downstream-only field whose leading comment is a commented-out type
//! (`// *old.Type`) or a `Deprecated:` note has already been dealt with by an
//! earlier run. The diff engine does not report it as a pending removal.

pub mod drift;
pub mod engine;
pub mod merge;
mod proptest;
pub mod report;
pub mod transform;
pub mod types;

// Re-exports for convenience
pub use drift::{compute_diff, is_neutralized};
pub use engine::{RunOptions, Syncer};
pub use merge::build;
pub use report::{format_color_diff, format_diff, format_outcome, format_summary};
pub use transform::{is_skipped, strip_annotation, transform};
pub use types::{
    BuildResult, DeclarationOutcome, DeclarationStatus, DiffKind, DiffLine, DiffResult,
    MergeOptions, MergeReport, SummaryStats, SyncReport, TransformResult, TransformRules,
    TransformedField, DEFAULT_DEPRECATION_MESSAGE,
};
