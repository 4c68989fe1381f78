//! Property-based tests for the sync pipeline using proptest.
//!
//! These tests check the invariants the pipeline relies on:
//!
//! - Writing an unmodified file reproduces its bytes exactly
//! - Excluded fields never reach the built field list
//! - A second sync against the same upstream finds nothing to change
//! - Tag stripping keeps the order of the remaining keys
