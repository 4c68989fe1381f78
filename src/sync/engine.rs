//! Sync orchestration.
//!
//! [`Syncer`] walks the configured declarations in order. Each one is parsed,
//! transformed, diffed and, when it changed and the run is not a preview,
//! rebuilt and written. A failing declaration is logged and recorded in the
//! report; the run continues with the next one.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::{Config, StructDef};
use crate::error::{Error, Result};
use crate::golang::{parse_file, write_file, Declaration};

use super::drift::compute_diff;
use super::merge::build;
use super::transform::transform;
use super::types::{
    DeclarationOutcome, DeclarationStatus, DiffResult, MergeOptions, SummaryStats, SyncReport,
    TransformResult,
};

/// Run-mode switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Compute changes without writing.
    pub dry_run: bool,
    /// Only sync the declaration with this name.
    pub struct_filter: Option<String>,
    /// Deprecate target-only fields instead of deleting them.
    pub mark_deprecated: bool,
    /// Reserved.
    pub prune_deprecated: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            struct_filter: None,
            mark_deprecated: true,
            prune_deprecated: false,
        }
    }
}

/// One declaration's target, transform and diff.
struct Plan {
    existing: Declaration,
    transform: TransformResult,
    diff: DiffResult,
}

/// Synchronizes configured declarations from upstream sources into the target.
pub struct Syncer<'a> {
    config: &'a Config,
    source_paths: BTreeMap<String, PathBuf>,
    options: RunOptions,
}

impl<'a> Syncer<'a> {
    /// Create a syncer over resolved source directories.
    pub fn new(config: &'a Config, source_paths: BTreeMap<String, PathBuf>) -> Self {
        Self {
            config,
            source_paths,
            options: RunOptions {
                mark_deprecated: config.mark_removed(),
                ..RunOptions::default()
            },
        }
    }

    /// Set the run options.
    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Current run options.
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Sync every configured declaration that passes the filter.
    pub fn run(&self) -> SyncReport {
        let mut report = SyncReport::new();

        debug!(
            target_dir = %self.config.target.display(),
            sources = ?self.source_paths,
            structs = self.config.structs.len(),
            "starting sync"
        );

        for def in &self.config.structs {
            if let Some(filter) = &self.options.struct_filter {
                if def.name != *filter {
                    continue;
                }
            }

            match self.sync_declaration(def, &mut report.stats) {
                Ok(outcome) => {
                    report.stats.total_structs += 1;
                    report.outcomes.push(outcome);
                }
                Err(e) => {
                    warn!("{}: {}", def.name, e);
                    report.outcomes.push(DeclarationOutcome {
                        name: def.name.clone(),
                        target_file: self.config.target_file(def),
                        status: DeclarationStatus::Failed {
                            error: e.to_string(),
                        },
                        diffs: Vec::new(),
                    });
                }
            }
        }

        report
    }

    fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            mark_deprecated: self.options.mark_deprecated,
            deprecation_message: self.config.deprecation_message().to_string(),
            prune_deprecated: self.options.prune_deprecated,
            remove_annotation_keys: self.config.transform.remove_annotation_keys.clone(),
        }
    }

    fn source_dir(&self, def: &StructDef) -> Result<&Path> {
        self.source_paths
            .get(&def.source)
            .map(PathBuf::as_path)
            .ok_or_else(|| {
                Error::Config(format!("source {:?} not found in resolved paths", def.source))
            })
    }

    /// Sync one declaration and its included types.
    pub fn sync_declaration(
        &self,
        def: &StructDef,
        stats: &mut SummaryStats,
    ) -> Result<DeclarationOutcome> {
        let source_path = self.source_dir(def)?.join(def.source_file());
        let target_path = self.config.target_file(def);
        debug!(
            "Syncing {} from {} to {}",
            def.name,
            source_path.display(),
            target_path.display()
        );

        let source = parse_file(&source_path)?;
        let upstream = source.extract(&def.name)?;

        let additional = if def.include_types.is_empty() {
            Vec::new()
        } else {
            let found = source.extract_many(&def.include_types);
            for name in &def.include_types {
                if !found.iter().any(|d| d.name == *name) {
                    debug!(
                        declaration = %def.name,
                        include = %name,
                        "included type not found in source, skipping"
                    );
                }
            }
            found
        };

        let mut target = parse_file(&target_path)?;
        let existing = target.extract(&def.name)?;

        let rules = &self.config.transform;
        let primary = transform(&upstream, rules);
        debug!(
            "Source fields: {}, Excluded: {}, Target fields: {}",
            primary.fields.len(),
            primary.excluded.len(),
            existing.fields.len()
        );
        let diff = compute_diff(&existing, &primary);

        let mut plans = vec![Plan {
            existing,
            transform: primary,
            diff,
        }];

        for decl in additional.iter().filter(|d| d.name != def.name) {
            match target.extract(&decl.name) {
                Ok(existing) => {
                    let transform = transform(decl, rules);
                    let diff = compute_diff(&existing, &transform);
                    plans.push(Plan {
                        existing,
                        transform,
                        diff,
                    });
                }
                Err(e) => {
                    debug!(
                        include = %decl.name,
                        error = %e,
                        "Note: {} not found in target, skipping",
                        decl.name
                    );
                }
            }
        }

        let changed = plans.iter().any(|p| p.diff.has_changes);
        let diffs: Vec<DiffResult> = plans
            .iter()
            .filter(|p| p.diff.has_changes)
            .map(|p| p.diff.clone())
            .collect();

        let status = if !changed {
            DeclarationStatus::Unchanged
        } else if self.options.dry_run {
            DeclarationStatus::WouldUpdate
        } else {
            let options = self.merge_options();
            for plan in plans.iter().filter(|p| p.diff.has_changes) {
                let result = build(&plan.transform, &plan.existing.fields, &options);
                debug!(
                    declaration = %plan.existing.name,
                    new = ?result.report.new,
                    modified = ?result.report.modified,
                    deprecated = ?result.report.deprecated,
                    removed = ?result.report.removed,
                    "merged"
                );
                target.replace_fields(&plan.existing.name, result.fields)?;
            }
            write_file(&target)?;
            info!(declaration = %def.name, path = %target_path.display(), "updated");
            DeclarationStatus::Updated
        };

        for plan in &plans {
            stats.record(&plan.transform, &plan.diff);
        }
        if status.is_change() {
            stats.changed_structs += 1;
        }

        Ok(DeclarationOutcome {
            name: def.name.clone(),
            target_file: target_path,
            status,
            diffs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceDef;
    use crate::sync::types::TransformRules;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    const UPSTREAM: &str = r#"package object

import "github.com/casdoor/casdoor/pp"

// User has the account fields.
type User struct {
	*xormadapter.Adapter `xorm:"extends"`

	Owner       string          `xorm:"varchar(100) notnull pk" json:"owner"`
	Name        string          `xorm:"varchar(100) notnull pk" json:"name"`
	DisplayName string          `xorm:"varchar(100)" json:"displayName"`
	State       pp.PaymentState `xorm:"varchar(100)" json:"state"`
	Password    string          `xorm:"-" json:"-"`
}

type Userinfo struct {
	Sub  string `json:"sub"`
	Name string `json:"preferred_username,omitempty"`
}
"#;

    const TARGET: &str = r#"package casdoorsdk

// User has the account fields.
type User struct {
	Owner  string `json:"owner"`
	Name   string `json:"name"`
	Legacy string `json:"legacy"`
}

type Userinfo struct {
	Sub string `json:"sub"`
}

func (u User) GetId() string {
	return u.Owner + "/" + u.Name
}
"#;

    struct Fixture {
        _dir: TempDir,
        config: Config,
        sources: BTreeMap<String, PathBuf>,
        target_file: PathBuf,
    }

    fn fixture(include_types: Vec<String>) -> Fixture {
        let dir = TempDir::new().unwrap();
        let upstream_dir = dir.path().join("upstream");
        let target_dir = dir.path().join("sdk");
        fs::create_dir_all(&upstream_dir).unwrap();
        fs::create_dir_all(&target_dir).unwrap();
        fs::write(upstream_dir.join("user.go"), UPSTREAM).unwrap();
        fs::write(target_dir.join("user.go"), TARGET).unwrap();

        let mut config_sources = BTreeMap::new();
        config_sources.insert(
            "casdoor".to_string(),
            SourceDef {
                repo: "https://github.com/casdoor/casdoor.git".to_string(),
                path: None,
                git_ref: None,
            },
        );

        let config = Config {
            sources: config_sources,
            target: target_dir.clone(),
            structs: vec![StructDef {
                name: "User".to_string(),
                source: "casdoor".to_string(),
                file: "user.go".to_string(),
                source_file: None,
                include_types,
            }],
            transform: TransformRules::new()
                .remove_key("xorm")
                .exclude_embedded("*xormadapter.Adapter")
                .map_type("pp.PaymentState", "string"),
            ..Default::default()
        };

        let mut sources = BTreeMap::new();
        sources.insert("casdoor".to_string(), upstream_dir);

        Fixture {
            _dir: dir,
            config,
            sources,
            target_file: target_dir.join("user.go"),
        }
    }

    #[test]
    fn test_dry_run_does_not_write() {
        let fx = fixture(vec![]);
        let syncer = Syncer::new(&fx.config, fx.sources.clone()).with_options(RunOptions {
            dry_run: true,
            ..RunOptions::default()
        });
        let report = syncer.run();

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].status, DeclarationStatus::WouldUpdate);
        assert_eq!(fs::read_to_string(&fx.target_file).unwrap(), TARGET);

        let stats = report.stats;
        assert_eq!(stats.total_structs, 1);
        assert_eq!(stats.changed_structs, 1);
        assert_eq!(stats.new_fields, 2);
        assert_eq!(stats.removed_fields, 1);
        assert_eq!(stats.modified_tags, 4);
        assert_eq!(stats.excluded_fields, 2);
    }

    #[test]
    fn test_apply_writes_and_is_idempotent() {
        let fx = fixture(vec![]);
        let syncer = Syncer::new(&fx.config, fx.sources.clone());
        let report = syncer.run();
        assert_eq!(report.outcomes[0].status, DeclarationStatus::Updated);

        let expected = r#"package casdoorsdk

// User has the account fields.
type User struct {
	Owner       string `json:"owner"`
	Name        string `json:"name"`
	DisplayName string `json:"displayName"`
	State       string `json:"state"`
	// Deprecated: removed from server
	Legacy string `json:"legacy"`
}

type Userinfo struct {
	Sub string `json:"sub"`
}

func (u User) GetId() string {
	return u.Owner + "/" + u.Name
}
"#;
        assert_eq!(fs::read_to_string(&fx.target_file).unwrap(), expected);

        let second = syncer.run();
        assert_eq!(second.outcomes[0].status, DeclarationStatus::Unchanged);
        assert_eq!(fs::read_to_string(&fx.target_file).unwrap(), expected);
    }

    #[test]
    fn test_include_types_written_once() {
        let fx = fixture(vec!["Userinfo".to_string(), "Missing".to_string()]);
        let syncer = Syncer::new(&fx.config, fx.sources.clone());
        let report = syncer.run();

        let outcome = &report.outcomes[0];
        assert_eq!(outcome.status, DeclarationStatus::Updated);
        let names: Vec<&str> = outcome.diffs.iter().map(|d| d.declaration.as_str()).collect();
        assert_eq!(names, vec!["User", "Userinfo"]);

        let written = fs::read_to_string(&fx.target_file).unwrap();
        assert!(written.contains(concat!(
            "type Userinfo struct {\n",
            "\tSub  string `json:\"sub\"`\n",
            "\tName string `json:\"preferred_username,omitempty\"`\n",
            "}",
        )));
    }

    #[test]
    fn test_hard_delete_option() {
        let fx = fixture(vec![]);
        let syncer = Syncer::new(&fx.config, fx.sources.clone()).with_options(RunOptions {
            mark_deprecated: false,
            ..RunOptions::default()
        });
        syncer.run();
        let written = fs::read_to_string(&fx.target_file).unwrap();
        assert!(!written.contains("Legacy"));
    }

    #[test]
    fn test_failures_are_isolated() {
        let mut fx = fixture(vec![]);
        fx.config.structs.insert(
            0,
            StructDef {
                name: "Missing".to_string(),
                source: "casdoor".to_string(),
                file: "user.go".to_string(),
                source_file: None,
                include_types: vec![],
            },
        );
        let syncer = Syncer::new(&fx.config, fx.sources.clone()).with_options(RunOptions {
            dry_run: true,
            ..RunOptions::default()
        });
        let report = syncer.run();

        assert_eq!(report.outcomes.len(), 2);
        match &report.outcomes[0].status {
            DeclarationStatus::Failed { error } => {
                assert!(error.contains("struct Missing not found"));
            }
            other => panic!("Expected failure, got {other:?}"),
        }
        assert_eq!(report.outcomes[1].status, DeclarationStatus::WouldUpdate);
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.stats.total_structs, 1);
    }

    #[test]
    fn test_failed_write_records_no_stats() {
        let fx = fixture(vec![]);
        let mut permissions = fs::metadata(&fx.target_file).unwrap().permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&fx.target_file, permissions).unwrap();
        if fs::OpenOptions::new().write(true).open(&fx.target_file).is_ok() {
            // Permissions are not enforced for this user.
            return;
        }

        let report = Syncer::new(&fx.config, fx.sources.clone()).run();

        assert!(matches!(report.outcomes[0].status, DeclarationStatus::Failed { .. }));
        assert_eq!(report.stats, SummaryStats::default());
    }

    #[test]
    fn test_struct_filter() {
        let fx = fixture(vec![]);
        let syncer = Syncer::new(&fx.config, fx.sources.clone()).with_options(RunOptions {
            dry_run: true,
            struct_filter: Some("Other".to_string()),
            ..RunOptions::default()
        });
        assert!(syncer.run().outcomes.is_empty());
    }
}
