//! YAML configuration.
//!
//! ```yaml
//! sources:
//!   casdoor:
//!     repo: https://github.com/casdoor/casdoor.git
//!     path: object
//! target: ../object
//! structs:
//!   - name: User
//!     source: casdoor
//!     file: user.go
//! transform:
//!   remove_tags: [xorm]
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::sync::types::TransformRules;

/// Default config file name.
pub const DEFAULT_CONFIG_FILE: &str = "structsync.yaml";

/// A git repository holding upstream sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDef {
    pub repo: String,
    /// Sub-directory inside the clone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Branch or tag for the shallow clone.
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
}

/// One declaration to keep in sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDef {
    pub name: String,
    /// Key into `sources`.
    #[serde(default)]
    pub source: String,
    /// Target file, relative to the target directory.
    pub file: String,
    /// Source file, when it differs from `file`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    /// Extra declarations synced from the same source file.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_types: Vec<String>,
}

impl StructDef {
    /// Source file name relative to the source directory.
    pub fn source_file(&self) -> &str {
        self.source_file
            .as_deref()
            .filter(|f| !f.is_empty())
            .unwrap_or(&self.file)
    }
}

/// Handling of fields removed upstream.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeprecationConfig {
    /// Default for deprecate-vs-delete; `None` means deprecate.
    #[serde(default)]
    pub mark_removed: Option<bool>,
    /// Message after `Deprecated:`.
    #[serde(default)]
    pub message: Option<String>,
    /// Reserved.
    #[serde(default)]
    pub include_commit: bool,
    /// Reserved.
    #[serde(default)]
    pub auto_prune_after: u32,
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sources: BTreeMap<String, SourceDef>,
    /// Downstream directory; relative paths are resolved against the config file.
    #[serde(default)]
    pub target: PathBuf,
    #[serde(default)]
    pub structs: Vec<StructDef>,
    #[serde(default)]
    pub transform: TransformRules,
    #[serde(default)]
    pub deprecation: DeprecationConfig,
}

impl Config {
    /// Parse configuration from YAML text. Paths are left as written.
    pub fn from_yaml(contents: &str) -> std::result::Result<Self, serde_saphyr::Error> {
        serde_saphyr::from_str(contents)
    }

    /// Load a config file and resolve `target` against its directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| Error::source_read(path, e))?;
        let mut config = Self::from_yaml(&contents).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if !config.target.as_os_str().is_empty() && config.target.is_relative() {
            config.target = config_dir(path).join(&config.target);
        }

        debug!(
            path = %path.display(),
            sources = config.sources.len(),
            structs = config.structs.len(),
            "loaded config"
        );
        Ok(config)
    }

    /// Check the configuration for missing or dangling references.
    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(Error::Config("no sources defined".to_string()));
        }
        if self.target.as_os_str().is_empty() {
            return Err(Error::Config("target directory not specified".to_string()));
        }
        if self.structs.is_empty() {
            return Err(Error::Config("no structs defined".to_string()));
        }

        for s in &self.structs {
            if s.source.is_empty() {
                return Err(Error::Config(format!("struct {}: source not specified", s.name)));
            }
            if !self.sources.contains_key(&s.source) {
                return Err(Error::Config(format!(
                    "struct {}: source {:?} not found in sources",
                    s.name, s.source
                )));
            }
        }

        if !self.target.exists() {
            return Err(Error::Config(format!(
                "target directory does not exist: {}",
                self.target.display()
            )));
        }

        Ok(())
    }

    /// Deprecate-vs-delete default.
    pub fn mark_removed(&self) -> bool {
        self.deprecation.mark_removed.unwrap_or(true)
    }

    /// Configured deprecation message, or empty for the default.
    pub fn deprecation_message(&self) -> &str {
        self.deprecation.message.as_deref().unwrap_or_default()
    }

    /// Full path of a struct's target file.
    pub fn target_file(&self, def: &StructDef) -> PathBuf {
        self.target.join(&def.file)
    }
}

/// Directory holding a config file; `.` for a bare file name.
pub fn config_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
sources:
  casdoor:
    repo: https://github.com/casdoor/casdoor.git
    path: object
    ref: master
target: sdk
structs:
  - name: User
    source: casdoor
    file: user.go
    include_types: [Userinfo]
  - name: Application
    source: casdoor
    file: application.go
    source_file: app.go
transform:
  remove_tags: [xorm]
  exclude_embedded: ["*xormadapter.Adapter"]
  type_mappings:
    pp.PaymentState: string
deprecation:
  mark_removed: false
  message: gone upstream
"#;

    fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("structsync.yaml");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_parse_config() {
        let config = Config::from_yaml(CONFIG).unwrap();
        let source = &config.sources["casdoor"];
        assert_eq!(source.path.as_deref(), Some("object"));
        assert_eq!(source.git_ref.as_deref(), Some("master"));

        assert_eq!(config.structs.len(), 2);
        assert_eq!(config.structs[0].include_types, vec!["Userinfo"]);
        assert_eq!(config.structs[0].source_file(), "user.go");
        assert_eq!(config.structs[1].source_file(), "app.go");

        assert_eq!(config.transform.remove_annotation_keys, vec!["xorm"]);
        assert_eq!(config.transform.exclude_embedded_types, vec!["*xormadapter.Adapter"]);
        assert_eq!(config.transform.type_mappings["pp.PaymentState"], "string");
        assert_eq!(config.transform.skip_directive_keys, vec!["xorm", "json"]);

        assert!(!config.mark_removed());
        assert_eq!(config.deprecation_message(), "gone upstream");
    }

    #[test]
    fn test_load_resolves_target() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sdk")).unwrap();
        let path = write_config(&dir, CONFIG);

        let config = Config::load(&path).unwrap();
        assert_eq!(config.target, dir.path().join("sdk"));
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_errors() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, CONFIG);
        let config = Config::load(&path).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("target directory does not exist"));

        let mut config = Config::from_yaml(CONFIG).unwrap();
        config.target = dir.path().to_path_buf();
        config.structs[0].source = "missing".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("source \"missing\" not found"));

        config.structs[0].source = String::new();
        assert!(config.validate().unwrap_err().to_string().contains("source not specified"));

        let empty = Config::default();
        assert!(empty.validate().unwrap_err().to_string().contains("no sources defined"));
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_yaml("target: x\n").unwrap();
        assert!(config.mark_removed());
        assert_eq!(config.deprecation_message(), "");
        assert!(config.transform.remove_annotation_keys.is_empty());
    }

    #[test]
    fn test_malformed_config() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "structs: [\n");
        assert!(matches!(Config::load(&path), Err(Error::ConfigParse { .. })));
    }

    #[test]
    fn test_config_dir() {
        assert_eq!(config_dir(Path::new("structsync.yaml")), PathBuf::from("."));
        assert_eq!(config_dir(Path::new("conf/structsync.yaml")), PathBuf::from("conf"));
    }
}
