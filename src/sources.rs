//! Upstream source acquisition.
//!
//! Each configured source is either a local override or a shallow git clone
//! into a temporary directory that lives as long as the [`ResolvedSources`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tempfile::TempDir;
use tracing::{debug, info};

use crate::config::SourceDef;
use crate::error::{Error, Result};

/// Local directories for every configured source.
#[derive(Debug)]
pub struct ResolvedSources {
    paths: BTreeMap<String, PathBuf>,
    // Removed on drop.
    clone_dir: Option<TempDir>,
}

impl ResolvedSources {
    /// Directory holding the files of a source.
    pub fn get(&self, name: &str) -> Option<&Path> {
        self.paths.get(name).map(PathBuf::as_path)
    }

    /// All resolved paths by source name.
    pub fn paths(&self) -> &BTreeMap<String, PathBuf> {
        &self.paths
    }

    /// Temporary directory holding the clones, if anything was cloned.
    pub fn clone_dir(&self) -> Option<&Path> {
        self.clone_dir.as_ref().map(TempDir::path)
    }
}

/// Parse a `name:path` override. Relative paths are resolved against `base`.
pub fn parse_override(value: &str, base: &Path) -> Result<(String, PathBuf)> {
    let (name, path) = value.split_once(':').ok_or_else(|| {
        Error::Config(format!(
            "invalid --source-override format {value:?}, expected name:path"
        ))
    })?;
    if name.is_empty() || path.is_empty() {
        return Err(Error::Config(format!(
            "invalid --source-override format {value:?}, expected name:path"
        )));
    }

    let expanded = PathBuf::from(shellexpand::tilde(path).as_ref());
    let path = if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    };
    Ok((name.to_string(), path))
}

/// Resolve every source to a local directory, cloning the ones without an override.
pub fn resolve_sources(
    sources: &BTreeMap<String, SourceDef>,
    overrides: &BTreeMap<String, PathBuf>,
) -> Result<ResolvedSources> {
    let mut paths = BTreeMap::new();

    for (name, path) in overrides {
        if !sources.contains_key(name) {
            return Err(Error::Config(format!(
                "source override {name:?} not found in sources config"
            )));
        }
        debug!(source = %name, path = %path.display(), "using local override");
        paths.insert(name.clone(), path.clone());
    }

    let to_clone: Vec<(&String, &SourceDef)> = sources
        .iter()
        .filter(|(name, _)| !overrides.contains_key(*name))
        .collect();

    if to_clone.is_empty() {
        return Ok(ResolvedSources {
            paths,
            clone_dir: None,
        });
    }

    let git = find_git()?;
    let clone_dir = tempfile::Builder::new()
        .prefix("structsync-")
        .tempdir()
        .map_err(|e| Error::Internal(format!("creating temp dir: {e}")))?;

    for (name, source) in to_clone {
        let dest = clone_dir.path().join(name);
        shallow_clone(&git, name, source, &dest)?;

        let local = match source.path.as_deref() {
            Some(sub) if !sub.is_empty() => dest.join(sub),
            _ => dest,
        };
        paths.insert(name.clone(), local);
    }

    Ok(ResolvedSources {
        paths,
        clone_dir: Some(clone_dir),
    })
}

fn find_git() -> Result<PathBuf> {
    which::which("git").map_err(|e| Error::git("git", format!("git binary not found: {e}")))
}

fn shallow_clone(git: &Path, name: &str, source: &SourceDef, dest: &Path) -> Result<()> {
    let mut cmd = Command::new(git);
    cmd.args(["clone", "--depth", "1"]);
    if let Some(git_ref) = source.git_ref.as_deref().filter(|r| !r.is_empty()) {
        cmd.args(["--branch", git_ref]);
    }
    cmd.arg(&source.repo).arg(dest);

    info!("Cloning {} from {}...", name, source.repo);
    let output = cmd
        .stdin(Stdio::null())
        .output()
        .map_err(|e| Error::git(name, format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::git(
            name,
            format!("git clone exited with {}: {}", output.status, stderr.trim()),
        ));
    }
    Ok(())
}
