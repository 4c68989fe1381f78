//! structsync: keep downstream Go struct definitions in sync with upstream sources.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use structsync::config::{config_dir, Config, DEFAULT_CONFIG_FILE};
use structsync::sync::{format_color_diff, format_diff, format_outcome, format_summary};
use structsync::{parse_override, resolve_sources, Result, RunOptions, Syncer};

#[derive(Parser, Debug)]
#[command(
    name = "structsync",
    version,
    about = "Sync Go struct definitions from upstream sources into a downstream package"
)]
struct Cli {
    /// Path to config file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Preview changes without applying them
    #[arg(long)]
    dry_run: bool,

    /// Show a unified diff of changes (implies --dry-run unless --apply is given)
    #[arg(long)]
    diff: bool,

    /// Write changes even when --diff is given
    #[arg(long)]
    apply: bool,

    /// Only sync this struct
    #[arg(long = "struct", value_name = "NAME")]
    struct_name: Option<String>,

    /// Mark removed fields as deprecated instead of deleting them
    /// [default: deprecation.mark_removed from the config, else true]
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    mark_deprecated: Option<bool>,

    /// Remove previously deprecated fields (reserved)
    #[arg(long)]
    prune_deprecated: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Verbose output
    #[arg(long, short)]
    verbose: bool,

    /// Use a local directory for a source instead of cloning it (name:path, repeatable)
    #[arg(long = "source-override", value_name = "NAME:PATH")]
    source_overrides: Vec<String>,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = Config::load(&cli.config).inspect_err(|e| error!("Error loading config: {e}"))?;
    config
        .validate()
        .inspect_err(|e| error!("Invalid config: {e}"))?;

    let base = config_dir(&cli.config);
    let mut overrides = BTreeMap::new();
    for value in &cli.source_overrides {
        let (name, path) = parse_override(value, &base)?;
        overrides.insert(name, path);
    }

    let sources = resolve_sources(&config.sources, &overrides)
        .inspect_err(|e| error!("Error cloning sources: {e}"))?;

    let dry_run = cli.dry_run || (cli.diff && !cli.apply);
    let options = RunOptions {
        dry_run,
        struct_filter: cli.struct_name.clone(),
        mark_deprecated: cli.mark_deprecated.unwrap_or_else(|| config.mark_removed()),
        prune_deprecated: cli.prune_deprecated,
    };

    let report = Syncer::new(&config, sources.paths().clone())
        .with_options(options)
        .run();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for outcome in &report.outcomes {
        if cli.diff {
            for diff in &outcome.diffs {
                if cli.no_color {
                    print!("{}", format_diff(diff, &outcome.target_file));
                } else {
                    print!("{}", format_color_diff(diff, &outcome.target_file));
                }
            }
        }
        if let Some(message) = format_outcome(outcome, cli.verbose) {
            println!("{message}");
        }
    }

    if dry_run || cli.diff {
        print!("{}", format_summary(&report.stats));
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "structsync",
            "--diff",
            "--struct",
            "User",
            "--mark-deprecated=false",
            "--source-override",
            "casdoor:../casdoor/object",
            "--source-override",
            "other:/tmp/other",
        ])
        .unwrap();
        assert!(cli.diff);
        assert!(!cli.apply);
        assert_eq!(cli.config, PathBuf::from("structsync.yaml"));
        assert_eq!(cli.struct_name.as_deref(), Some("User"));
        assert_eq!(cli.mark_deprecated, Some(false));
        assert_eq!(cli.source_overrides.len(), 2);

        let cli = Cli::try_parse_from(["structsync", "--mark-deprecated"]).unwrap();
        assert_eq!(cli.mark_deprecated, Some(true));

        let cli = Cli::try_parse_from(["structsync"]).unwrap();
        assert_eq!(cli.mark_deprecated, None);
    }
}
