//! # battmo CLI entry point
//!
//! Parses command-line arguments, loads the project configuration and
//! dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use battmo_cli::docs::{run_docs, DocsArgs};
use battmo_cli::validate::{run_validate, ValidateArgs};
use battmo_cli::{find_repo_root, load_config};

/// BattMo tooling: input validation and documentation source links.
#[derive(Parser, Debug)]
#[command(name = "battmo", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file (default: <root>/battmo.yaml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// BattMo checkout root (default: nearest ancestor with Utilities/ and Documentation/).
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a JSON input file against the schema registry.
    Validate(ValidateArgs),

    /// Source references and documentation build settings.
    Docs(DocsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let repo_root = cli.root.clone().unwrap_or_else(|| {
        find_repo_root(&cwd).unwrap_or_else(|| {
            tracing::warn!("Could not locate BattMo checkout; using current directory");
            cwd.clone()
        })
    });

    tracing::debug!(repo_root = %repo_root.display(), "resolved repository root");

    let config = match load_config(cli.config.as_deref(), &repo_root) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(1);
        }
    };

    let result = match &cli.command {
        Commands::Validate(args) => run_validate(args, &config, &repo_root),
        Commands::Docs(args) => run_docs(args, &config, &repo_root),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battmo_cli::docs::{ConfigFormat, DocsCommand, MarkupFormat};

    #[test]
    fn cli_parse_validate_defaults() {
        let cli = Cli::try_parse_from(["battmo", "validate"]).unwrap();
        let Commands::Validate(args) = cli.command else {
            panic!("expected validate");
        };
        assert!(args.instance.is_none());
        assert!(args.fragments.is_empty());
        assert!(args.top_level.is_none());
        assert!(!args.strict);
    }

    #[test]
    fn cli_parse_validate_with_options() {
        let cli = Cli::try_parse_from([
            "battmo",
            "validate",
            "Battery/lithiumbattery.json",
            "--schema-dir",
            "schemas",
            "--fragment",
            "electrode",
            "--fragment",
            "battery",
            "--top-level",
            "battery",
            "--strict",
        ])
        .unwrap();
        let Commands::Validate(args) = cli.command else {
            panic!("expected validate");
        };
        assert_eq!(args.instance, Some(PathBuf::from("Battery/lithiumbattery.json")));
        assert_eq!(args.schema_dir, Some(PathBuf::from("schemas")));
        assert_eq!(args.fragments, vec!["electrode", "battery"]);
        assert_eq!(args.top_level.as_deref(), Some("battery"));
        assert!(args.strict);
    }

    #[test]
    fn cli_parse_docs_locate() {
        let cli = Cli::try_parse_from(["battmo", "docs", "locate", "runBatteryP2D#42"]).unwrap();
        let Commands::Docs(args) = cli.command else {
            panic!("expected docs");
        };
        assert!(matches!(
            args.command,
            DocsCommand::Locate { ref references } if references == &["runBatteryP2D#42"]
        ));
    }

    #[test]
    fn cli_parse_docs_locate_requires_reference() {
        assert!(Cli::try_parse_from(["battmo", "docs", "locate"]).is_err());
    }

    #[test]
    fn cli_parse_docs_expand() {
        let cli = Cli::try_parse_from([
            "battmo", "docs", "expand", "index.rst", "--format", "markdown", "--out", "index.md",
        ])
        .unwrap();
        let Commands::Docs(args) = cli.command else {
            panic!("expected docs");
        };
        match args.command {
            DocsCommand::Expand { file, format, out } => {
                assert_eq!(file, PathBuf::from("index.rst"));
                assert_eq!(format, MarkupFormat::Markdown);
                assert_eq!(out, Some(PathBuf::from("index.md")));
            }
            other => panic!("expected expand, got {other:?}"),
        }
    }

    #[test]
    fn cli_parse_docs_config_default_format() {
        let cli = Cli::try_parse_from(["battmo", "docs", "config"]).unwrap();
        let Commands::Docs(args) = cli.command else {
            panic!("expected docs");
        };
        assert!(matches!(args.command, DocsCommand::Config { format: ConfigFormat::Yaml }));
    }

    #[test]
    fn cli_parse_global_options() {
        let cli = Cli::try_parse_from([
            "battmo", "-vv", "--config", "battmo.yaml", "--root", "/opt/battmo", "validate",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("battmo.yaml")));
        assert_eq!(cli.root, Some(PathBuf::from("/opt/battmo")));
    }

    #[test]
    fn cli_parse_no_subcommand_errors() {
        assert!(Cli::try_parse_from(["battmo"]).is_err());
    }

    #[test]
    fn cli_parse_invalid_format_errors() {
        assert!(Cli::try_parse_from(["battmo", "docs", "expand", "a.rst", "--format", "pdf"]).is_err());
    }
}
