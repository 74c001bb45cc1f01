//! # Validate Subcommand
//!
//! Registers the schema fragments, builds the top-level schema and checks
//! one JSON input document against it. With no arguments this runs the
//! configured default: every listed fragment, `battery` as the top-level
//! schema, `Battery/lithiumbattery.json` as the instance.
//!
//! The result is always reported. An invalid instance only changes the
//! exit code when `--strict` is given.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use battmo_core::BattmoConfig;
use battmo_schema::{load_instance, SchemaError, SchemaSetBuilder};

/// Arguments for the `battmo validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// JSON input document to check. Defaults to `schemas.default_instance`.
    #[arg(value_name = "INSTANCE")]
    pub instance: Option<PathBuf>,

    /// Directory holding the `*.schema.json` files.
    #[arg(long)]
    pub schema_dir: Option<PathBuf>,

    /// Fragment to register (repeatable). Replaces the configured list.
    #[arg(long = "fragment", value_name = "NAME")]
    pub fragments: Vec<String>,

    /// Schema the instance is checked against.
    #[arg(long)]
    pub top_level: Option<String>,

    /// Exit with status 1 when the instance does not conform.
    #[arg(long)]
    pub strict: bool,
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 when the run completed (and, with `--strict`, the
/// instance is valid); 1 for an invalid instance under `--strict`.
pub fn run_validate(args: &ValidateArgs, config: &BattmoConfig, repo_root: &Path) -> Result<u8> {
    let schemas = &config.schemas;

    let schema_dir = resolve_dir(args.schema_dir.as_deref().unwrap_or(&schemas.schema_dir), repo_root);
    let fragments: Vec<&str> = if args.fragments.is_empty() {
        schemas.fragments.iter().map(String::as_str).collect()
    } else {
        args.fragments.iter().map(String::as_str).collect()
    };
    let top_level = args.top_level.as_deref().unwrap_or(&schemas.top_level);

    let mut builder = SchemaSetBuilder::new(&schema_dir, schemas.base_uri.clone());
    builder
        .register_all(&fragments)
        .with_context(|| format!("failed to register schemas from {}", schema_dir.display()))?;
    let set = builder
        .build(top_level)
        .with_context(|| format!("failed to build schema '{top_level}'"))?;

    println!(
        "Schemas: {} fragment(s) registered under {}",
        set.len(),
        set.base_uri()
    );

    let instance_path = crate::resolve_path(
        args.instance.as_deref().unwrap_or(&schemas.default_instance),
        repo_root,
    );
    let instance = load_instance(&instance_path)?;

    tracing::debug!(path = %instance_path.display(), "validating instance");

    match set.validate(&instance) {
        Ok(()) => {
            println!("{}: valid against '{top_level}'", instance_path.display());
            Ok(0)
        }
        Err(SchemaError::ValidationFailed { violations, .. }) => {
            println!(
                "{}: INVALID against '{top_level}' ({} violation(s))",
                instance_path.display(),
                violations.len()
            );
            println!("{violations}");
            Ok(if args.strict { 1 } else { 0 })
        }
        Err(other) => Err(other.into()),
    }
}

fn resolve_dir(dir: &Path, repo_root: &Path) -> PathBuf {
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        repo_root.join(dir)
    }
}
