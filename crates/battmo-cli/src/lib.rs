//! # battmo-cli — Command-Line Interface for the BattMo Tooling
//!
//! ## Subcommands
//!
//! - `battmo validate` — validate a JSON input file against the schema registry.
//! - `battmo docs locate` — resolve `:battmo:` references to files and links.
//! - `battmo docs expand` — expand documentation roles in a page.
//! - `battmo docs config` — print the documentation build configuration.
//!
//! ```bash
//! battmo validate
//! battmo validate Examples/JsonInputs/Battery/lithiumbattery.json --strict
//! battmo docs locate runBatteryP2D#42
//! ```
//!
//! Handlers delegate to `battmo-docs` and `battmo-schema`; this crate
//! only parses arguments, loads configuration and prints results.

pub mod docs;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use battmo_core::BattmoConfig;

/// Resolve a path that may be relative to the repository root.
///
/// If the path is absolute, returns it as-is. If relative and the file
/// exists relative to `repo_root`, uses that. Otherwise returns the path
/// relative to the current directory.
pub fn resolve_path(path: &Path, repo_root: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let repo_relative = repo_root.join(path);
    if repo_relative.exists() {
        repo_relative
    } else {
        path.to_path_buf()
    }
}

/// Walk up from `start` to the BattMo checkout root, identified by the
/// presence of both `Utilities/` and `Documentation/`.
pub fn find_repo_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join("Utilities").is_dir() && dir.join("Documentation").is_dir())
        .map(Path::to_path_buf)
}

/// Load the configuration from `explicit` if given, otherwise from
/// `<repo_root>/battmo.yaml` or the defaults, and check it.
pub fn load_config(explicit: Option<&Path>, repo_root: &Path) -> Result<BattmoConfig> {
    let config = match explicit {
        Some(path) => BattmoConfig::load(&resolve_path(path, repo_root))?,
        None => BattmoConfig::load_from_root(repo_root)?,
    };
    config.ensure_valid().context("configuration rejected")?;
    Ok(config)
}
