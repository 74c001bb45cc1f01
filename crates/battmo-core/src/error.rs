//! # Error Types
//!
//! Errors raised while loading and checking the project configuration.
//! Component crates (`battmo-docs`, `battmo-schema`) define their own
//! `thiserror` enums for their domain failures.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for configuration operations.
pub type BattmoResult<T> = Result<T, BattmoError>;

/// Top-level error type for the BattMo tooling.
#[derive(Error, Debug)]
pub enum BattmoError {
    /// The configuration file could not be read.
    #[error("cannot read config file '{}': {source}", path.display())]
    ConfigRead {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML or does not match the
    /// expected structure.
    #[error("invalid config file '{}': {reason}", path.display())]
    ConfigParse {
        /// Path of the configuration file.
        path: PathBuf,
        /// Parser diagnostic.
        reason: String,
    },

    /// The configuration parsed but failed its consistency checks.
    #[error("invalid configuration:\n  {}", problems.join("\n  "))]
    InvalidConfig {
        /// One entry per detected problem.
        problems: Vec<String>,
    },

    /// Serialization of the configuration failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}
