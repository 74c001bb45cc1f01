//! # battmo-core — Foundational Types for the BattMo Tooling
//!
//! Every other crate in the workspace depends on `battmo-core`; it depends
//! on nothing internal.
//!
//! ## Contents
//!
//! - [`config`] — the project configuration loaded from `battmo.yaml`:
//!   source-link settings, the schema registry layout, and the
//!   documentation build options.
//! - [`error`] — the shared error type for configuration loading.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `battmo-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod config;
pub mod error;

// Re-export primary types for ergonomic imports.
pub use config::{
    BattmoConfig, DocsConfig, LatexDocument, SchemaConfig, SourceConfig, ThemeOptions,
    CONFIG_FILE_NAME,
};
pub use error::{BattmoError, BattmoResult};
