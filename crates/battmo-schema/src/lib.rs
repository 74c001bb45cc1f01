//! # battmo-schema — Schema Registry & Validation
//!
//! BattMo describes its JSON input files with a set of Draft 7 schema
//! fragments (`battery`, `electrode`, `activematerial`, ...) that refer
//! to each other through synthetic URIs:
//!
//! ```json
//! { "$ref": "file://batmo/schemas/electrode" }
//! ```
//!
//! ## Registry (`registry`)
//!
//! [`SchemaSetBuilder`] reads each named fragment from the schema
//! directory and registers it under `<base_uri><name>`. Only
//! [`SchemaSetBuilder::build`] produces a [`SchemaSet`], after every
//! cross-reference has been checked against the registered names, so a
//! half-populated registry can never be queried.
//!
//! ## Validation (`validate`)
//!
//! [`SchemaSet::is_valid`] and [`SchemaSet::validate`] check an instance
//! against the top-level schema, following `$ref`s through the registered
//! fragments only. Failures are reported as structured [`Violation`]s.
//!
//! ## Crate Policy
//!
//! - Depends only on `battmo-core` internally.
//! - No network or filesystem access once the set is built.

pub mod registry;
pub mod validate;

pub use registry::{SchemaSet, SchemaSetBuilder, SCHEMA_FILE_SUFFIX};
pub use validate::{load_instance, SchemaError, ValidationViolations, Violation};
