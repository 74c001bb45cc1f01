//! # Validation Errors and Instance Loading
//!
//! The error taxonomy of the registry and the structured violation list
//! returned when an instance does not conform.
//!
//! - file not found: [`SchemaError::SchemaNotFound`]
//! - parse faults: [`SchemaError::SchemaParse`], [`SchemaError::DocumentLoad`]
//! - resolution faults: [`SchemaError::UnresolvedReference`]

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

/// Error while assembling a schema set or validating against it.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The schema file does not exist.
    #[error("schema '{name}' not found at {}", path.display())]
    SchemaNotFound {
        /// Schema name (without suffix).
        name: String,
        /// Path that was tried.
        path: PathBuf,
    },

    /// The schema file exists but could not be read.
    #[error("cannot read schema '{name}' at {}: {source}", path.display())]
    SchemaRead {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The schema file is not valid JSON.
    #[error("schema '{name}' at {} is not valid JSON: {reason}", path.display())]
    SchemaParse {
        name: String,
        path: PathBuf,
        reason: String,
    },

    /// The same fragment name was registered twice.
    #[error("schema fragment '{name}' is already registered")]
    DuplicateFragment {
        name: String,
    },

    /// The base URI cannot be used to resolve references.
    #[error("invalid schema base uri '{uri}': {reason}")]
    InvalidBaseUri {
        uri: String,
        reason: String,
    },

    /// A `$ref` points at a document that is not registered.
    #[error("unresolved reference '{reference}' in schema '{referrer}'")]
    UnresolvedReference {
        /// The `$ref` value as written.
        reference: String,
        /// Name of the schema containing it.
        referrer: String,
    },

    /// The compiled validator could not be built (e.g., invalid schema).
    #[error("validator build error for schema '{schema_name}': {reason}")]
    ValidatorBuild {
        schema_name: String,
        reason: String,
    },

    /// The instance document could not be loaded or parsed.
    #[error("document load error for '{}': {reason}", path.display())]
    DocumentLoad {
        path: PathBuf,
        reason: String,
    },

    /// The document did not conform to the schema.
    #[error("validation failed against schema '{schema_name}':\n{violations}")]
    ValidationFailed {
        schema_name: String,
        violations: ValidationViolations,
    },
}

/// A single validation violation with structured context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer path to the violating field in the instance.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Collection of validation violations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    pub(crate) fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Read and parse one JSON instance document.
pub fn load_instance(path: &Path) -> Result<Value, SchemaError> {
    let content = std::fs::read_to_string(path).map_err(|e| SchemaError::DocumentLoad {
        path: path.to_path_buf(),
        reason: format!("cannot read file: {e}"),
    })?;
    serde_json::from_str(&content).map_err(|e| SchemaError::DocumentLoad {
        path: path.to_path_buf(),
        reason: format!("invalid JSON: {e}"),
    })
}
