//! Errors raised while resolving source references and expanding roles.

use std::path::PathBuf;

use thiserror::Error;

/// Error in the documentation helpers.
#[derive(Error, Debug)]
pub enum DocsError {
    /// No file of that name exists outside the ignored directories.
    #[error("file not found: '{filename}' (searched under {})", root.display())]
    FileNotFound {
        /// The file name that was searched for.
        filename: String,
        /// Root of the searched tree.
        root: PathBuf,
    },

    /// The reference text has nothing before the `#`.
    #[error("empty identifier in reference '{text}'")]
    EmptyIdentifier {
        /// Full reference text.
        text: String,
    },

    /// The part after `#` is not a line number.
    #[error("invalid line number '{line}' in reference '{text}'")]
    InvalidLineNumber {
        /// Full reference text.
        text: String,
        /// The offending line part.
        line: String,
    },

    /// The repository URL cannot be used as a link base.
    #[error("invalid repository url '{url}': {reason}")]
    InvalidRepoUrl {
        /// The configured URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// No role of that name is registered.
    #[error("unknown role '{name}'")]
    UnknownRole {
        /// Requested role name.
        name: String,
    },

    /// A role's content has no closing backquote.
    #[error("unterminated role ':{name}:' at line {line}")]
    UnterminatedRole {
        /// Role name.
        name: String,
        /// 1-based line of the opening markup.
        line: usize,
    },

    /// A role failed while expanding a document.
    #[error("role ':{name}:' failed at line {line}: {source}")]
    RoleFailed {
        /// Role name.
        name: String,
        /// 1-based line of the role occurrence.
        line: usize,
        /// Underlying failure.
        #[source]
        source: Box<DocsError>,
    },
}
