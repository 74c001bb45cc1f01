//! # Repository Links
//!
//! [`SourceReference`] is the parsed form of a role text such as
//! `runBatteryP2D#42`; [`SourceLinkBuilder`] turns a located file into a
//! link on the repository browser:
//!
//! ```text
//! <repo-url>/blob/<branch>/<relative-path>[#L<line>]
//! ```

use std::fmt;
use std::path::{Component, Path};
use std::str::FromStr;

use url::Url;

use crate::error::DocsError;

/// An identifier with an optional line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReference {
    /// File stem of the referenced source (e.g., `runBatteryP2D`).
    pub identifier: String,
    /// 1-based line, if one was given after `#`.
    pub line: Option<u32>,
}

impl FromStr for SourceReference {
    type Err = DocsError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (identifier, line) = match text.split_once('#') {
            Some((identifier, line)) => (identifier, Some(line)),
            None => (text, None),
        };

        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(DocsError::EmptyIdentifier {
                text: text.to_string(),
            });
        }

        let line = line
            .map(|raw| match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(DocsError::InvalidLineNumber {
                    text: text.to_string(),
                    line: raw.to_string(),
                }),
            })
            .transpose()?;

        Ok(Self {
            identifier: identifier.to_string(),
            line,
        })
    }
}

impl fmt::Display for SourceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}#{line}", self.identifier),
            None => f.write_str(&self.identifier),
        }
    }
}

/// Builds links to files on a branch of the repository browser.
#[derive(Debug, Clone)]
pub struct SourceLinkBuilder {
    repo_url: Url,
    branch: String,
}

impl SourceLinkBuilder {
    /// # Errors
    ///
    /// `DocsError::InvalidRepoUrl` if `repo_url` is not an absolute URL
    /// that can carry a path.
    pub fn new(repo_url: &str, branch: impl Into<String>) -> Result<Self, DocsError> {
        let parsed = Url::parse(repo_url).map_err(|e| DocsError::InvalidRepoUrl {
            url: repo_url.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(DocsError::InvalidRepoUrl {
                url: repo_url.to_string(),
                reason: "url cannot carry a path".to_string(),
            });
        }
        Ok(Self {
            repo_url: parsed,
            branch: branch.into(),
        })
    }

    pub fn repo_url(&self) -> &Url {
        &self.repo_url
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Link to `relative_path` on the configured branch, optionally to one line.
    ///
    /// Path components become URL segments, so the link uses `/` on
    /// every platform and special characters are percent-encoded.
    pub fn link(&self, relative_path: &Path, line: Option<u32>) -> Url {
        let mut url = self.repo_url.clone();
        // `cannot_be_a_base` was ruled out in `new`.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("blob");
            segments.extend(self.branch.split('/'));
            for component in relative_path.components() {
                if let Component::Normal(part) = component {
                    segments.push(&part.to_string_lossy());
                }
            }
        }
        let fragment = line.map(|n| format!("L{n}"));
        url.set_fragment(fragment.as_deref());
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn builder() -> SourceLinkBuilder {
        SourceLinkBuilder::new("https://github.com/BattMoTeam/BattMo-dev", "modelrefac").unwrap()
    }

    #[test]
    fn parse_plain_identifier() {
        let r: SourceReference = "runBatteryP2D".parse().unwrap();
        assert_eq!(r.identifier, "runBatteryP2D");
        assert_eq!(r.line, None);
    }

    #[test]
    fn parse_identifier_with_line() {
        let r: SourceReference = "runBatteryP2D#42".parse().unwrap();
        assert_eq!(r.identifier, "runBatteryP2D");
        assert_eq!(r.line, Some(42));
        assert_eq!(r.to_string(), "runBatteryP2D#42");
    }

    #[test]
    fn parse_rejects_bad_lines() {
        for text in ["f#", "f#abc", "f#0", "f#-3", "f#1#2"] {
            let err = text.parse::<SourceReference>().unwrap_err();
            assert!(
                matches!(err, DocsError::InvalidLineNumber { .. }),
                "{text}: got {err}"
            );
        }
    }

    #[test]
    fn parse_rejects_empty_identifier() {
        let err = "#12".parse::<SourceReference>().unwrap_err();
        assert!(matches!(err, DocsError::EmptyIdentifier { .. }));
    }

    #[test]
    fn link_without_line_has_no_fragment() {
        let url = builder().link(Path::new("Examples/runBatteryP2D.m"), None);
        assert_eq!(
            url.as_str(),
            "https://github.com/BattMoTeam/BattMo-dev/blob/modelrefac/Examples/runBatteryP2D.m"
        );
        assert!(url.fragment().is_none());
    }

    #[test]
    fn link_with_line_points_at_line() {
        let url = builder().link(Path::new("Examples/runBatteryP2D.m"), Some(42));
        assert!(url.as_str().ends_with("/Examples/runBatteryP2D.m#L42"));
    }

    #[test]
    fn trailing_slash_in_repo_url_is_ignored() {
        let b = SourceLinkBuilder::new("https://github.com/BattMoTeam/BattMo-dev/", "dev").unwrap();
        let url = b.link(Path::new("a.m"), None);
        assert_eq!(url.as_str(), "https://github.com/BattMoTeam/BattMo-dev/blob/dev/a.m");
    }

    #[test]
    fn branch_with_slash_keeps_separators() {
        let b = SourceLinkBuilder::new("https://github.com/o/r", "feature/json").unwrap();
        let url = b.link(Path::new("x/y.m"), None);
        assert_eq!(url.as_str(), "https://github.com/o/r/blob/feature/json/x/y.m");
    }

    #[test]
    fn special_characters_are_encoded() {
        let url = builder().link(Path::new("My Dir/a#b.m"), None);
        assert!(url.as_str().ends_with("/My%20Dir/a%23b.m"), "{url}");
        assert!(url.fragment().is_none());
    }

    #[test]
    fn relative_repo_url_is_rejected() {
        let err = SourceLinkBuilder::new("github.com/o/r", "main").unwrap_err();
        assert!(matches!(err, DocsError::InvalidRepoUrl { .. }));
    }

    proptest! {
        #[test]
        fn line_fragment_matches_reference(line in 1u32..1_000_000) {
            let reference: SourceReference = format!("model#{line}").parse().unwrap();
            let url = builder().link(Path::new("model.m"), reference.line);
            let expected = format!("#L{line}");
            prop_assert!(url.as_str().ends_with(&expected));
        }

        #[test]
        fn no_hash_means_no_fragment(name in "[A-Za-z][A-Za-z0-9_]{0,20}") {
            let reference: SourceReference = name.parse().unwrap();
            let url = builder().link(Path::new(&format!("{name}.m")), reference.line);
            prop_assert!(url.fragment().is_none());
            let suffix = format!("/{name}.m");
            prop_assert!(url.as_str().ends_with(&suffix));
        }
    }
}
